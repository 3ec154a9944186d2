mod data;
mod status;
mod users;

pub use data::{list_data, DataItem, DataList};
pub use status::{status, ServiceStatus};
pub use users::{create_user, list_users, CreatedUser, NewUser, User, UserList};
