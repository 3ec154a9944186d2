//! Shared HTTP plumbing for the demo services: the per-process context, the
//! operational routes every service exposes, and the `run` entrypoint used by
//! the binaries.

mod context;
mod deserializers;
mod error;
mod routes;
mod server;

pub use context::{ServiceContext, ServiceDescriptor};
pub use deserializers::empty_string_as_none;
pub use error::{parse_json_body, ApiError};
pub use routes::{router, BODY_LIMIT};
pub use server::run;
