use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use http_server::{empty_string_as_none, parse_json_body, ApiError, ServiceContext};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MISSING_FIELDS: &str = "Name and email are required";

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: u32,
    pub name: &'static str,
    pub email: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: usize,
}

/// Body of `POST /api/v1/users`. Blank strings count as missing.
#[derive(Debug, Default, Deserialize)]
pub struct NewUser {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

const SAMPLE_USERS: [User; 2] = [
    User {
        id: 1,
        name: "John Doe",
        email: "john@example.com",
    },
    User {
        id: 2,
        name: "Jane Smith",
        email: "jane@example.com",
    },
];

pub async fn list_users() -> Json<UserList> {
    let users = SAMPLE_USERS.to_vec();
    Json(UserList {
        total: users.len(),
        users,
    })
}

/// Validate and echo a new user. Nothing is stored: every call is independent.
pub async fn create_user(
    State(ctx): State<ServiceContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedUser>), ApiError> {
    let payload: NewUser = parse_json_body(&body, MISSING_FIELDS)?;

    let (Some(name), Some(email)) = (payload.name, payload.email) else {
        return Err(ApiError::Validation(MISSING_FIELDS.to_owned()));
    };

    let user = CreatedUser {
        id: rand::thread_rng().gen_range(0..1000),
        name,
        email,
        created_at: ctx.timesource.current_time(),
    };
    debug!(id = user.id, "created user");

    Ok((StatusCode::CREATED, Json(user)))
}
