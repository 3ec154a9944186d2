use axum::extract::State;
use axum::Json;
use http_server::ServiceContext;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub service: String,
    pub version: String,
    pub status: &'static str,
    pub environment: String,
}

pub async fn status(State(ctx): State<ServiceContext>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        service: ctx.identity.name.clone(),
        version: ctx.identity.version.clone(),
        status: "running",
        environment: ctx.identity.environment.clone(),
    })
}
