use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use http_server::{ServiceContext, ServiceDescriptor};
use serde::Serialize;
use serve_metrics::{MetricsSchema, Series};

pub const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    name: "web-app",
    version: env!("CARGO_PKG_VERSION"),
    default_port: 3000,
    metrics: MetricsSchema {
        requests: Series {
            name: "http_requests_total",
            help: "Total number of HTTP requests",
        },
        uptime: Series {
            name: "app_uptime_seconds",
            help: "Application uptime in seconds",
        },
        placeholder_ceiling: 1000,
    },
};

pub const WELCOME_MESSAGE: &str = "Hello from Kubernetes DevOps Pipeline Demo!";

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
    pub version: String,
    pub environment: String,
}

async fn index(State(ctx): State<ServiceContext>) -> Json<Welcome> {
    Json(Welcome {
        message: WELCOME_MESSAGE,
        version: ctx.identity.version.clone(),
        environment: ctx.identity.environment.clone(),
    })
}

pub fn app() -> Router<ServiceContext> {
    Router::new().route("/", get(index))
}
