use axum::routing::get;
use axum::Router;
use http_server::{ServiceContext, ServiceDescriptor};
use serve_metrics::{MetricsSchema, Series};

pub mod handlers;

pub const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
    name: "api-service",
    version: env!("CARGO_PKG_VERSION"),
    default_port: 8080,
    metrics: MetricsSchema {
        requests: Series {
            name: "api_requests_total",
            help: "Total number of API requests",
        },
        uptime: Series {
            name: "api_uptime_seconds",
            help: "API service uptime in seconds",
        },
        placeholder_ceiling: 500,
    },
};

/// The API routes, mounted next to the operational ones by [`http_server::router`].
pub fn app() -> Router<ServiceContext> {
    Router::new()
        .route("/api/v1/status", get(handlers::status))
        .route(
            "/api/v1/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/v1/data", get(handlers::list_data))
}
