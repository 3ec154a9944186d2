use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::Router;
use health::{LivenessStatus, ReadinessStatus};
use serve_metrics::{render, track_metrics, Exposition};
use tower_http::trace::TraceLayer;

use crate::ServiceContext;

pub const BODY_LIMIT: usize = 100 * 1024;

async fn liveness(State(ctx): State<ServiceContext>) -> LivenessStatus {
    LivenessStatus::check(&ctx.identity, &ctx.clock, ctx.timesource.as_ref())
}

async fn readiness(State(ctx): State<ServiceContext>) -> ReadinessStatus {
    ReadinessStatus::check(
        &ctx.identity,
        ctx.timesource.as_ref(),
        ctx.lifecycle.is_draining(),
    )
}

async fn metrics(State(ctx): State<ServiceContext>) -> Exposition {
    let recorded = ctx.prometheus.as_ref().map(|handle| handle.render());
    Exposition(render(
        &ctx.metrics,
        &ctx.counter,
        ctx.counter_mode,
        &ctx.clock,
        recorded.as_deref(),
    ))
}

/// Mount the operational endpoints next to the service's own routes and wrap
/// everything in tracing, body limit and request counting.
pub fn router(context: ServiceContext, app: Router<ServiceContext>) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .merge(app)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(axum::middleware::from_fn_with_state(
            context.counter.clone(),
            track_metrics,
        ))
        .with_state(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceDescriptor;
    use assert_json_diff::assert_json_eq;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use common_config::Config;
    use envconfig::Envconfig;
    use health::FixedTime;
    use http_body_util::BodyExt;
    use lifecycle::Lifecycle;
    use serde_json::{json, Value};
    use serve_metrics::{MetricsSchema, Series};
    use std::collections::HashMap;
    use tower::ServiceExt;

    const DESCRIPTOR: ServiceDescriptor = ServiceDescriptor {
        name: "test-service",
        version: "9.9.9",
        default_port: 8080,
        metrics: MetricsSchema {
            requests: Series {
                name: "test_requests_total",
                help: "Total number of test requests",
            },
            uptime: Series {
                name: "test_uptime_seconds",
                help: "Test uptime in seconds",
            },
            placeholder_ceiling: 10,
        },
    };

    fn context(env: &[(&str, &str)]) -> ServiceContext {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::init_from_hashmap(&env).unwrap();
        ServiceContext::new(&DESCRIPTOR, &config, Lifecycle::new(DESCRIPTOR.name)).with_time_source(
            FixedTime {
                time: "2025-07-01T11:00:00.000Z".to_string(),
            },
        )
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_reports_healthy_with_growing_uptime() {
        let ctx = context(&[]);
        let app = router(ctx.clone(), Router::new());

        let (status, _, first) = get_path(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let first: Value = serde_json::from_str(&first).unwrap();
        assert_eq!(first["status"], "healthy");
        assert_eq!(first["service"], "test-service");
        assert_eq!(first["timestamp"], "2025-07-01T11:00:00.000Z");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (_, _, second) = get_path(app, "/health").await;
        let second: Value = serde_json::from_str(&second).unwrap();
        assert!(second["uptime"].as_f64().unwrap() >= first["uptime"].as_f64().unwrap());
        assert!(first["uptime"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn ready_until_draining() {
        let ctx = context(&[]);
        let app = router(ctx.clone(), Router::new());

        let (status, _, body) = get_path(app.clone(), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_json_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({
                "status": "ready",
                "service": "test-service",
                "timestamp": "2025-07-01T11:00:00.000Z"
            })
        );

        ctx.lifecycle.begin_drain("test");
        let (status, _, body) = get_path(app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["status"], "draining");
    }

    #[tokio::test]
    async fn metrics_counts_served_requests() {
        let ctx = context(&[]);
        let app = router(ctx, Router::new());

        get_path(app.clone(), "/health").await;
        get_path(app.clone(), "/health").await;
        let (status, content_type, body) = get_path(app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
        assert_eq!(body, body.trim());
        assert!(body.starts_with("# HELP test_requests_total Total number of test requests"));
        assert!(body.contains("test_requests_total{method=\"GET\",status=\"200\"} 2\n"));
        assert!(body.contains("# TYPE test_uptime_seconds gauge"));
    }

    #[tokio::test]
    async fn placeholder_counter_is_opt_in() {
        let ctx = context(&[("METRICS_PLACEHOLDER_COUNTER", "true")]);
        let app = router(ctx, Router::new());

        let (_, _, body) = get_path(app, "/metrics").await;
        let value: u64 = body
            .lines()
            .find(|l| l.starts_with("test_requests_total{"))
            .and_then(|l| l.rsplit(' ').next())
            .and_then(|v| v.parse().ok())
            .unwrap();
        assert!(value < 10);
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let app = router(context(&[]), Router::new());
        let (status, _, _) = get_path(app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn service_routes_share_the_context() {
        let app = Router::new().route(
            "/name",
            get(|State(ctx): State<ServiceContext>| async move { ctx.identity.name.clone() }),
        );
        let (status, _, body) = get_path(router(context(&[]), app), "/name").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "test-service");
    }
}
