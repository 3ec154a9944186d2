use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

mod counter;
mod exposition;

pub use counter::{RequestCounter, RequestLabels};
pub use exposition::{render, CounterMode, Exposition, MetricsSchema, Series, CONTENT_TYPE};

pub const METRIC_HTTP_REQUESTS_DURATION_SECONDS: &str = "http_requests_duration_seconds";

/// Install the process-global prometheus recorder. Only the binaries call this:
/// installing a global recorder when the crates are used as a library (during
/// tests etc) does not work well.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .install_recorder()
}

/// Middleware to record some common HTTP metrics: bumps the service's request
/// counter and records the latency histogram on the global recorder, if any.
/// Someday tower-http might provide a metrics middleware: https://github.com/tower-rs/tower-http/issues/57
pub async fn track_metrics(
    State(counter): State<RequestCounter>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    // Run the rest of the request handling first, so we can measure it and get response
    // codes.
    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter.increment(method.as_str(), status);

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status.to_string()),
    ];
    metrics::histogram!(METRIC_HTTP_REQUESTS_DURATION_SECONDS, &labels).record(latency);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn app(counter: RequestCounter) -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/bad", post(|| async { StatusCode::BAD_REQUEST }))
            .layer(axum::middleware::from_fn_with_state(counter, track_metrics))
    }

    async fn call(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            axum::http::Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn counts_every_response() {
        let counter = RequestCounter::new();
        let app = app(counter.clone());

        assert_eq!(call(app.clone(), "GET", "/ok").await, StatusCode::OK);
        assert_eq!(call(app.clone(), "GET", "/ok").await, StatusCode::OK);
        assert_eq!(call(app, "POST", "/bad").await, StatusCode::BAD_REQUEST);

        assert_eq!(counter.get("GET", 200), 2);
        assert_eq!(counter.get("POST", 400), 1);
        assert_eq!(counter.get("POST", 200), 0);
    }
}
