//! Health reporting for the service.
//!
//! The demo services have no dependencies to probe, so liveness is
//! always healthy once the process answers HTTP at all. Readiness follows
//! the lifecycle: it reports ready while the server is running and flips to
//! draining once shutdown has begun, so load balancers stop routing new
//! traffic while in-flight requests finish.
//!
//! Liveness and readiness are kept as separate payloads on purpose, they
//! answer different questions and k8s acts on them differently.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

mod clock;
mod time;

pub use clock::ProcessClock;
pub use time::{FixedTime, SystemTime, TimeSource};

/// Static description of the running service, fixed for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub name: String,
    pub version: String,
    pub environment: String,
}

impl ServiceIdentity {
    pub fn new(name: &str, version: &str, environment: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
            environment: environment.to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Ready,
    Draining,
}

/// Body of the `/health` probe.
#[derive(Debug, Serialize)]
pub struct LivenessStatus {
    pub status: HealthStatus,
    pub service: String,
    pub timestamp: String,
    pub uptime: f64,
}

impl LivenessStatus {
    pub fn check(identity: &ServiceIdentity, clock: &ProcessClock, time: &dyn TimeSource) -> Self {
        Self {
            status: HealthStatus::Healthy,
            service: identity.name.clone(),
            timestamp: time.current_time(),
            uptime: clock.uptime_seconds(),
        }
    }
}

impl IntoResponse for LivenessStatus {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Body of the `/ready` probe.
#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    pub status: HealthStatus,
    pub service: String,
    pub timestamp: String,
}

impl ReadinessStatus {
    pub fn check(identity: &ServiceIdentity, time: &dyn TimeSource, draining: bool) -> Self {
        let status = if draining {
            debug!("{} readiness check failed: draining", identity.name);
            HealthStatus::Draining
        } else {
            HealthStatus::Ready
        };

        Self {
            status,
            service: identity.name.clone(),
            timestamp: time.current_time(),
        }
    }
}

impl IntoResponse for ReadinessStatus {
    /// 200 while ready, 503 once the service started draining.
    fn into_response(self) -> Response {
        let code = match self.status {
            HealthStatus::Draining => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::OK,
        };
        (code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    fn identity() -> ServiceIdentity {
        ServiceIdentity::new("test-service", "1.0.0", "development")
    }

    fn fixed_time() -> FixedTime {
        FixedTime {
            time: "2025-07-01T11:00:00.000Z".to_string(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn liveness_is_always_healthy() {
        let clock = ProcessClock::start();
        let response = LivenessStatus::check(&identity(), &clock, &fixed_time()).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "test-service");
        assert_eq!(body["timestamp"], "2025-07-01T11:00:00.000Z");
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn readiness_follows_draining() {
        let ready = ReadinessStatus::check(&identity(), &fixed_time(), false).into_response();
        assert_eq!(ready.status(), StatusCode::OK);
        let body = body_json(ready).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["service"], "test-service");
        assert!(body.get("uptime").is_none());

        let draining = ReadinessStatus::check(&identity(), &fixed_time(), true).into_response();
        assert_eq!(draining.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(draining).await["status"], "draining");
    }
}
