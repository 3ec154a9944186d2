use std::sync::Arc;

use common_config::Config;
use health::{ProcessClock, ServiceIdentity, SystemTime, TimeSource};
use lifecycle::Lifecycle;
use metrics_exporter_prometheus::PrometheusHandle;
use serve_metrics::{CounterMode, MetricsSchema, RequestCounter};

/// Compile-time description of a service binary.
#[derive(Clone, Copy, Debug)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub default_port: u16,
    pub metrics: MetricsSchema,
}

/// Process-wide state handed to every handler through axum state.
#[derive(Clone)]
pub struct ServiceContext {
    pub identity: Arc<ServiceIdentity>,
    pub clock: ProcessClock,
    pub counter: RequestCounter,
    pub lifecycle: Lifecycle,
    pub timesource: Arc<dyn TimeSource + Send + Sync>,
    pub metrics: MetricsSchema,
    pub counter_mode: CounterMode,
    pub prometheus: Option<PrometheusHandle>,
}

impl ServiceContext {
    pub fn new(descriptor: &ServiceDescriptor, config: &Config, lifecycle: Lifecycle) -> Self {
        let counter_mode = if config.metrics_placeholder_counter {
            CounterMode::Placeholder
        } else {
            CounterMode::Live
        };

        Self {
            identity: Arc::new(ServiceIdentity::new(
                descriptor.name,
                descriptor.version,
                &config.environment,
            )),
            clock: ProcessClock::start(),
            counter: RequestCounter::new(),
            lifecycle,
            timesource: Arc::new(SystemTime {}),
            metrics: descriptor.metrics,
            counter_mode,
            prometheus: None,
        }
    }

    pub fn with_time_source<T: TimeSource + Send + Sync + 'static>(mut self, timesource: T) -> Self {
        self.timesource = Arc::new(timesource);
        self
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
