use axum::Router;
use common_config::Config;
use lifecycle::Lifecycle;
use serve_metrics::setup_metrics_recorder;

use crate::{router, ServiceContext, ServiceDescriptor};

/// Run a service until it is told to stop: set up logging and metrics, bind,
/// serve `app` alongside the operational routes, then drain.
///
/// Returns an error, and the binary exits non-zero, when the listener cannot
/// bind or the drain deadline passes with requests still in flight.
pub async fn run(
    descriptor: ServiceDescriptor,
    config: Config,
    app: Router<ServiceContext>,
) -> eyre::Result<()> {
    common_logging::init(descriptor.name, &config);

    // Trap signals before binding so an early SIGTERM is not lost
    let lifecycle = Lifecycle::new(descriptor.name);
    lifecycle.trap_signals();

    let mut context = ServiceContext::new(&descriptor, &config, lifecycle.clone());

    // Installing a global recorder when the crates are used as a library
    // (during tests etc) does not work well, only the binaries do it.
    if config.export_prometheus {
        context = context.with_prometheus(setup_metrics_recorder()?);
    }

    let addr = config.bind_address(descriptor.default_port);
    tracing::info!(
        version = descriptor.version,
        environment = %config.environment,
        %addr,
        "starting {}",
        descriptor.name
    );

    let listener = match lifecycle::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    let report = lifecycle::serve(
        listener,
        router(context, app),
        &lifecycle,
        config.shutdown_timeout(),
    )
    .await?;

    tracing::info!(
        drain_ms = report.drain_duration.as_millis() as u64,
        "{} stopped",
        descriptor.name
    );
    Ok(())
}
