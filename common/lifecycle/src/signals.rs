use tokio::signal::unix::{signal, SignalKind};

/// Resolves with the name of the first termination signal received.
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    let mut term = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    };
    tracing::info!("received {}", name);
    Ok(name)
}
