use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tower::Service;

use crate::metrics::emit_shutdown_completed;
use crate::{Lifecycle, LifecycleError};

/// Outcome of a clean shutdown.
#[derive(Clone, Copy, Debug)]
pub struct ShutdownReport {
    pub drain_duration: Duration,
}

/// Bind the listener, failing fast. Never retried.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, LifecycleError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| LifecycleError::Bind { addr, source })
}

/// Serve `app` on `listener` until the lifecycle starts draining, then stop
/// accepting and wait up to `drain_timeout` for in-flight connections.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    lifecycle: &Lifecycle,
    drain_timeout: Duration,
) -> Result<ShutdownReport, LifecycleError> {
    if lifecycle.mark_running() {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, "{} listening", lifecycle.service_name()),
            Err(_) => tracing::info!("{} listening", lifecycle.service_name()),
        }
    }

    // HTTP/1 + HTTP/2 auto-detection, connections tracked for the drain
    let builder = AutoBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();

    let shutdown = lifecycle.shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // A pending signal beats a pending connection
            biased;

            _ = &mut shutdown => {
                tracing::info!("stopping accept loop");
                break;
            }
            result = listener.accept() => {
                let (socket, _remote_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("failed to accept connection: {}", e);
                        continue;
                    }
                };

                if let Err(e) = socket.set_nodelay(true) {
                    tracing::warn!("failed to set TCP_NODELAY: {}", e);
                }

                let app = app.clone();
                let service = hyper::service::service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let mut app = app.clone();
                    let req = req.map(axum::body::Body::new);
                    async move { app.call(req).await }
                });

                let conn = builder.serve_connection_with_upgrades(TokioIo::new(socket), service);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        tracing::debug!("connection closed: {}", e);
                    }
                });
            }
        }
    }

    // Closing the socket refuses new connections for the rest of the drain
    drop(listener);

    let started = Instant::now();
    let drained = tokio::time::timeout(drain_timeout, graceful.shutdown()).await;
    let drain_duration = started.elapsed();
    lifecycle.mark_terminated();

    match drained {
        Ok(()) => {
            emit_shutdown_completed(lifecycle.service_name(), true, drain_duration.as_secs_f64());
            tracing::info!(
                drain_ms = drain_duration.as_millis() as u64,
                "{} drained, shutdown complete",
                lifecycle.service_name()
            );
            Ok(ShutdownReport { drain_duration })
        }
        Err(_) => {
            emit_shutdown_completed(lifecycle.service_name(), false, drain_duration.as_secs_f64());
            tracing::error!(
                "{} still had requests in flight after {:?}",
                lifecycle.service_name(),
                drain_timeout
            );
            Err(LifecycleError::DrainTimeout {
                timeout: drain_timeout,
            })
        }
    }
}
