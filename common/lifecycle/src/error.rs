//! Fatal lifecycle errors. Both end the process with a non-zero exit.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The listener could not acquire its address (port in use, permission denied).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// In-flight requests were still running when the drain deadline passed.
    #[error("drain did not complete within {timeout:?}")]
    DrainTimeout { timeout: Duration },
}
