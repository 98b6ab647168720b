use std::net::SocketAddr;

use thiserror::Error;

/// Server lifecycle errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("graceful shutdown timed out after {0} ms")]
    ShutdownTimeout(u64),
}

pub type Result<T> = std::result::Result<T, ServerError>;
