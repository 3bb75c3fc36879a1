use thiserror::Error;

use crate::api::error::SchemaError;

#[derive(Debug, Error)]
pub enum RelayClientError {
    #[cfg(feature = "ws")]
    #[error("connection to relay failed: {0}")]
    ConnectionFailure(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("relay closed the connection before assigning an id")]
    NoHandshake,
    #[error("relay did not assign an id in time")]
    HandshakeTimeout,
    #[error("connection to relay is no longer running")]
    NotRunning,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
