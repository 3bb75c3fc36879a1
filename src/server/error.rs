use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("invalid origin pattern `{0}`")]
    InvalidOriginPattern(String),
}
