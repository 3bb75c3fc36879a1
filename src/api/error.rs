use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("payload of `{event}` is invalid: {reason}")]
    InvalidPayload { event: String, reason: String },
    #[error("frame could not be encoded: {0}")]
    Encode(String),
}
