use hoard_types::{Timestamp, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid query parameter {param}: {reason}")]
    InvalidQuery { param: &'static str, reason: String },

    #[error("invalid blob id: {0}")]
    InvalidId(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("upload too large: {size} bytes (max {max})")]
    UploadTooLarge { size: usize, max: usize },

    #[error("enumeration cursor did not advance past {at}")]
    CursorStalled { at: Timestamp },

    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
