use dal_access::AccessError;
use thiserror::Error;

/// Error codes carried by [`DataAccessResponse::Error`](crate::DataAccessResponse::Error).
pub mod codes {
    pub const VALIDATION: u32 = 400;
    pub const NOT_FOUND: u32 = 404;
    pub const READ_ONLY: u32 = 405;
    pub const CONFIRMATION_FAILED: u32 = 422;
    pub const INTERNAL: u32 = 500;
    pub const NOT_INITIALIZED: u32 = 503;
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid message type: {0}")]
    InvalidMessageType(u8),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("framing error: {0}")]
    FramingError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("remote error: code={code}, message={message}")]
    Remote { code: u32, message: String },

    #[error("unexpected response {received} to {request}")]
    UnexpectedResponse {
        request: &'static str,
        received: &'static str,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<ProtocolError> for AccessError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Remote {
                code: codes::VALIDATION,
                message,
            } => Self::Validation(message),
            ProtocolError::Remote {
                code: codes::NOT_INITIALIZED,
                ..
            } => Self::NotInitialized,
            ProtocolError::Remote {
                code: codes::READ_ONLY,
                ..
            } => Self::ReadOnly,
            other => Self::Remote(other.to_string()),
        }
    }
}

/// Error code a dispatcher reports for `error`.
pub(crate) fn code_for(error: &AccessError) -> u32 {
    match error {
        AccessError::Validation(_) => codes::VALIDATION,
        AccessError::Block(e) if !e.is_format_error() => codes::VALIDATION,
        AccessError::NotInitialized => codes::NOT_INITIALIZED,
        AccessError::ReadOnly => codes::READ_ONLY,
        _ => codes::INTERNAL,
    }
}
