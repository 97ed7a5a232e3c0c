//! Client error types for the HTTP gateway

/// Error type for platform requests
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned error: status={status}, message={message}")]
    ServerError { status: u16, message: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("all servers failed")]
    AllServersFailed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ServerError { status, .. } => Some(*status),
            ClientError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
