//! Gateway client errors

use relay_core::SessionError;

/// Errors from the gateway client and its REST helpers
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid gateway URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Bot token is not a valid header value")]
    InvalidToken,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Gateway closed the session ({code}): {reason}")]
    Rejected { code: u16, reason: String },
}

impl GatewayError {
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Session(e) => e.code(),
            Self::Request(_) => "HTTP_REQUEST_ERROR",
            Self::Http { .. } => "HTTP_STATUS_ERROR",
            Self::InvalidUrl { .. } => "INVALID_GATEWAY_URL",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Json(_) => "JSON_ERROR",
            Self::Rejected { .. } => "GATEWAY_REJECTED",
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
