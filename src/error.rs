//! Error types for webauth.

use thiserror::Error;

/// Primary error type for all webauth operations.
///
/// Configuration and presentation errors are reported synchronously when a
/// request is built or started. Everything else travels through the pending
/// transaction's one-shot result sink, since by the time a callback arrives
/// there is no caller frame left to catch an error in.
#[derive(Debug, Error)]
pub enum WebAuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed callback: {0}")]
    MalformedCallback(String),

    #[error("State mismatch: expected {expected}, got {actual:?}")]
    StateMismatch {
        expected: String,
        actual: Option<String>,
    },

    #[error("No pending transaction")]
    NoPendingTransaction,

    #[error("User cancelled the authentication")]
    UserCancelled,

    #[error("Provider error: {code}{}", .description.as_deref().map(|d| format!(" — {d}")).unwrap_or_default())]
    Provider {
        code: String,
        description: Option<String>,
    },

    #[error("Presentation error: {0}")]
    Presentation(String),
}

impl From<url::ParseError> for WebAuthError {
    fn from(error: url::ParseError) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WebAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_formats_with_description() {
        let err = WebAuthError::Provider {
            code: "access_denied".to_string(),
            description: Some("user declined consent".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("access_denied"));
        assert!(msg.contains("user declined consent"));
    }

    #[test]
    fn provider_error_formats_without_description() {
        let err = WebAuthError::Provider {
            code: "login_required".to_string(),
            description: None,
        };
        assert_eq!(err.to_string(), "Provider error: login_required");
    }

    #[test]
    fn url_parse_error_maps_to_configuration() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: WebAuthError = parse_err.into();
        assert!(matches!(err, WebAuthError::Configuration(_)));
    }
}
