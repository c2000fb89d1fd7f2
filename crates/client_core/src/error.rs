use serde::Deserialize;
use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    Validation(String),
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request (status {status}): {source}")]
    Rejected {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),
}

impl BackendError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            source: ApiException::new(ErrorCode::from_status(status), message),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BackendError::NotSignedIn => ErrorCode::Unauthorized,
            BackendError::InvalidUrl(_) | BackendError::Validation(_) => ErrorCode::Validation,
            BackendError::Rejected { source, .. } => source.code,
            BackendError::Transport(_) | BackendError::UnexpectedResponse(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Whether the front end should send the user back to the login view.
    pub fn requires_reauth(&self) -> bool {
        self.code() == ErrorCode::Unauthorized
    }
}

/// Error body shapes returned by the auth service and the REST layer.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self, fallback: &str) -> String {
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| fallback.to_string());
        match self.hint {
            Some(hint) if !hint.is_empty() => format!("{message} ({hint})"),
            _ => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_message_then_auth_fields() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .expect("json");
        assert_eq!(body.into_message("x"), "Invalid login credentials");

        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"function submit_daily_score does not exist","hint":"check the RPC"}"#,
        )
        .expect("json");
        assert_eq!(
            body.into_message("x"),
            "function submit_daily_score does not exist (check the RPC)"
        );

        assert_eq!(ErrorBody::default().into_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn unauthorized_rejections_require_reauth() {
        assert!(BackendError::rejected(401, "JWT expired").requires_reauth());
        assert!(BackendError::NotSignedIn.requires_reauth());
        assert!(!BackendError::rejected(500, "boom").requires_reauth());
    }
}
