use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered 401. Terminal for the current operation; never retried.
    #[error("authentication expired")]
    AuthenticationExpired,

    #[error("request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ClientError::AuthenticationExpired)
    }

    /// HTTP status of a failed request, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::AuthenticationExpired => Some(401),
            ClientError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl(e.to_string())
    }
}

/// Recover a non-critical result to its empty default.
///
/// Every failure except `AuthenticationExpired` is logged and replaced by
/// `T::default()`; authentication failure is handed back so the caller can
/// leave the page.
pub fn degrade<T: Default>(result: Result<T, ClientError>, context: &str) -> Result<T, ClientError> {
    match result {
        Ok(value) => Ok(value),
        Err(ClientError::AuthenticationExpired) => Err(ClientError::AuthenticationExpired),
        Err(e) => {
            tracing::warn!(context, error = %e, "falling back to empty result");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrade_replaces_request_failure_with_default() {
        let failed: Result<Vec<u32>, _> = Err(ClientError::RequestFailed {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(degrade(failed, "stats").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_degrade_replaces_malformed_and_transport() {
        let malformed: Result<Vec<u32>, _> = Err(ClientError::MalformedResponse("x".into()));
        assert!(degrade(malformed, "stats").unwrap().is_empty());

        let transport: Result<i64, _> = Err(ClientError::Transport("refused".into()));
        assert_eq!(degrade(transport, "stats").unwrap(), 0);
    }

    #[test]
    fn test_degrade_propagates_auth_expiry() {
        let expired: Result<Vec<u32>, _> = Err(ClientError::AuthenticationExpired);
        assert_eq!(degrade(expired, "stats"), Err(ClientError::AuthenticationExpired));
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ClientError::AuthenticationExpired.status(), Some(401));
        let e = ClientError::RequestFailed { status: 404, message: "missing".into() };
        assert_eq!(e.status(), Some(404));
        assert_eq!(ClientError::Transport("x".into()).status(), None);
    }
}
