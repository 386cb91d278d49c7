use http::StatusCode;
use redb_sessions::SessionError;

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

/// Map SessionError variants to status codes. The library leaves this
/// decision to the HTTP layer.
impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match e {
                SessionError::NotStored => StatusCode::UNAUTHORIZED,
                SessionError::Decode(_) => StatusCode::BAD_REQUEST,
                SessionError::Cookie(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::debug!("Session error mapped to {}: {}", status, e);
            (status, e.to_string())
        })
    }
}

/// Implementation for a blocking task that did not run to completion
impl<T> IntoResponseError<T> for Result<T, tokio::task::JoinError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}
