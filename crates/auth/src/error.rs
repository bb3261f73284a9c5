//! Token authentication errors
//!
//! Absent credentials, unknown records and token mismatches are not
//! errors; they are reported through [`crate::AuthenticationOutcome`].
//! Only configuration problems, fallback rejections and failures of
//! host-side collaborators travel through this type.

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Token authentication error
#[derive(Debug, thiserror::Error)]
pub enum TokenAuthError {
    /// Raised while building the registry; never at request time.
    #[error("Token authentication misconfigured: {0}")]
    Configuration(String),

    /// Authentication failure signaled by the exception fallback.
    #[error("Authentication required for {scope}")]
    Unauthenticated { scope: String },

    /// The login fallback delegated the request to a sign-in page.
    #[error("Sign in required for {scope}")]
    LoginRequired { scope: String, location: String },

    #[error("Sign in failed: {0}")]
    SignIn(#[source] anyhow::Error),

    #[error("After authentication hook failed: {0}")]
    AfterAuthentication(#[source] anyhow::Error),
}

impl TokenAuthError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenAuthError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            TokenAuthError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            TokenAuthError::Configuration(_)
            | TokenAuthError::SignIn(_)
            | TokenAuthError::AfterAuthentication(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenAuthError::Configuration(_) => "CONFIGURATION_ERROR",
            TokenAuthError::Unauthenticated { .. } => "UNAUTHENTICATED",
            TokenAuthError::LoginRequired { .. } => "LOGIN_REQUIRED",
            TokenAuthError::SignIn(_) => "SIGN_IN_ERROR",
            TokenAuthError::AfterAuthentication(_) => "AUTH_HOOK_ERROR",
        }
    }
}

impl IntoResponse for TokenAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let TokenAuthError::LoginRequired { location, .. } = &self {
            return (status, [(LOCATION, location.clone())]).into_response();
        }

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Token authentication failed internally");
        }

        let message = match &self {
            TokenAuthError::Unauthenticated { .. } => self.to_string(),
            // Collaborator details stay in the logs
            _ => "Authentication failed".to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
