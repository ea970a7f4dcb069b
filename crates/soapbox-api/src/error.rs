use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Every failure a handler can report. Rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid Credentials!")]
    InvalidCredentials,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Could not validate credentials")]
    InvalidToken,

    /// Token was valid but its user no longer exists.
    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    NotFound(String),

    /// Caller is authenticated but does not own the resource. Reported as 401.
    #[error("Not authorised to perform requested action")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("User with email '{0}' already exists. Please use a different email or log in.")]
    EmailTaken(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::Unauthenticated
            | Self::InvalidToken
            | Self::UserNotFound
            | Self::Forbidden => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::EmailTaken(_) => StatusCode::NOT_ACCEPTABLE,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Internal causes stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref cause) = self {
            error!("Request failed: {:#}", cause);
        }

        let status = self.status_code();
        let challenge = matches!(self, Self::Unauthenticated | Self::InvalidToken);

        let mut response = (status, Json(serde_json::json!({ "detail": self.detail() }))).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::EmailTaken("a@b.co".into()).status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn internal_detail_is_generic() {
        let err = ApiError::from(anyhow::anyhow!("disk on fire at /var/lib/soapbox.db"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn auth_failures_carry_bearer_challenge() {
        let response = ApiError::InvalidToken.into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let response = ApiError::Forbidden.into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
