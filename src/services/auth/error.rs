use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::auth::permissions::AuthLevel;
use crate::services::keys::KeySetError;

/// Failures of the bearer-token pipeline.
///
/// Verification and trust failures are client-correctable and map to 401 with
/// the message as body; a missing permission maps to 403.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Bearer authorization token")]
    MissingCredential,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Unexpected token issuer")]
    IssuerMismatch,

    #[error(transparent)]
    KeySet(#[from] KeySetError),

    #[error("Unauthorized party: {0}")]
    UnauthorizedParty(&'static str),

    #[error("Forbidden: missing {0} permissions")]
    PermissionDenied(AuthLevel),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::IssuerMismatch,
            ErrorKind::InvalidSignature | ErrorKind::InvalidKeyFormat => AuthError::SignatureInvalid,
            ErrorKind::InvalidAlgorithm => AuthError::MalformedToken("algorithm mismatch".into()),
            _ => AuthError::MalformedToken(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
