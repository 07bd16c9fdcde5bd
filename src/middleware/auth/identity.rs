/*
 * Responsibility
 * - The identity a guard attaches to request extensions on success
 * - Handlers take `AuthenticatedUser` as an extractor instead of re-reading headers
 *
 * Notes
 * - Missing identity means the route has no guard in front of it: 401
 */
use std::{ops::Deref, sync::Arc};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::auth::{claims::DecodedClaims, error::AuthError};

/// Verified claims of the caller, shared read-only for the rest of the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Arc<DecodedClaims>);

impl Deref for AuthenticatedUser {
    type Target = DecodedClaims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
