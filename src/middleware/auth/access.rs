//! Route guard: bearer token → verify → trust → permissions → extensions.
//!
//! `AuthorizationLayer` wraps any [`RequestGuard`]. A guard either lets the
//! request through (possibly after attaching extensions) or hands back the
//! rejection response; the inner service is never called after a rejection.
//!
//! ```ignore
//! let admin = Router::new()
//!     .route("/admin", get(admin))
//!     .route_layer(provider.authorize(AuthOptions::role(["admin"])));
//! ```

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::middleware::auth::identity::AuthenticatedUser;
use crate::services::auth::{
    claims::DecodedClaims,
    error::AuthError,
    permissions::{self, AuthLevel},
    provider::JwtProvider,
    trust,
};

#[async_trait]
pub trait RequestGuard: Send + Sync + 'static {
    /// `Ok` lets the request continue; `Err` is sent back as-is.
    async fn check(&self, req: &mut Request) -> Result<(), Response>;
}

#[derive(Clone)]
pub struct AuthorizationLayer {
    guard: Arc<dyn RequestGuard>,
}

impl AuthorizationLayer {
    pub fn new(guard: impl RequestGuard) -> Self {
        Self {
            guard: Arc::new(guard),
        }
    }
}

impl<S> Layer<S> for AuthorizationLayer {
    type Service = AuthorizationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizationService {
            inner,
            guard: self.guard.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationService<S> {
    inner: S,
    guard: Arc<dyn RequestGuard>,
}

impl<S> Service<Request> for AuthorizationService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Call the service that was polled ready, leave the fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let guard = self.guard.clone();

        Box::pin(async move {
            match guard.check(&mut req).await {
                Ok(()) => inner.call(req).await,
                Err(rejection) => Ok(rejection),
            }
        })
    }
}

/// Terminal outcome of one pass through the bearer pipeline.
#[derive(Debug)]
pub enum AuthDecision {
    Authenticated(DecodedClaims),
    /// Missing, invalid or untrusted credential (401).
    Unauthenticated(AuthError),
    /// Trusted credential lacking the required permission (403).
    Forbidden(AuthError),
}

impl From<Result<DecodedClaims, AuthError>> for AuthDecision {
    fn from(result: Result<DecodedClaims, AuthError>) -> Self {
        match result {
            Ok(claims) => AuthDecision::Authenticated(claims),
            Err(err @ AuthError::PermissionDenied(_)) => AuthDecision::Forbidden(err),
            Err(err) => AuthDecision::Unauthenticated(err),
        }
    }
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    match value.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(*token),
        _ => Err(AuthError::MissingCredential),
    }
}

/// The JWT strategy's guard.
pub struct BearerGuard {
    provider: JwtProvider,
    level: Option<AuthLevel>,
    specs: Vec<String>,
}

impl BearerGuard {
    pub fn new(provider: JwtProvider, level: Option<AuthLevel>, specs: Vec<String>) -> Self {
        Self {
            provider,
            level,
            specs,
        }
    }

    pub async fn decide(&self, headers: &HeaderMap) -> AuthDecision {
        self.authorize(headers).await.into()
    }

    async fn authorize(&self, headers: &HeaderMap) -> Result<DecodedClaims, AuthError> {
        let token = bearer_token(headers)?;

        let verifier = self.provider.verifier().await?;
        let claims = verifier.verify(token).await.inspect_err(|err| {
            tracing::warn!(error = ?err, issuer = verifier.issuer(), "access token verification failed");
        })?;

        let client_id = self.provider.client_id();
        trust::validate_party(&claims, client_id).inspect_err(|err| {
            tracing::warn!(error = ?err, azp = ?claims.azp, aud = ?claims.aud, "untrusted token party");
        })?;

        if let Some(level) = self.level {
            if !permissions::evaluate(Some(level), &self.specs, &claims, client_id) {
                tracing::info!(%level, sub = ?claims.sub, "missing permissions");
                return Err(AuthError::PermissionDenied(level));
            }
        }

        Ok(claims)
    }
}

#[async_trait]
impl RequestGuard for BearerGuard {
    async fn check(&self, req: &mut Request) -> Result<(), Response> {
        match self.decide(req.headers()).await {
            AuthDecision::Authenticated(claims) => {
                req.extensions_mut().insert(AuthenticatedUser(Arc::new(claims)));
                Ok(())
            }
            AuthDecision::Unauthenticated(err) | AuthDecision::Forbidden(err) => {
                Err(err.into_response())
            }
        }
    }
}
