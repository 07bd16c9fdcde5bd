/*
 * Responsibility
 * - Cookie-session strategy: everything is delegated to the identity server's adapter
 * - This module only maps `AuthOptions` onto the adapter's protect/enforce calls
 *
 * Notes
 * - The adapter owns login redirects, session storage and token refresh
 * - An empty specifier list means "any authenticated session"
 */
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Request, response::Response};
use tokio::sync::OnceCell;

use crate::config::{ConfigError, ProviderConfig, Strategy};
use crate::middleware::auth::{AuthorizationLayer, RequestGuard};
use crate::services::auth::{
    error::AuthError,
    permissions::{AuthLevel, AuthOptions},
};

use super::{IdentityProvider, InitializeOptions};

/// The adapter's view of the session's access token.
pub trait SessionGrant {
    fn has_role(&self, role: &str) -> bool;
}

pub type RoleCheck = Arc<dyn Fn(&dyn SessionGrant) -> bool + Send + Sync>;

/// Endpoints the adapter's own middleware answers.
#[derive(Debug, Clone, Default)]
pub struct SessionMiddlewareOptions {
    pub admin: Option<String>,
    pub logout: Option<String>,
}

/// Host-supplied adapter to an identity-server session library.
#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    /// The adapter's middleware chain, installed once on the router.
    fn middleware(&self, options: &SessionMiddlewareOptions) -> Vec<AuthorizationLayer>;

    /// Require a session, optionally one whose grant passes `check`.
    async fn protect(&self, req: &mut Request, check: Option<RoleCheck>) -> Result<(), Response>;

    /// Require the listed resource permissions.
    async fn enforce(&self, req: &mut Request, permissions: &[String]) -> Result<(), Response>;
}

#[derive(Clone)]
pub struct SessionProvider {
    config: ProviderConfig,
    backend: Arc<dyn SessionBackend>,
    middleware: Arc<OnceCell<Vec<AuthorizationLayer>>>,
}

impl SessionProvider {
    pub fn new(config: ProviderConfig, backend: Arc<dyn SessionBackend>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            middleware: Arc::new(OnceCell::new()),
        })
    }
}

#[async_trait]
impl IdentityProvider for SessionProvider {
    fn strategy(&self) -> Strategy {
        Strategy::Session
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn initialize(
        &self,
        options: &InitializeOptions,
    ) -> Result<Vec<AuthorizationLayer>, AuthError> {
        let chain = self
            .middleware
            .get_or_init(|| async { self.backend.middleware(&options.session) })
            .await;
        Ok(chain.clone())
    }

    fn authorize(&self, options: AuthOptions) -> AuthorizationLayer {
        let specs = options.specifiers();
        let rule = match options.level {
            _ if specs.is_empty() => SessionRule::Protect(None),
            Some(AuthLevel::Role) => {
                let check: RoleCheck = Arc::new(move |grant: &dyn SessionGrant| {
                    specs.iter().any(|role| grant.has_role(role))
                });
                SessionRule::Protect(Some(check))
            }
            Some(AuthLevel::Resource) => SessionRule::Enforce(specs),
            None => SessionRule::Protect(None),
        };

        AuthorizationLayer::new(SessionGuard {
            backend: self.backend.clone(),
            rule,
        })
    }
}

enum SessionRule {
    Protect(Option<RoleCheck>),
    Enforce(Vec<String>),
}

struct SessionGuard {
    backend: Arc<dyn SessionBackend>,
    rule: SessionRule,
}

#[async_trait]
impl RequestGuard for SessionGuard {
    async fn check(&self, req: &mut Request) -> Result<(), Response> {
        match &self.rule {
            SessionRule::Protect(check) => self.backend.protect(req, check.clone()).await,
            SessionRule::Enforce(permissions) => self.backend.enforce(req, permissions).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        response::IntoResponse,
        routing::get,
    };
    use tower::ServiceExt;

    /// Session roles come from `x-session-roles`; no header, no session.
    #[derive(Default)]
    struct FakeBackend {
        middleware_calls: AtomicUsize,
    }

    struct Roles(Vec<String>);

    impl SessionGrant for Roles {
        fn has_role(&self, role: &str) -> bool {
            self.0.iter().any(|r| r == role)
        }
    }

    fn session(req: &Request) -> Result<Roles, Response> {
        req.headers()
            .get("x-session-roles")
            .and_then(|v| v.to_str().ok())
            .map(|v| Roles(v.split(',').map(str::to_string).collect()))
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
    }

    #[async_trait]
    impl SessionBackend for FakeBackend {
        fn middleware(&self, _options: &SessionMiddlewareOptions) -> Vec<AuthorizationLayer> {
            self.middleware_calls.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }

        async fn protect(&self, req: &mut Request, check: Option<RoleCheck>) -> Result<(), Response> {
            let roles = session(req)?;
            let grant: &dyn SessionGrant = &roles;
            match check {
                Some(check) if !check(grant) => Err(StatusCode::FORBIDDEN.into_response()),
                _ => Ok(()),
            }
        }

        async fn enforce(&self, req: &mut Request, permissions: &[String]) -> Result<(), Response> {
            let roles = session(req)?;
            if permissions.iter().all(|p| roles.has_role(p)) {
                Ok(())
            } else {
                Err(StatusCode::FORBIDDEN.into_response())
            }
        }
    }

    fn provider(backend: Arc<FakeBackend>) -> SessionProvider {
        SessionProvider::new(
            ProviderConfig::new("https://idp.example.com", "main", "client-x"),
            backend,
        )
        .unwrap()
    }

    async fn status(layer: AuthorizationLayer, roles: Option<&str>) -> StatusCode {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(layer);

        let mut req = axum::http::Request::builder().uri("/");
        if let Some(roles) = roles {
            req = req.header("x-session-roles", roles);
        }
        app.oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn backend_middleware_is_installed_once() {
        let backend = Arc::new(FakeBackend::default());
        let provider = provider(backend.clone());

        let options = InitializeOptions::default();
        provider.initialize(&options).await.unwrap();
        provider.initialize(&options).await.unwrap();

        assert_eq!(backend.middleware_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.strategy(), Strategy::Session);
    }

    #[tokio::test]
    async fn no_level_requires_a_session() {
        let provider = provider(Arc::default());
        let guard = || provider.authorize(AuthOptions::default());

        assert_eq!(status(guard(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(guard(), Some("user")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn role_level_accepts_any_listed_role() {
        let provider = provider(Arc::default());
        let guard = || provider.authorize(AuthOptions::role(["admin", "ops"]));

        assert_eq!(status(guard(), Some("user,ops")).await, StatusCode::OK);
        assert_eq!(status(guard(), Some("user")).await, StatusCode::FORBIDDEN);
        assert_eq!(status(guard(), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn resource_level_is_enforced_by_the_backend() {
        let provider = provider(Arc::default());
        let guard = || provider.authorize(AuthOptions::resource(["billing:read"]));

        assert_eq!(status(guard(), Some("billing:read")).await, StatusCode::OK);
        assert_eq!(status(guard(), Some("billing:write")).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn empty_specifiers_only_require_a_session() {
        let provider = provider(Arc::default());
        let guard = || provider.authorize(AuthOptions::role(Vec::<String>::new()));

        assert_eq!(status(guard(), Some("anyone")).await, StatusCode::OK);
    }
}
