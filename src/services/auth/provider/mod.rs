/*
 * Responsibility
 * - The contract both strategies share: one-time `initialize`, per-route `authorize`
 * - Application code holds an `Arc<dyn IdentityProvider>` and never names a strategy
 */
use async_trait::async_trait;

use crate::config::{ProviderConfig, Strategy};
use crate::middleware::auth::AuthorizationLayer;
use crate::services::auth::{error::AuthError, permissions::AuthOptions};
use crate::services::keys::KeySetOptions;

pub mod jwt;
pub mod session;

pub use jwt::JwtProvider;
pub use session::{SessionBackend, SessionGrant, SessionMiddlewareOptions, SessionProvider};

#[derive(Debug, Clone, Default)]
pub struct InitializeOptions {
    pub key_set: KeySetOptions,
    pub session: SessionMiddlewareOptions,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn config(&self) -> &ProviderConfig;

    /// Layers to install on the whole router, outermost first.
    ///
    /// Runs once; later calls return the same (possibly empty) chain without
    /// re-initialising anything.
    async fn initialize(
        &self,
        options: &InitializeOptions,
    ) -> Result<Vec<AuthorizationLayer>, AuthError>;

    /// A route guard enforcing `options`.
    fn authorize(&self, options: AuthOptions) -> AuthorizationLayer;
}
