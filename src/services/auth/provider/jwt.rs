/*
 * Responsibility
 * - Stateless bearer strategy: verifier built from the issuer's certificate endpoint
 * - The verifier (and its remote key set) is created at most once per provider
 *
 * Notes
 * - Guards may be built before `initialize`; the first request then initialises
 *   with default key-set options
 */
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use url::Url;

use crate::config::{ConfigError, ProviderConfig, Strategy};
use crate::middleware::auth::{AuthorizationLayer, BearerGuard};
use crate::services::auth::{
    error::AuthError, permissions::AuthOptions, token_verifier::TokenVerifier,
};
use crate::services::keys::{KeySet, KeySetOptions, RemoteKeySet};

use super::{IdentityProvider, InitializeOptions};

#[derive(Clone)]
pub struct JwtProvider {
    state: Arc<JwtState>,
}

struct JwtState {
    config: ProviderConfig,
    issuer: String,
    certs_url: Url,
    verifier: OnceCell<TokenVerifier>,
}

impl JwtProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Provider with a fixed key set; nothing is fetched from the issuer.
    pub fn with_key_set(config: ProviderConfig, keys: impl Into<KeySet>) -> Result<Self, ConfigError> {
        let verifier = verifier_for(&config, keys.into());
        Self::build(config, Some(verifier))
    }

    fn build(config: ProviderConfig, verifier: Option<TokenVerifier>) -> Result<Self, ConfigError> {
        config.validate()?;
        let certs_url = config.certs_url()?;
        let issuer = config.issuer();

        Ok(Self {
            state: Arc::new(JwtState {
                config,
                issuer,
                certs_url,
                verifier: OnceCell::new_with(verifier),
            }),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.state.config.client_id
    }

    pub fn is_initialized(&self) -> bool {
        self.state.verifier.initialized()
    }

    pub async fn verifier(&self) -> Result<&TokenVerifier, AuthError> {
        self.verifier_with(&KeySetOptions::default()).await
    }

    async fn verifier_with(&self, options: &KeySetOptions) -> Result<&TokenVerifier, AuthError> {
        self.state
            .verifier
            .get_or_try_init(|| async {
                let keys = RemoteKeySet::new(self.state.certs_url.clone(), *options)?;
                tracing::info!(
                    issuer = %self.state.issuer,
                    certs_url = %self.state.certs_url,
                    "jwt provider initialized"
                );
                Ok::<_, AuthError>(verifier_for(&self.state.config, keys.into()))
            })
            .await
    }
}

fn verifier_for(config: &ProviderConfig, keys: KeySet) -> TokenVerifier {
    let verifier = TokenVerifier::new(keys, config.issuer()).with_leeway(config.token_leeway);
    match config.token_min_validity {
        Some(seconds) => verifier.with_min_validity(seconds),
        None => verifier,
    }
}

#[async_trait]
impl IdentityProvider for JwtProvider {
    fn strategy(&self) -> Strategy {
        Strategy::Jwt
    }

    fn config(&self) -> &ProviderConfig {
        &self.state.config
    }

    async fn initialize(
        &self,
        options: &InitializeOptions,
    ) -> Result<Vec<AuthorizationLayer>, AuthError> {
        self.verifier_with(&options.key_set).await?;
        Ok(Vec::new())
    }

    fn authorize(&self, options: AuthOptions) -> AuthorizationLayer {
        let specs = options.specifiers();
        AuthorizationLayer::new(BearerGuard::new(self.clone(), options.level, specs))
    }
}
