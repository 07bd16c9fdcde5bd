/// Factory: build the configured `IdentityProvider` from `ProviderConfig`.
use std::sync::Arc;

use crate::config::{ConfigError, ProviderConfig, Strategy};
use crate::error::AppError;
use crate::services::auth::provider::{
    IdentityProvider, JwtProvider, SessionBackend, SessionProvider,
};

pub fn build_provider(
    strategy: Strategy,
    config: ProviderConfig,
    session_backend: Option<Arc<dyn SessionBackend>>,
) -> Result<Arc<dyn IdentityProvider>, AppError> {
    let provider: Arc<dyn IdentityProvider> = match strategy {
        Strategy::Jwt => Arc::new(JwtProvider::new(config).inspect_err(|e| {
            tracing::error!(error = %e, "invalid jwt provider configuration");
        })?),
        Strategy::Session => {
            let backend = session_backend.ok_or_else(|| {
                tracing::error!("session strategy selected without a session backend");
                ConfigError::Missing("session backend")
            })?;
            Arc::new(SessionProvider::new(config, backend).inspect_err(|e| {
                tracing::error!(error = %e, "invalid session provider configuration");
            })?)
        }
    };

    Ok(provider)
}
