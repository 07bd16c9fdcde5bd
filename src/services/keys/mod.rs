//! Signing-key lookup by key id.
//!
//! `KeySet::Remote` fetches the issuer's certificate endpoint and keeps it
//! cached; `KeySet::Local` serves a fixed set (offline deployments, tests).

pub mod remote;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::StatusCode;
use thiserror::Error;

pub use remote::{KeySetOptions, RemoteKeySet};

/// Key-set errors. Message-only so a cached load failure can be shared
/// between concurrent waiters.
#[derive(Debug, Clone, Error)]
pub enum KeySetError {
    #[error("failed to fetch JSON Web Key Set: {0}")]
    Fetch(String),
    #[error("JSON Web Key Set endpoint responded with {0}")]
    Status(StatusCode),
    #[error("invalid JSON Web Key Set: {0}")]
    Decode(String),
    #[error("no applicable key found in the JSON Web Key Set for kid {0:?}")]
    KeyNotFound(String),
}

#[derive(Clone)]
pub enum KeySet {
    Local(JwkSet),
    Remote(RemoteKeySet),
}

impl KeySet {
    pub async fn find(&self, kid: &str) -> Result<Jwk, KeySetError> {
        match self {
            KeySet::Local(jwks) => jwks
                .find(kid)
                .cloned()
                .ok_or_else(|| KeySetError::KeyNotFound(kid.to_string())),
            KeySet::Remote(remote) => remote.find(kid).await,
        }
    }
}

impl From<JwkSet> for KeySet {
    fn from(jwks: JwkSet) -> Self {
        KeySet::Local(jwks)
    }
}

impl From<RemoteKeySet> for KeySet {
    fn from(remote: RemoteKeySet) -> Self {
        KeySet::Remote(remote)
    }
}
