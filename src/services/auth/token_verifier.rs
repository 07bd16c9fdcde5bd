use jsonwebtoken::{
    Algorithm, DecodingKey, Validation,
    jwk::{Jwk, KeyAlgorithm},
};

use crate::services::auth::claims::DecodedClaims;
use crate::services::auth::error::AuthError;
use crate::services::keys::KeySet;

/// Only asymmetric algorithms: a symmetric `alg` against a public JWK would
/// let anyone holding the public key mint tokens.
const ACCEPTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// Verifies access tokens issued by one issuer against its key set.
///
/// Checks signature, `exp`, `nbf` and `iss`. Audience and authorized party are
/// left to the trust check, which knows about multi-valued audiences.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: KeySet,
    issuer: String,
    leeway_seconds: u64,
    min_validity_seconds: u64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("min_validity_seconds", &self.min_validity_seconds)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(keys: impl Into<KeySet>, issuer: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            issuer: issuer.into(),
            leeway_seconds: 0,
            min_validity_seconds: 0,
        }
    }

    /// Clock skew tolerated on `exp` / `nbf`. Zero unless configured.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Reject tokens that expire in fewer than `seconds`.
    pub fn with_min_validity(mut self, seconds: u64) -> Self {
        self.min_validity_seconds = seconds;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify and decode a raw token. May suspend on a key-set fetch.
    pub async fn verify(&self, token: &str) -> Result<DecodedClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::MalformedToken("missing kid in token header".into()))?;

        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::MalformedToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let jwk = self.keys.find(&kid).await?;
        check_key_algorithm(&jwk, header.alg)?;
        let decoding_key = DecodingKey::from_jwk(&jwk)?;

        let data = jsonwebtoken::decode::<DecodedClaims>(
            token,
            &decoding_key,
            &self.validation(header.alg),
        )?;

        Ok(data.claims)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.issuer]);
        // `exp` and `nbf` are checked only when present.
        validation.set_required_spec_claims(&["iss"]);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway_seconds;
        validation.reject_tokens_expiring_in_less_than = self.min_validity_seconds;
        validation
    }
}

// A JWK that pins its algorithm must be used with exactly that algorithm.
fn check_key_algorithm(jwk: &Jwk, alg: Algorithm) -> Result<(), AuthError> {
    let Some(key_alg) = jwk.common.key_algorithm.as_ref() else {
        return Ok(());
    };

    match signing_algorithm(key_alg) {
        Some(pinned) if pinned == alg => Ok(()),
        _ => Err(AuthError::MalformedToken(format!(
            "token algorithm {alg:?} does not match key algorithm {key_alg:?}"
        ))),
    }
}

fn signing_algorithm(key_alg: &KeyAlgorithm) -> Option<Algorithm> {
    match key_alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        // Encryption algorithms never verify a signature.
        _ => None,
    }
}
