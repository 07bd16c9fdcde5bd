/*
 * Responsibility
 * - Response DTO for GET /me
 * - Only the verified claims a caller needs
 */
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::auth::claims::DecodedClaims;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: Option<String>,
    pub issuer: String,
    pub authorized_party: Option<String>,
    pub realm_roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&DecodedClaims> for MeResponse {
    fn from(claims: &DecodedClaims) -> Self {
        Self {
            subject: claims.sub.clone(),
            issuer: claims.iss.clone(),
            authorized_party: claims.azp.clone(),
            realm_roles: claims.realm_roles().to_vec(),
            expires_at: claims.expires_at(),
        }
    }
}
