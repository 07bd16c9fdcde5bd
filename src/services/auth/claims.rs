use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Scalar(String),
    List(Vec<String>),
}

impl Audience {
    pub fn contains(&self, party: &str) -> bool {
        match self {
            Audience::Scalar(aud) => aud == party,
            Audience::List(auds) => auds.iter().any(|aud| aud == party),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Audience::Scalar(aud) => Some(aud),
            Audience::List(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims of a verified access token.
///
/// Only the trust-relevant fields are typed; everything else the issuer put in
/// the token is kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedClaims {
    #[serde(default)]
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RoleSet>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub resource_access: HashMap<String, RoleSet>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DecodedClaims {
    pub fn realm_roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|access| access.roles.as_slice())
            .unwrap_or_default()
    }

    pub fn resource_roles(&self, scope: &str) -> &[String] {
        self.resource_access
            .get(scope)
            .map(|access| access.roles.as_slice())
            .unwrap_or_default()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp
            .and_then(|exp| i64::try_from(exp).ok())
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> DecodedClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn scalar_and_list_audiences_deserialize() {
        let scalar = parse(json!({ "iss": "https://idp/realms/main", "aud": "client-x" }));
        assert_eq!(scalar.aud, Some(Audience::Scalar("client-x".into())));

        let list = parse(json!({ "iss": "https://idp/realms/main", "aud": ["a", "b"] }));
        assert_eq!(
            list.aud,
            Some(Audience::List(vec!["a".into(), "b".into()]))
        );
        assert!(list.aud.as_ref().unwrap().contains("b"));
        assert!(list.aud.as_ref().unwrap().as_scalar().is_none());
    }

    #[test]
    fn role_accessors_default_to_empty() {
        let claims = parse(json!({ "iss": "https://idp/realms/main" }));
        assert!(claims.realm_roles().is_empty());
        assert!(claims.resource_roles("billing").is_empty());
        assert!(claims.aud.is_none());
    }

    #[test]
    fn nested_role_claims_are_read() {
        let claims = parse(json!({
            "iss": "https://idp/realms/main",
            "realm_access": { "roles": ["user", "admin"] },
            "resource_access": { "billing": { "roles": ["read", "write"] } },
        }));
        assert_eq!(claims.realm_roles(), ["user", "admin"]);
        assert_eq!(claims.resource_roles("billing"), ["read", "write"]);
    }

    #[test]
    fn unknown_claims_pass_through() {
        let claims = parse(json!({
            "iss": "https://idp/realms/main",
            "exp": 1_700_000_000u64,
            "email": "user@example.com",
            "preferred_username": "user",
        }));
        assert_eq!(claims.extra["email"], "user@example.com");
        assert!(claims.expires_at().is_some());

        let round = serde_json::to_value(&claims).unwrap();
        assert_eq!(round["preferred_username"], "user");
        assert_eq!(round["exp"], 1_700_000_000u64);
    }
}
