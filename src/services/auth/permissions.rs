use std::fmt;

use serde::Deserialize;

use crate::services::auth::claims::DecodedClaims;

/// Separates the scope from the resource in a resource-level specifier.
pub const SCOPE_DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    /// Realm roles (`realm_access.roles`).
    Role,
    /// Per-client roles (`resource_access.<scope>.roles`).
    Resource,
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthLevel::Role => f.write_str("role"),
            AuthLevel::Resource => f.write_str("resource"),
        }
    }
}

/// Options for a single route guard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthOptions {
    #[serde(default)]
    pub level: Option<AuthLevel>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AuthOptions {
    pub fn role<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            level: Some(AuthLevel::Role),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn resource<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            level: Some(AuthLevel::Resource),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Permission specifiers with blank entries dropped.
    pub fn specifiers(&self) -> Vec<String> {
        self.permissions
            .iter()
            .filter(|spec| !spec.is_empty())
            .cloned()
            .collect()
    }
}

/// Returns whether `claims` satisfy at least one of `specs` at `level`.
///
/// No level, or an empty specifier list, means no restriction.
pub fn evaluate(
    level: Option<AuthLevel>,
    specs: &[String],
    claims: &DecodedClaims,
    expected_client_id: &str,
) -> bool {
    if specs.is_empty() {
        return true;
    }

    match level {
        None => true,
        Some(AuthLevel::Role) => has_role(specs, claims),
        Some(AuthLevel::Resource) => has_resource(specs, claims, expected_client_id),
    }
}

fn has_role(specs: &[String], claims: &DecodedClaims) -> bool {
    let roles = claims.realm_roles();
    specs.iter().any(|role| roles.contains(role))
}

fn has_resource(specs: &[String], claims: &DecodedClaims, expected_client_id: &str) -> bool {
    let default_scope = default_scope(claims, expected_client_id);

    specs.iter().any(|spec| {
        let (scope, resource) = scoped(spec, default_scope);
        claims
            .resource_roles(scope)
            .iter()
            .any(|role| role == resource)
    })
}

/// The token's own primary party: scalar `aud`, then `azp`, then our client.
fn default_scope<'a>(claims: &'a DecodedClaims, expected_client_id: &'a str) -> &'a str {
    claims
        .aud
        .as_ref()
        .and_then(|aud| aud.as_scalar())
        .or(claims.azp.as_deref())
        .unwrap_or(expected_client_id)
}

// `scope:a:b` keeps `a:b` as the resource name.
fn scoped<'a>(spec: &'a str, default_scope: &'a str) -> (&'a str, &'a str) {
    spec.split_once(SCOPE_DELIMITER)
        .unwrap_or((default_scope, spec))
}
