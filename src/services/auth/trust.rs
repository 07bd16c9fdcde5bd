//! Authorized-party check: does this token legitimately name our client?
//!
//! A multi-valued `aud` must come with an explicit `azp` that is itself one of
//! the audiences, and our client must be among them too. A single `aud` keeps
//! the id-token convention where `azp` may be absent: either `azp` or `aud`
//! naming our client is enough.

use crate::services::auth::claims::{Audience, DecodedClaims};
use crate::services::auth::error::AuthError;

pub fn validate_party(claims: &DecodedClaims, expected_client_id: &str) -> Result<(), AuthError> {
    let azp = claims.azp.as_deref();

    match &claims.aud {
        Some(Audience::List(audiences)) => {
            let azp = azp.ok_or(AuthError::UnauthorizedParty(
                "missing azp while aud is multi-valued",
            ))?;

            if !audiences.iter().any(|aud| aud == azp) {
                return Err(AuthError::UnauthorizedParty("azp is not listed in aud"));
            }
            if !audiences.iter().any(|aud| aud == expected_client_id) {
                return Err(AuthError::UnauthorizedParty("client is not listed in aud"));
            }

            Ok(())
        }
        scalar => {
            let aud = scalar.as_ref().and_then(Audience::as_scalar);

            if azp == Some(expected_client_id) || aud == Some(expected_client_id) {
                Ok(())
            } else {
                Err(AuthError::UnauthorizedParty(
                    "token was not issued for this client",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLIENT: &str = "client-x";

    fn claims(value: serde_json::Value) -> DecodedClaims {
        let mut value = value;
        value["iss"] = json!("https://idp.example.com/realms/main");
        serde_json::from_value(value).unwrap()
    }

    fn reason(result: Result<(), AuthError>) -> &'static str {
        match result {
            Err(AuthError::UnauthorizedParty(reason)) => reason,
            other => panic!("expected UnauthorizedParty, got {other:?}"),
        }
    }

    #[test]
    fn scalar_audience_without_azp_passes_when_it_names_the_client() {
        assert!(validate_party(&claims(json!({ "aud": CLIENT })), CLIENT).is_ok());
    }

    #[test]
    fn scalar_audience_passes_when_azp_names_the_client() {
        let token = claims(json!({ "aud": "account", "azp": CLIENT }));
        assert!(validate_party(&token, CLIENT).is_ok());
    }

    #[test]
    fn scalar_audience_passes_when_aud_names_the_client_despite_foreign_azp() {
        let token = claims(json!({ "aud": CLIENT, "azp": "frontend" }));
        assert!(validate_party(&token, CLIENT).is_ok());
    }

    #[test]
    fn scalar_audience_for_another_client_fails() {
        let token = claims(json!({ "aud": "client-y", "azp": "client-y" }));
        assert_eq!(
            reason(validate_party(&token, CLIENT)),
            "token was not issued for this client"
        );
    }

    #[test]
    fn missing_audience_falls_back_to_azp() {
        assert!(validate_party(&claims(json!({ "azp": CLIENT })), CLIENT).is_ok());
        assert!(validate_party(&claims(json!({})), CLIENT).is_err());
    }

    #[test]
    fn list_audience_requires_azp() {
        let token = claims(json!({ "aud": ["client-y", CLIENT] }));
        assert_eq!(
            reason(validate_party(&token, CLIENT)),
            "missing azp while aud is multi-valued"
        );
    }

    #[test]
    fn list_audience_requires_azp_to_be_an_audience() {
        let token = claims(json!({ "aud": ["client-y", CLIENT], "azp": "frontend" }));
        assert_eq!(reason(validate_party(&token, CLIENT)), "azp is not listed in aud");
    }

    #[test]
    fn list_audience_without_the_client_fails_whatever_azp_says() {
        for azp in ["client-y", CLIENT, "other"] {
            let token = claims(json!({ "aud": ["client-y", "client-z"], "azp": azp }));
            assert!(validate_party(&token, CLIENT).is_err(), "azp = {azp}");
        }
    }

    #[test]
    fn list_audience_containing_azp_and_client_passes() {
        let token = claims(json!({ "aud": ["client-y", CLIENT], "azp": "client-y" }));
        assert!(validate_party(&token, CLIENT).is_ok());
    }
}
