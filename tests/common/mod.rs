#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, body::Body, http::Request, response::Response};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iam_gate::app::build_router;
use iam_gate::config::ProviderConfig;
use iam_gate::services::auth::{IdentityProvider, InitializeOptions, JwtProvider};
use iam_gate::state::AppState;

pub const REALM: &str = "main";
pub const CLIENT_ID: &str = "client-x";
pub const KID: &str = "test-key";

/// Identity server stand-in: serves one Ed25519 key and signs tokens with it.
pub struct Issuer {
    pub server: MockServer,
    key: SigningKey,
}

impl Issuer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let key = SigningKey::from_bytes(&[42u8; 32]);

        let x = URL_SAFE_NO_PAD.encode(key.verifying_key().to_bytes());
        Mock::given(method("GET"))
            .and(path(format!("/realms/{REALM}/protocol/openid-connect/certs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [{ "kty": "OKP", "crv": "Ed25519", "x": x, "kid": KID, "alg": "EdDSA", "use": "sig" }]
            })))
            .mount(&server)
            .await;

        Self { server, key }
    }

    pub fn issuer(&self) -> String {
        format!("{}/realms/{REALM}", self.server.uri())
    }

    pub fn config(&self) -> ProviderConfig {
        ProviderConfig::new(self.server.uri(), REALM, CLIENT_ID)
    }

    /// Valid for five minutes, issued for `CLIENT_ID`.
    pub fn claims(&self) -> Value {
        json!({
            "iss": self.issuer(),
            "aud": CLIENT_ID,
            "sub": "user-1",
            "iat": now(),
            "exp": now() + 300,
        })
    }

    pub fn token(&self, claims: &Value) -> String {
        let header = json!({ "alg": "EdDSA", "typ": "JWT", "kid": KID });
        let encode = |v: &Value| URL_SAFE_NO_PAD.encode(serde_json::to_vec(v).unwrap());
        let input = format!("{}.{}", encode(&header), encode(claims));
        let signature = self.key.sign(input.as_bytes());
        format!("{input}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
    }

    /// Demo router guarded by a JWT provider pointed at this issuer.
    pub async fn app(&self) -> Router {
        let provider: Arc<dyn IdentityProvider> = Arc::new(JwtProvider::new(self.config()).unwrap());
        let layers = provider
            .initialize(&InitializeOptions::default())
            .await
            .unwrap();
        build_router(AppState::new(provider), layers, Duration::from_secs(5))
    }
}

pub fn now() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response {
    let mut req = Request::builder().uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

pub async fn body_text(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
