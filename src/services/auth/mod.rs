pub mod claims;
pub mod error;
pub mod factory;
pub mod permissions;
pub mod provider;
pub mod token_verifier;
pub mod trust;

pub use claims::{Audience, DecodedClaims};
pub use error::AuthError;
pub use factory::build_provider;
pub use permissions::{AuthLevel, AuthOptions};
pub use provider::{IdentityProvider, InitializeOptions, JwtProvider, SessionProvider};
pub use token_verifier::TokenVerifier;
