//! Bearer-token authentication and authorization for axum services.
//!
//! An [`IdentityProvider`](services::auth::IdentityProvider) verifies access
//! tokens issued by an OpenID Connect realm, checks that they were issued for
//! this client, and evaluates role or resource permissions per route.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use middleware::auth::{AuthenticatedUser, AuthorizationLayer};
pub use services::auth::{AuthError, AuthLevel, AuthOptions, IdentityProvider};
