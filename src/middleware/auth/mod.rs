pub mod access;
pub mod identity;

pub use access::{AuthDecision, AuthorizationLayer, BearerGuard, RequestGuard, bearer_token};
pub use identity::AuthenticatedUser;
