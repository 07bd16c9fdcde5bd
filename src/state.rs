/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - One provider per process, passed explicitly from here
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::auth::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }
}
