/*
 * Responsibility
 * - URL layout of v1
 * - Guards come from provider.authorize(...) via route_layer
 *   (route_layer keeps unmatched paths a plain 404)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{admin::admin, billing::billing, health::health, me::me};
use crate::services::auth::{AuthOptions, IdentityProvider};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let provider = &state.provider;

    let authenticated_routes = Router::new()
        .route("/me", get(me))
        .route_layer(provider.authorize(AuthOptions::default()));

    let admin_routes = Router::new()
        .route("/admin", get(admin))
        .route_layer(provider.authorize(AuthOptions::role(["admin"])));

    let billing_routes = Router::new()
        .route("/billing", get(billing))
        .route_layer(provider.authorize(AuthOptions::resource(["billing:read"])));

    Router::new()
        .route("/health", get(health))
        .merge(authenticated_routes)
        .merge(admin_routes)
        .merge(billing_routes)
}
