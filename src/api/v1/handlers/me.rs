/*
 * Responsibility
 * - GET /me: identity of the authenticated caller
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::middleware::auth::AuthenticatedUser;

pub async fn me(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse::from(&*user))
}
