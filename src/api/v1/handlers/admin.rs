/*
 * Responsibility
 * - GET /admin (requires realm role `admin`)
 */
use axum::Json;
use serde_json::{Value, json};

use crate::middleware::auth::AuthenticatedUser;

pub async fn admin(user: AuthenticatedUser) -> Json<Value> {
    Json(json!({ "area": "admin", "subject": user.sub }))
}
