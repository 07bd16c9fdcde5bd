/*
 * Responsibility
 * - GET /billing (requires resource role `billing:read`)
 */
use axum::Json;
use serde_json::{Value, json};

use crate::middleware::auth::AuthenticatedUser;

pub async fn billing(user: AuthenticatedUser) -> Json<Value> {
    Json(json!({
        "area": "billing",
        "subject": user.sub,
        "roles": user.resource_roles("billing"),
    }))
}
