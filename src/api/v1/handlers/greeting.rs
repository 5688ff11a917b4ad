/*
 * Responsibility
 * - GET /greeting: 認証任意。トークンがあれば email で挨拶する
 */
use axum::Json;

use crate::api::v1::{dto::me::GreetingResponse, extractors::AuthUser};

pub async fn greeting(user: Option<AuthUser>) -> Json<GreetingResponse> {
    let name = user
        .as_ref()
        .and_then(|AuthUser(user)| user.email().map(str::to_string));

    Json(GreetingResponse {
        greeting: format!("hello, {}", name.as_deref().unwrap_or("guest")),
        authenticated: user.is_some(),
    })
}
