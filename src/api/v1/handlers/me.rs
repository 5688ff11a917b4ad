/*
 * Responsibility
 * - GET /me: 検証済みトークンの内容を返す
 * - GET /me/capabilities/{name}: capability を持っていなければ 403
 */
use axum::{Json, extract::Path};

use crate::{
    api::v1::{dto::me::MeResponse, extractors::AuthUser},
    error::AppError,
};

pub async fn me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse::from(&user))
}

pub async fn check_capability(
    AuthUser(user): AuthUser,
    Path(name): Path<String>,
) -> Result<Json<MeResponse>, AppError> {
    user.check_capabilities_or_no_access(&[name.as_str()])?;
    Ok(Json(MeResponse::from(&user)))
}
