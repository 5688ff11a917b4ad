/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証必須 / 任意の範囲をここで決める
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    greeting::greeting,
    me::{check_capability, me},
};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/me/capabilities/{name}", get(check_capability));
    let protected = access::apply(protected, state.clone());

    let public = Router::new().route("/greeting", get(greeting));
    let public = access::apply_optional(public, state);

    protected.merge(public)
}
