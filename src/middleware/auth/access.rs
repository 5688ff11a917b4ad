//! access token (JWT) 検証 → UserAccess を extensions に入れる
//!
//! - `apply`: トークン必須。失敗したら 401 (capabilities 不足は handler 側で 403)
//! - `apply_optional`: トークンが無ければそのまま通す。送られてきたトークンは検証する

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// 認証必須の middleware を適用する。
///
/// 例：
/// ```ignore
/// let me = Router::new().route("/me", get(me));
/// let me = middleware::auth::access::apply(me, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

/// 認証任意の middleware を適用する。
pub fn apply_optional(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(
        state,
        optional_access_middleware,
    ))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = match state.auth.get_user_or_no_access(&req) {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                code = err.code(),
                "access token verification failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(issuer = ?user.issuer(), "access token accepted");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

async fn optional_access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match state.auth.get_user_access_if_exists(&req) {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(
                error = ?err,
                code = err.code(),
                "optional access token rejected"
            );
            return Err(err.into());
        }
    }

    Ok(next.run(req).await)
}
