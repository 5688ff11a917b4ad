use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{AuthError, UserAccess};

/// Handler で UserAccess を受け取るための extractor
/// middleware が UserAccess を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（ミドルウェア未設定・トークン無し）
///
/// `Option<AuthUser>` は任意認証のルートで使う
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserAccess);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserAccess>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Auth(AuthError::NoToken))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<UserAccess>().cloned().map(AuthUser))
    }
}
