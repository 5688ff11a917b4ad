/*!
 * Authenticated user extractor
 *
 * Responsibility:
 * - 認証済みリクエストの UserAccess を handler に提供する
 * - 検証そのものは middleware::auth::access の責務
 */

mod auth_user;

pub use auth_user::AuthUser;
