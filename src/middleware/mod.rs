/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: トークン検証, http: request id / trace / timeout
 */
pub mod auth;
pub mod http;
