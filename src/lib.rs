/*
 * Responsibility
 * - JWT 認証ライブラリとしての公開モジュール
 * - services::auth がエンジン本体、それ以外は axum への配線
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
