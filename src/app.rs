/*
 * Responsibility
 * - Config読み込み → Authenticator 生成 → Router 組み立て
 * - Middleware の適用 (request id / trace / timeout, 認証)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{AuthSettings, Config, VerificationKeys};
use crate::middleware;
use crate::services::auth::{AuthFactory, AuthItem, Authenticator, Key};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,simple_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development では即死させて気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let auth = build_authenticator(&config.auth);
    tracing::info!(
        algorithm = auth.engine().configuration().algorithm().name(),
        keys = ?config.auth.keys,
        accept_query_token = config.auth.accept_query_token,
        "authenticator ready"
    );

    let state = AppState::new(Arc::new(auth));
    let app = build_router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// One key → single-key strategy, several → key list, named issuers → items.
pub fn build_authenticator(settings: &AuthSettings) -> Authenticator {
    let factory = AuthFactory::new(settings.algorithm.as_deref(), settings.hash.as_deref())
        .with_leeway(settings.leeway);
    let audience = settings.audience.as_deref();
    let issuer = settings.issuer.as_deref();

    let auth = match &settings.keys {
        VerificationKeys::Keys(keys) if keys.len() == 1 => {
            factory.auth_middleware(keys[0].as_str(), audience, issuer)
        }
        VerificationKeys::Keys(keys) => factory.auth_list_middleware(
            keys.iter().map(|k| Key::from(k.as_str())).collect(),
            audience,
            issuer,
        ),
        VerificationKeys::Issuers(items) => factory.auth_items_middleware(
            items
                .iter()
                .map(|(name, key)| AuthItem::new(name.as_str(), key.as_str()))
                .collect(),
            audience,
        ),
    };

    auth.accept_tokens_from_query_string(settings.accept_query_token)
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(router, request_timeout)
}
