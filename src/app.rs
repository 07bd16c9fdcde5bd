/*
 * Responsibility
 * - Load Config, build the provider, assemble the Router
 * - Apply the layers from provider.initialize() and the HTTP middleware
 * - Start axum::serve()
 */
use std::{panic, process, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, auth::AuthorizationLayer};
use crate::services::auth::{IdentityProvider, InitializeOptions, build_provider};
use crate::{api, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,iam_gate=debug,tower_http=debug cargo run
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

        // Development fails fast; production keeps serving.
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
        "starting API in {:?} mode on {} ({:?} strategy, issuer {})",
        config.app_env,
        config.addr,
        config.strategy,
        config.provider.issuer()
    );

    // The demo binary has no session adapter; the session strategy is for hosts embedding the crate.
    let provider = build_provider(config.strategy, config.provider.clone(), None)
        .context("failed to build identity provider")?;
    let layers = provider
        .initialize(&InitializeOptions {
            key_set: config.key_set,
            ..Default::default()
        })
        .await
        .context("failed to initialize identity provider")?;

    let app = build_router(AppState::new(provider), layers, config.http_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Router with the provider's global layers and HTTP middleware applied.
///
/// `layers` come from `IdentityProvider::initialize`, outermost first.
pub fn build_router(state: AppState, layers: Vec<AuthorizationLayer>, timeout: Duration) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(&state))
        .fallback(|| async { AppError::not_found("route") });

    let router = layers
        .into_iter()
        .rev()
        .fold(router, |router, layer| router.layer(layer));

    middleware::http::apply(router.with_state(state), timeout)
}
