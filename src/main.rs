#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::JwtKeys;
use crate::api::router;
use crate::storage::Backend;
use crate::storage::Storage;
use crate::users::ensure_initial_user;
use crate::utils::env_var_or_else;

mod api;
mod graceful_shutdown;
mod notes;
mod pagination;
mod storage;
#[cfg(test)]
mod tests;
mod use_cases;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "notes_service=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = match storage::setup().await? {
        Backend::Postgres(storage) => setup_app(storage).await?,
        Backend::Memory(storage) => setup_app(storage).await?,
    };

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Storage connection
/// - Initial user setup
pub async fn setup_app<S: Storage>(storage: S) -> Result<Router> {
    let jwt_keys = setup_jwt_keys()?;

    ensure_initial_user(&storage, &jwt_keys).await?;

    Ok(create_router(storage, jwt_keys))
}

/// Create the router for the notes service
fn create_router<S: Storage>(storage: S, jwt_keys: JwtKeys) -> Router {
    router::<S>()
        .method_not_allowed_fallback(api::method_not_allowed)
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(jwt_keys))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> Result<JwtKeys> {
    use crate::utils::generate_secret;

    let jwt_secret = match std::env::var("JWT_SECRET") {
        Ok(jwt_secret) if !jwt_secret.is_empty() => jwt_secret,
        _ => {
            let jwt_secret = generate_secret()?;
            tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
            jwt_secret
        }
    };

    Ok(JwtKeys::new(jwt_secret.as_bytes()))
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Ok(port) = std::env::var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            let port = port.parse::<u16>()?;

            address.set_port(port);
        }
    }

    Ok(address)
}
