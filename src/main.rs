// Mining Backend
// A lightweight backend for per-user mining sessions, tasks and airdrop points

mod api;
mod error;
mod models;
mod services;
mod utils;

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::models::user::User;
use crate::services::registry::Registry;
use crate::services::store::MemoryStore;
use crate::utils::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "mining_backend=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    info!("Starting mining backend...");

    let registry = Registry::from_config(Arc::new(MemoryStore::new()), &config);
    info!(
        "Registry ready: tasks [{}], {} points/minute",
        registry.task_keys().join(", "),
        config.points_per_minute
    );

    if config.seed_demo_user {
        let demo = User::demo();
        info!("Seeding demo user {}", demo.id);
        registry
            .seed(demo)
            .await
            .context("Failed to seed demo user")?;
    }

    let routes = api::routes::routes(Arc::new(registry));

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.socket_addr(), async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to register Ctrl+C handler");
            info!("Shutting down...");
        })
        .with_context(|| format!("Failed to bind {}", config.socket_addr()))?;

    info!("Server listening on http://{}", addr);
    server.await;

    info!("Goodbye!");
    Ok(())
}
