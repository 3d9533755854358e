//! Authgate IAM issuer server binary.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the IAM server.
#[derive(Parser, Debug)]
#[command(name = "authgate_iam_server", about = "Authgate IAM issuer server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3001")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/authgate_iam"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Interval between expired refresh-token sweeps, in seconds.
    #[arg(long, default_value_t = 3600)]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,authgate_iam=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(bind_addr = %args.bind_addr, "starting authgate_iam_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    authgate_iam::migrate(&pool).await?;

    let mut config = authgate_iam::config::IamConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url;

    // Periodic sweep of expired refresh-token bookkeeping rows.
    let sweep_pool = pool.clone();
    let sweep_interval = std::time::Duration::from_secs(args.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await; // the first tick completes immediately
        loop {
            ticker.tick().await;
            match authgate_iam::store::refresh_tokens::delete_expired(&sweep_pool).await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "swept expired refresh tokens"),
                Err(e) => warn!(error = %e, "expired-token sweep failed"),
            }
        }
    });

    let state = authgate_iam::AppState {
        pool,
        config: config.clone(),
    };
    let app = authgate_iam::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "IAM API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
