//! Authgate gateway server binary.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the gateway server.
#[derive(Parser, Debug)]
#[command(name = "authgate_gateway_server", about = "Authgate gateway server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3002")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/authgate_auth"
    )]
    database_url: String,

    /// Base URL of the IAM issuer API.
    #[arg(
        long,
        env = "IAM_BASE_URL",
        default_value = "http://127.0.0.1:3001/api/v1"
    )]
    iam_base_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Interval between expired session-store sweeps, in seconds.
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
                .unwrap_or_else(|_| "info,authgate_gateway=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(
        bind_addr = %args.bind_addr,
        iam_base_url = %args.iam_base_url,
        "starting authgate_gateway_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    authgate_gateway::migrate(&pool).await?;

    let mut config = authgate_gateway::config::GatewayConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url;
    config.iam_base_url = args.iam_base_url;

    // Periodic sweep of expired local session rows.
    let sweep_pool = pool.clone();
    let sweep_interval = std::time::Duration::from_secs(args.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await; // the first tick completes immediately
        loop {
            ticker.tick().await;
            match authgate_gateway::store::refresh_tokens::delete_expired(&sweep_pool).await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "swept expired sessions"),
                Err(e) => warn!(error = %e, "expired-session sweep failed"),
            }
        }
    });

    let state = authgate_gateway::AppState::new(pool, config.clone())?;
    let app = authgate_gateway::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "gateway API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
