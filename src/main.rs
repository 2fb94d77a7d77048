use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use hubgate_auth::CredentialCache;
use hubgate_config::Config;
use hubgate_proxy::AppState;
use hubgate_series::build_client;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(
    name = "hubgate",
    version,
    about = "Time-series access proxy for Academic Hub dataviews and streams"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the proxy server.
    Serve {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override the listening port (default: 4000).
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address (default: 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },
    /// Perform one client-credentials exchange and report the token lifetime.
    Token {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, host } => cmd_serve(config, port, host).await,
        Commands::Token { config } => cmd_token(config).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    init_tracing(&config);
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over `log.level` from the config file.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn cmd_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(p) = port {
        config.port = p;
    }
    if let Some(h) = host {
        config.host = h;
    }

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        tenant = %config.upstream.tenant_id,
        upstream = %config.upstream.resource_url,
        "starting hubgate"
    );
    let state = AppState::from_config(config)?;
    let app = hubgate_proxy::make_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("hubgate listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn cmd_token(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let http = build_client(config.upstream.timeout(), config.upstream.connect_timeout())?;
    let cache = CredentialCache::from_config(http, &config);

    cache
        .get_token()
        .await
        .context("client-credentials exchange failed")?;
    let secs = cache.remaining().map_or(0, |d| d.as_secs());
    println!("token acquired from {}, valid for {secs}s", config.token_url());
    Ok(())
}
