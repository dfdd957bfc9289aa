mod config;
mod setup;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use config::Config;
use marcus_core::provider::ProviderKind;
use mcp_protocol::auth::BearerAuth;
use telemetry::{init_telemetry, log_config_validation, log_shutdown_info, log_startup_info, report_error, PerformanceTimer};

#[derive(Parser)]
#[command(name = "marcus")]
#[command(about = "Autonomous project-management coordinator for AI worker agents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Start the coordinator (stdio + SSE transports)
    #[arg(long)]
    start: bool,

    /// Port the SSE transport listens on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Configuration file path (TOML)
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<String>,

    /// Override the assignment persistence file path
    #[arg(long, env = "PERSISTENCE_PATH")]
    persistence_path: Option<String>,

    /// Kanban provider to use (only `memory` ships a concrete client)
    #[arg(long, env = "PROVIDER")]
    provider: Option<String>,

    /// Log level override
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(path, "loading configuration from file");
            Config::from_file(path)?
        }
        None => {
            info!("loading configuration from baked-in default + environment");
            Config::from_env()?
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref path) = cli.persistence_path {
        config.persistence.path = path.clone();
    }
    if let Some(ref provider) = cli.provider {
        config.provider.kind = match provider.to_lowercase().as_str() {
            "memory" => ProviderKind::Memory,
            "planka" => ProviderKind::Planka,
            "github" => ProviderKind::Github,
            "linear" => ProviderKind::Linear,
            other => anyhow::bail!("unknown provider: {other} (expected memory, planka, github, or linear)"),
        };
    }
    if let Some(ref log_level) = cli.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if !cli.start {
        println!("Marcus: autonomous project-management coordinator");
        println!();
        println!("Usage:");
        println!("  marcus --start [--port 3000] [--config marcus.toml] [--provider memory]");
        println!();
        println!("For more options, use: marcus --help");
        return Ok(());
    }

    let config = load_config(&cli).context("failed to load configuration")?;

    init_telemetry(&config.logging).context("failed to initialize telemetry")?;
    log_config_validation(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "configuration validation failed");
        std::process::exit(1);
    }

    log_startup_info(&config);

    setup::ensure_persistence_directory(&config).context("failed to prepare persistence directory")?;

    let startup_timer = PerformanceTimer::new("initialize_app");
    let coordinator = match setup::initialize_app(&config).await {
        Ok(c) => {
            startup_timer.finish();
            c
        }
        Err(e) => {
            report_error(&e, "startup failed while connecting to the kanban provider");
            std::process::exit(2);
        }
    };

    let _monitor = setup::spawn_health_monitor(&config, coordinator.clone());

    let auth = BearerAuth::new(config.auth.tokens.clone());
    let app = mcp_protocol::server::router(coordinator.clone(), auth);
    let server_addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("failed to bind SSE transport on {server_addr}"))?;

    println!("Marcus is ready.");
    println!("  SSE transport:   http://{server_addr}/sse");
    println!("  stdio transport: this process's stdin/stdout");
    println!();
    println!("Press Ctrl+C to shut down.");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let stdio_coordinator = coordinator.clone();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdio_task = tokio::spawn(async move {
        mcp_protocol::stdio::serve(stdio_coordinator, stdin, tokio::io::stdout()).await
    });

    let result = tokio::select! {
        result = axum::serve(listener, app) => {
            match result {
                Ok(()) => {
                    info!("SSE transport shut down cleanly");
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "SSE transport error");
                    std::process::exit(3);
                }
            }
        }
        result = stdio_task => {
            match result {
                Ok(Ok(())) => {
                    info!("stdio transport reached EOF");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!(error = %e, "stdio transport error");
                    std::process::exit(3);
                }
                Err(e) => {
                    error!(error = %e, "stdio transport task panicked");
                    std::process::exit(3);
                }
            }
        }
        _ = shutdown_rx => {
            info!("shutdown signal received, stopping");
            Ok(())
        }
    };

    log_shutdown_info();
    result
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("received SIGINT, initiating graceful shutdown"),
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl+c");
        info!("received Ctrl+C, initiating graceful shutdown");
    }
}
