use anyhow::Result;
use clap::Parser;
use converge_core::{CancellationToken, ConvergeContext, ConvergenceConfig};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod progress;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let mut config = if let Some(config_file) = &cli.config_file {
        debug!("Loading config from explicit path: {:?}", config_file);
        ConvergenceConfig::load_from_path(config_file)?
    } else {
        debug!("Loading config from default location");
        ConvergenceConfig::load()?
    };
    apply_overrides(&cli, &mut config)?;

    if let Err(e) = execute_command(&cli, config).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "convergectl=warn,converge_core=warn",
            1 => "convergectl=info,converge_core=info",
            2 => "convergectl=debug,converge_core=debug",
            _ => "convergectl=trace,converge_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

/// Fold the global `--retry-*` flags into the loaded configuration
fn apply_overrides(cli: &Cli, config: &mut ConvergenceConfig) -> Result<()> {
    if let Some(secs) = cli.retry_timeout {
        config.retry.timeout_secs = secs;
    }
    if let Some(ms) = cli.retry_delay_ms {
        config.retry.delay_ms = ms;
    }
    config.validate()?;
    Ok(())
}

async fn execute_command(cli: &Cli, config: ConvergenceConfig) -> Result<()> {
    if let Commands::Config(command) = &cli.command {
        return commands::config::run(command, &config, cli.config_file.as_deref());
    }

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let pb = progress::spinner(!cli.no_progress);
    let ctx = ConvergeContext::new(config)
        .with_cancellation(token)
        .with_progress(progress::callback(pb.clone()));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Create(args) => commands::create::run(&ctx, args).await,
        Commands::Delete(args) => commands::delete::run(&ctx, args).await,
        Commands::Wait(args) => commands::wait::run(&ctx, args).await,
        Commands::Config(_) => Ok(()),
    };
    if !pb.is_finished() {
        pb.finish_and_clear();
    }

    info!(elapsed = ?start.elapsed(), success = result.is_ok(), "Command finished");
    result
}
