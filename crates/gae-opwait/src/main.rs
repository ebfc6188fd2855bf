use anyhow::Result;
use clap::Parser;
use gae_opwait_core::Config;
use tracing::{debug, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands, OutputFormat};
use connection::ConnectionManager;
use error::CliError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };

    let conn_mgr = ConnectionManager::new(
        config,
        config_path,
        cli.endpoint.as_deref(),
        cli.access_token.as_deref(),
    );

    // Execute command
    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
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
            0 => "gae_opwait=warn,gae_opwait_core=warn",
            1 => "gae_opwait=info,gae_opwait_core=info",
            2 => "gae_opwait=debug,gae_opwait_core=debug",
            _ => "gae_opwait=trace,gae_opwait_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), CliError> {
    trace!("Executing command: {:?}", cli.command);

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                OutputFormat::Json => output::print_json(&serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                })),
                OutputFormat::Text => {
                    println!("gae-opwait {}", env!("CARGO_PKG_VERSION"));
                    Ok(())
                }
            }
        }
        Commands::Config(config_cmd) => {
            debug!("Executing config command");
            commands::config::handle_config_command(config_cmd, conn_mgr, cli.output)
        }
        Commands::Get(args) => {
            info!("Fetching operation {}", args.operation);
            commands::get::handle_get(conn_mgr, args, cli.output).await
        }
        Commands::Wait(args) => {
            info!("Waiting for operation {}", args.target.operation);
            commands::wait::handle_wait(conn_mgr, args, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => info!("Command failed after {:?}: {}", duration, e),
    }

    result
}
