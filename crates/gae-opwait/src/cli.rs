//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};

/// Wait for App Engine long-running operations to finish
#[derive(Parser, Debug)]
#[command(name = "gae-opwait")]
#[command(version, about = "Wait for App Engine long-running operations to finish")]
#[command(long_about = "
Wait for App Engine long-running operations to finish

Creating or updating an App Engine application returns an operation that
completes later. gae-opwait polls it until it is done and exits non-zero if it
failed or did not finish in time.

EXAMPLES:
    # Wait for an operation, up to the default four minutes
    gae-opwait wait apps/my-app/operations/1234-abcd --app my-app

    # Allow ten minutes and name the activity for error messages
    gae-opwait wait 1234-abcd --app my-app --timeout 600 --activity \"app to be created\"

    # Inspect an operation once
    gae-opwait get 1234-abcd --app my-app -o json

    # Show the effective configuration
    gae-opwait config show
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "GAE_OPWAIT_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// App Engine Admin API endpoint
    #[arg(long, global = true, env = "GAE_OPWAIT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// OAuth2 access token
    #[arg(long, global = true, env = "GAE_OPWAIT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON output
    Json,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for an operation to finish
    Wait(WaitArgs),

    /// Fetch an operation once and print it
    Get(OperationArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show version information
    Version,
}

/// Identifies one operation
#[derive(Args, Debug, Clone)]
pub struct OperationArgs {
    /// Operation id or full resource name (apps/APP/operations/ID)
    pub operation: String,

    /// Application that owns the operation (defaults to `default_app` from config)
    #[arg(long, short)]
    pub app: Option<String>,
}

/// Arguments for `wait`
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    #[command(flatten)]
    pub target: OperationArgs,

    /// What is being waited for, used in error messages
    #[arg(long, default_value = "operation to complete")]
    pub activity: String,

    /// Maximum time to wait in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds to sleep before the first status check
    #[arg(long)]
    pub delay: Option<u64>,

    /// Smallest gap between status checks in seconds
    #[arg(long)]
    pub min_interval: Option<u64>,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

/// Configuration commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the path of the configuration file
    Path,
    /// Print the effective configuration (access token masked)
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_wait() {
        let cli = Cli::parse_from([
            "gae-opwait",
            "wait",
            "apps/my-app/operations/42",
            "--app",
            "my-app",
            "--timeout",
            "600",
            "-vv",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Wait(args) => {
                assert_eq!(args.target.operation, "apps/my-app/operations/42");
                assert_eq!(args.target.app.as_deref(), Some("my-app"));
                assert_eq!(args.timeout, Some(600));
                assert_eq!(args.activity, "operation to complete");
                assert!(!args.no_progress);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
