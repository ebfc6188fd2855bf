//! `config` commands

use gae_opwait_core::Config;

use crate::cli::{ConfigCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_json;

pub fn handle_config_command(
    cmd: &ConfigCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Path => {
            let path = match &conn_mgr.config_path {
                Some(path) => path.clone(),
                None => Config::config_path()?,
            };
            match output_format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "path": path.display().to_string(),
                    "exists": path.exists(),
                })),
                OutputFormat::Text => {
                    println!("{}", path.display());
                    Ok(())
                }
            }
        }
        ConfigCommands::Show => {
            match output_format {
                OutputFormat::Json => print_json(&conn_mgr.config.redacted()),
                OutputFormat::Text => {
                    print!("{}", conn_mgr.config.to_toml_redacted()?);
                    Ok(())
                }
            }
        }
    }
}
