//! `get` command: fetch an operation once

use gae_opwait_core::OperationsApi;
use tracing::debug;

use crate::cli::{OperationArgs, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_operation;

pub async fn handle_get(
    conn_mgr: &ConnectionManager,
    args: &OperationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let app = conn_mgr.resolve_app(args.app.as_deref())?;
    debug!(app = %app, operation = %args.operation, "Fetching operation");

    let op = client.get_operation(&app, &args.operation).await?;
    print_operation(&op, output_format)
}
