//! `wait` command: poll an operation until it is done
//!
//! Wraps the core `OperationWaiter` with a progress spinner and
//! CLI-specific output.

use std::time::Duration;

use gae_opwait_core::{OperationWaiter, ProgressCallback, ProgressEvent, WaitSettings};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{OutputFormat, WaitArgs};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_operation;

/// Merge command line timing flags over the configured wait settings
pub fn effective_settings(base: &WaitSettings, args: &WaitArgs) -> WaitSettings {
    WaitSettings {
        timeout_secs: args.timeout.unwrap_or(base.timeout_secs),
        delay_secs: args.delay.unwrap_or(base.delay_secs),
        min_timeout_secs: args.min_interval.unwrap_or(base.min_timeout_secs),
        ..base.clone()
    }
}

pub async fn handle_wait(
    conn_mgr: &ConnectionManager,
    args: &WaitArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client()?;
    let app = conn_mgr.resolve_app(args.target.app.as_deref())?;
    let settings = effective_settings(&conn_mgr.config.wait, args);
    debug!(?settings, app = %app, operation = %args.target.operation, "Waiting for operation");

    let mut waiter =
        OperationWaiter::new(&client, &args.target.operation, &app).settings(&settings);

    let spinner = if args.no_progress || output_format == OutputFormat::Json {
        None
    } else {
        let pb = spinner(&args.target.operation);
        waiter = waiter.on_progress(progress_callback(pb.clone()));
        Some(pb)
    };

    let result = waiter.wait(&args.activity).await;
    if let Some(pb) = spinner
        && !pb.is_finished()
    {
        pb.finish_and_clear();
    }

    let op = result?;
    print_operation(&op, output_format)
}

fn spinner(operation: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]");
    if let Ok(style) = style {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Waiting for operation {}", operation));
    pb
}

/// Progress callback that updates the spinner
fn progress_callback(pb: ProgressBar) -> ProgressCallback {
    Box::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Started { operation } => {
            pb.set_message(format!("Operation {} started", operation));
        }
        ProgressEvent::Polling {
            operation, elapsed, ..
        } => {
            pb.set_message(format!(
                "Operation {}: running ({}s)",
                operation,
                elapsed.as_secs()
            ));
        }
        ProgressEvent::Completed { operation } => {
            pb.finish_with_message(format!("Operation {}: \u{2713} done", operation));
        }
        ProgressEvent::Failed { operation, error } => {
            pb.finish_with_message(format!("Operation {} failed: {}", operation, error));
        }
    })
}
