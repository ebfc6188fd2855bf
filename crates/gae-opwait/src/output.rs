//! Rendering of operations for the terminal

use gae_opwait_core::Operation;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print an operation in the requested format
pub fn print_operation(op: &Operation, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(op),
        OutputFormat::Text => {
            println!("{}", format_operation(op));
            Ok(())
        }
    }
}

/// One line per field, omitting what the operation does not carry
pub fn format_operation(op: &Operation) -> String {
    let mut lines = vec![format!("Operation: {}", op.name)];

    let status = match (op.done, op.failure()) {
        (false, _) => "\u{21bb} running".to_string(),
        (true, None) => "\u{2713} done".to_string(),
        (true, Some(status)) => format!("\u{2717} failed (code {}): {}", status.code, status.message),
    };
    lines.push(format!("Status:    {}", status));

    if let Some(method) = op
        .metadata
        .as_ref()
        .and_then(|m| m.get("method"))
        .and_then(|m| m.as_str())
    {
        lines.push(format!("Method:    {}", method));
    }
    if let Some(target) = op
        .metadata
        .as_ref()
        .and_then(|m| m.get("target"))
        .and_then(|t| t.as_str())
    {
        lines.push(format!("Target:    {}", target));
    }

    lines.join("\n")
}
