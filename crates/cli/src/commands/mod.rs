//! Subcommand implementations.

pub mod menu;
pub mod orders;
pub mod users;

use std::io::Write;

use serde::Serialize;
use thiserror::Error;

/// Errors specific to the CLI layer.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write `value` to stdout as pretty JSON followed by a newline.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
