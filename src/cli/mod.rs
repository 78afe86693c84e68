//! Command-line interface
//!
//! Thin layer over the store facade: parse arguments, open a session against
//! the configured fixture source, render results as tables or JSON.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands, DraftArgs, ListArgs};

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
