#![warn(clippy::uninlined_format_args)]

mod bootstrap;
mod cli;

use std::process;

fn main() {
    if let Err(err) = bootstrap::run() {
        tracing::error!(%err, "command failed");
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
