//! CLI entry point for the SDMX client.

use sdmx_rest::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so YAML on stdout stays clean; WARN by default, respecting RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
