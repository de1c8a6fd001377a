use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tiny4wd_teleop::config::{default_log_level, Args, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match Config::try_from(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Setup logging (set RUST_LOG=info or debug)
    // stderr, so the status panel keeps stdout to itself
    let panel = config.display && std::io::stdout().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_level(panel))),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = tiny4wd_teleop::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
