use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use scad_language_server::engine::AnalysisEngine;
use scad_language_server::engine::outline::OutlineEngine;
use scad_language_server::logging::init_logger;
use scad_language_server::lsp::ScadBackend;

/// Language server for OpenSCAD-style solid models.
#[derive(Parser, Debug)]
#[command(name = "scad-language-server", version, about)]
struct Args {
    /// Log filter for stderr (overrides RUST_LOG), e.g. "debug" or "scad_language_server=trace"
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log to the cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Communicate over stdin/stdout (the only supported transport)
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)
        .context("Failed to initialize logging")?;

    info!(
        "Starting {} {} (stdio: {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        args.stdio
    );

    let engine: Arc<dyn AnalysisEngine> = Arc::new(OutlineEngine::new());
    let (service, socket) = LspService::new(move |client| ScadBackend::new(client, engine));

    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;

    info!("Client connection closed");
    Ok(())
}
