//! typesetd - long-lived math typesetting worker.
//!
//! This is the main entry point for the worker binary. It initializes
//! logging and the rendering engine once, then services framed requests on
//! stdin and writes framed responses on stdout until a shutdown packet
//! arrives. Keeping the process alive amortizes the engine's startup cost
//! across every request the caller issues.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use typesetd::engine::GlyphEngine;
use typesetd::server;

/// The worker runs on one logical thread of control: correctness rests on
/// strict request/response sequencing, so there is nothing to parallelize.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging. Diagnostics go to stderr only - stdout is the
    // protocol channel and must carry protocol bytes exclusively.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "typesetd=info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::info!("Starting typesetd v{}", env!("CARGO_PKG_VERSION"));

    match run_worker().await {
        Ok(()) => {
            tracing::info!("typesetd exited cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Worker error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_worker() -> Result<()> {
    // A single optional process argument sets the default presentation
    // directive, applied whenever a request carries an empty hint.
    let default_aspect_ratio = std::env::args().nth(1);
    if let Some(directive) = &default_aspect_ratio {
        tracing::info!("Default aspect-ratio directive: {}", directive);
    }

    let mut engine = GlyphEngine::new(default_aspect_ratio);
    tracing::info!("Rendering engine initialized");

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    server::run(&mut stdin, &mut stdout, &mut engine)
        .await
        .context("request loop failed")
}
