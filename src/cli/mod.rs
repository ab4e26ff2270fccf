//! CLI module
//!
//! - `serve`: HTTP API over the engine
//! - `ask`: answer a single question
//! - `eval`: run a question file and print the batch report

pub mod ask;
pub mod eval;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Adaptive retrieval-augmented question answering
#[derive(Parser)]
#[command(name = "adaptive-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer one question
    Ask(ask::AskArgs),

    /// Evaluate a file of questions
    Eval(eval::EvalArgs),
}

/// Load `.env`, then layered configuration
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::load()?)
}

/// Cancel `token` on Ctrl+C
pub(crate) fn cancel_on_ctrl_c(token: tokio_util::sync::CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling");
            token.cancel();
        }
    });
}
