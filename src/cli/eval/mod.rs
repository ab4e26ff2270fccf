//! Eval command - runs a question file as a batch and prints the report

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::engine::RunResult;
use crate::infrastructure::engine::{BatchReport, BatchRunner};
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Questions as a JSON array of strings, or plain text with one per line
    pub file: PathBuf,

    /// Concurrent runs; defaults to `server.batch_concurrency`
    #[arg(long, short)]
    pub concurrency: Option<usize>,

    /// Print results and report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct EvalOutput<'a> {
    results: &'a [RunResult],
    report: &'a BatchReport,
}

pub async fn run(args: EvalArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    logging::init_logging(&config.logging_config());

    let questions = read_questions(&args.file).await?;
    anyhow::ensure!(!questions.is_empty(), "No questions in {}", args.file.display());

    let components = crate::create_components(&config).await?;
    let runner = BatchRunner::new(components.engine)
        .with_concurrency(args.concurrency.unwrap_or(config.server.batch_concurrency));

    let cancel = CancellationToken::new();
    super::cancel_on_ctrl_c(cancel.clone());

    info!(file = %args.file.display(), questions = questions.len(), "Starting evaluation");
    let (results, report) = runner.evaluate(questions.as_slice(), cancel).await;

    if args.json {
        let output = EvalOutput {
            results: &results,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (i, result) in results.iter().enumerate() {
            println!(
                "{:>3}. [{}] {}",
                i + 1,
                result.outcome.as_str(),
                result.question
            );
        }
        println!();
        print!("{}", report.render_text());
    }

    Ok(())
}

async fn read_questions(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_questions(&raw, path.extension().is_some_and(|ext| ext == "json"))
}

/// Plain text skips blank lines and `#` comments
fn parse_questions(raw: &str, json: bool) -> anyhow::Result<Vec<String>> {
    if json {
        return serde_json::from_str(raw).context("Expected a JSON array of question strings");
    }

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        let raw = "# astronomy\nWhat are the moons of Mars?\n\n  Who wrote Dune?  \n";

        let questions = parse_questions(raw, false).unwrap();

        assert_eq!(questions, vec!["What are the moons of Mars?", "Who wrote Dune?"]);
    }

    #[test]
    fn test_parse_json() {
        let questions = parse_questions(r#"["a", "b"]"#, true).unwrap();
        assert_eq!(questions, vec!["a", "b"]);

        assert!(parse_questions(r#"{"questions": []}"#, true).is_err());
    }
}
