//! Ask command - answers one question and prints the outcome

use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::domain::engine::{AdaptiveEngine, RunOutcome, RunResult};
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Print the full run result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    logging::init_logging(&config.logging_config());

    let components = crate::create_components(&config).await?;
    let cancel = CancellationToken::new();
    super::cancel_on_ctrl_c(cancel.clone());

    let result = components.engine.ask(&args.question, cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render(&result));
    }

    if result.outcome == RunOutcome::Done {
        Ok(())
    } else {
        anyhow::bail!("Run ended with {}", result.outcome.as_str())
    }
}

fn render(result: &RunResult) -> String {
    let route = result.route_taken.map(|r| r.as_str()).unwrap_or("none");
    let mut out = format!(
        "Outcome: {} (route: {}, attempts: {}, {} ms)\n",
        result.outcome.as_str(),
        route,
        result.attempts,
        result.duration_ms
    );

    match (&result.final_answer, &result.diagnostics.error) {
        (Some(answer), _) => out.push_str(answer),
        (None, Some(error)) => out.push_str(&format!("Error: {}", error)),
        (None, None) => {
            if let Some(candidate) = &result.diagnostics.best_candidate {
                out.push_str(&format!("Best unaccepted answer: {}", candidate));
            }
        }
    }

    out
}
