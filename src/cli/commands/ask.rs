//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.user_message());
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.answer.model = model;
    }
    if let Some(top_k) = top_k {
        settings.retrieval.top_k = top_k;
    }

    let spinner = Output::spinner("Preparing the transcript index...");
    let pipeline = match Pipeline::new(settings).await {
        Ok(p) => p,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    spinner.set_message("Generating answer...");

    match pipeline.ask(question).await {
        Ok(outcome) => {
            spinner.finish_and_clear();

            println!("\n{}\n", outcome.answer);

            if outcome.links.is_empty() {
                Output::info("No transcript segment scored high enough to cite.");
            } else {
                Output::header("YouTube timestamps");
                for link in &outcome.links {
                    Output::link(&link.timestamp, link.score, &link.excerpt, &link.url);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.user_message());
            return Err(e.into());
        }
    }

    Ok(())
}
