//! Search command implementation.

use crate::citations::format_timestamp;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&e.user_message());
        return Err(e.into());
    }

    let spinner = Output::spinner("Searching transcript...");
    let pipeline = match Pipeline::new(settings).await {
        Ok(p) => p,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };

    match pipeline.search(query, limit).await {
        Ok(results) => {
            spinner.finish_and_clear();

            if results.is_empty() {
                Output::info("No matching segments.");
                return Ok(());
            }

            for result in &results {
                let timestamp = format_timestamp(result.document.start_ms / 1000);
                println!(
                    "\n[{}] (score: {:.2}) {}",
                    timestamp, result.score, result.document.content
                );
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
