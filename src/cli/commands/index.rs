//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{IndexProvider, Settings};
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index, &settings) {
        Output::error(&e.user_message());
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if force {
        remove_persisted_index(&settings)?;
        Output::info("Removed the existing index.");
    }

    let spinner = Output::spinner("Building transcript index...");
    let pipeline = match Pipeline::new(settings).await {
        Ok(p) => p,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    let index = pipeline.index();
    let manifest = index.manifest();

    Output::success("Index is ready.");
    Output::kv("Backend", &pipeline.settings().index.provider.to_string());
    Output::kv("Documents", &manifest.document_count.to_string());
    Output::kv("Embedding model", &manifest.embedding_model);
    Output::kv("Built at", &manifest.built_at.to_rfc3339());

    Ok(())
}

/// Delete whatever the configured backend has persisted.
fn remove_persisted_index(settings: &Settings) -> Result<()> {
    match settings.index.provider {
        IndexProvider::File => {
            let dir = settings.index_dir();
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
        }
        IndexProvider::Sqlite => {
            let path = settings.sqlite_path();
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
    }
    Ok(())
}
