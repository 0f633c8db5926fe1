//! Doctor command implementation.

use crate::cli::Output;
use crate::config::{IndexProvider, Settings};
use crate::index::{FileIndex, SqliteIndex};
use crate::transcript::Transcript;
use anyhow::Result;

/// Run the doctor command: report on configuration, credentials, the
/// transcript, and the persisted index.
pub fn run_doctor(settings: &Settings) -> Result<()> {
    Output::header("Spor diagnostics");

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::success(&format!("Config file: {}", config_path.display()));
    } else {
        Output::info(&format!(
            "No config file at {} (using defaults)",
            config_path.display()
        ));
    }

    if settings.credentials.has_openai_key() {
        Output::success("OPENAI_API_KEY is set");
    } else {
        Output::error("OPENAI_API_KEY is not set");
        Output::info("Set it with: export OPENAI_API_KEY='sk-...'");
    }

    let transcript = match &settings.episode.transcript_path {
        Some(path) => Transcript::from_file(&Settings::expand_path(path)),
        None => Transcript::embedded(),
    };
    match &transcript {
        Ok(t) => Output::success(&format!("Transcript loads ({} utterances)", t.len())),
        Err(e) => Output::error(&format!("Transcript does not load: {}", e)),
    }

    Output::kv("Episode", &settings.episode.title);
    Output::kv("Video ID", &settings.episode.video_id);
    Output::kv("Index backend", &settings.index.provider.to_string());

    report_index(settings, transcript.ok().as_ref());

    Ok(())
}

fn report_index(settings: &Settings, transcript: Option<&Transcript>) {
    let manifest = match settings.index.provider {
        IndexProvider::File => {
            let dir = settings.index_dir();
            if !FileIndex::exists(&dir) {
                Output::info("No persisted index yet. Run 'spor index' to build one.");
                return;
            }
            FileIndex::load_manifest(&dir).map(Some)
        }
        IndexProvider::Sqlite => {
            let path = settings.sqlite_path();
            if !SqliteIndex::exists(&path) {
                Output::info("No persisted index yet. Run 'spor index' to build one.");
                return;
            }
            SqliteIndex::load_manifest(&path)
        }
    };

    match manifest {
        Ok(Some(manifest)) => {
            Output::success(&format!(
                "Persisted index: {} documents, built {}",
                manifest.document_count,
                manifest.built_at.to_rfc3339()
            ));

            if let Some(t) = transcript {
                if manifest.matches(&t.fingerprint(), &settings.embedding.model) {
                    Output::success("Index matches the current transcript");
                } else {
                    Output::warning(
                        "Index is stale; it will be rebuilt on the next ask/search/index run",
                    );
                }
            }
        }
        Ok(None) => Output::info("No persisted index yet. Run 'spor index' to build one."),
        Err(e) => Output::error(&format!("Persisted index is unreadable: {}", e)),
    }
}
