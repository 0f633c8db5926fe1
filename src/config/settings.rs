//! Configuration settings for Spor.

use crate::error::{Result, SporError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
///
/// Everything here is constructed once at process start and read-only
/// afterwards. Credentials are pulled from the environment during `load` so
/// no component reads environment variables itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub episode: EpisodeSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub answer: AnswerSettings,
    pub retrieval: RetrievalSettings,
    pub ui: UiSettings,
    pub prompts: PromptSettings,
    /// API credentials, read from the environment at load time.
    #[serde(skip)]
    pub credentials: Credentials,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.spor".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// The podcast episode this instance answers questions about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeSettings {
    /// YouTube video ID of the episode.
    pub video_id: String,
    /// Episode title shown in the UI.
    pub title: String,
    /// Static show/host/guest description included in every answer prompt.
    pub context_preamble: String,
    /// Path to a transcript JSON file. None uses the embedded episode.
    pub transcript_path: Option<String>,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            video_id: "6-RtRVIjlkQ".to_string(),
            title: "SparX Podcast".to_string(),
            context_preamble: "For the latest episode of SparX, Mukesh Bansal, founder of \
                Myntra and Cult.fit, is in conversation with India's first Grandmaster, \
                Viswanathan Anand. Anand is a five-time World Chess Champion, and also won \
                the World Rapid and World Blitz Championships. His victories brought \
                national pride and global recognition, inspiring a surge in young players \
                and a vibrant chess culture in India. The conversation covers his journey \
                with chess, stories with other players, the evolution of the game, and his \
                experiences throughout his career."
                .to_string(),
            transcript_path: None,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Index backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IndexProvider {
    /// JSON file under the index directory (default).
    #[default]
    File,
    /// SQLite database.
    Sqlite,
}

impl std::str::FromStr for IndexProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(IndexProvider::File),
            "sqlite" => Ok(IndexProvider::Sqlite),
            _ => Err(format!("Unknown index provider: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexProvider::File => write!(f, "file"),
            IndexProvider::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Persisted index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Index backend (file, sqlite).
    pub provider: IndexProvider,
    /// Directory for the file backend.
    pub dir: String,
    /// Path to the SQLite database (for the sqlite backend).
    pub sqlite_path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            provider: IndexProvider::File,
            dir: "~/.spor/index".to_string(),
            sqlite_path: "~/.spor/index.db".to_string(),
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// Chat model for answer generation.
    pub model: String,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
        }
    }
}

/// Citation retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of transcript segments retrieved per question.
    pub top_k: usize,
    /// Minimum similarity score for a segment to become a link (strict >).
    pub link_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            link_threshold: 0.5,
        }
    }
}

/// Web UI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Theme primary color (CSS value).
    pub primary_color: String,
    /// Placeholder question shown in the input box.
    pub default_question: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            primary_color: "#01e8df".to_string(),
            default_question: "What is zugzwang".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}


/// API credentials, read once at startup and passed by reference thereafter.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }

    /// Build credentials from a known key. Used by tests and embedders.
    pub fn with_openai_key(key: impl Into<String>) -> Self {
        Self {
            openai_api_key: Some(key.into()),
        }
    }

    /// The OpenAI API key, or a credentials error naming what is missing.
    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            SporError::Credentials(
                "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
            )
        })
    }

    /// Whether an OpenAI key is present.
    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.credentials = Credentials::from_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SporError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations that would only fail later.
    pub fn validate(&self) -> Result<()> {
        let video_id_shape =
            Regex::new(r"^[A-Za-z0-9_-]{11}$").map_err(|e| SporError::Config(e.to_string()))?;
        if !video_id_shape.is_match(&self.episode.video_id) {
            return Err(SporError::Config(format!(
                "'{}' does not look like a YouTube video ID",
                self.episode.video_id
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(SporError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spor")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded index directory path (file backend).
    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.index.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.retrieval.top_k, 3);
        assert!((settings.retrieval.link_threshold - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_bad_video_id() {
        let mut settings = Settings::default();
        settings.episode.video_id = "not a video".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_key_is_a_credentials_error() {
        let credentials = Credentials::default();
        assert!(matches!(
            credentials.openai_api_key(),
            Err(SporError::Credentials(_))
        ));

        let credentials = Credentials::with_openai_key("sk-test");
        assert_eq!(credentials.openai_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_index_provider_from_str() {
        assert_eq!("file".parse::<IndexProvider>().unwrap(), IndexProvider::File);
        assert_eq!("sqlite".parse::<IndexProvider>().unwrap(), IndexProvider::Sqlite);
        assert!("chroma".parse::<IndexProvider>().is_err());
    }
}
