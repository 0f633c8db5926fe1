//! Transcript loading and access.
//!
//! The transcript is static data: an ordered sequence of speaker turns with
//! millisecond offsets into the source video. An episode ships embedded in the
//! binary and can be replaced by pointing the configuration at a JSON file.

use crate::error::{Result, SporError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// The episode transcript compiled into the binary.
const EMBEDDED_TRANSCRIPT: &str = include_str!("../../assets/transcript.json");

/// One speaker turn in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Who is speaking.
    pub speaker: String,
    /// What was said.
    pub text: String,
    /// Start offset into the episode, in milliseconds.
    pub start_ms: u64,
    /// End offset into the episode, in milliseconds.
    pub end_ms: u64,
}

impl Utterance {
    /// The text form stored in the index: `"{speaker} : {text}"`.
    pub fn indexed_text(&self) -> String {
        format!("{} : {}", self.speaker, self.text)
    }
}

/// The full episode transcript, ordered by time. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Transcript {
    utterances: Vec<Utterance>,
}

impl Transcript {
    /// Build a transcript from utterances, validating timestamps.
    pub fn new(utterances: Vec<Utterance>) -> Result<Self> {
        if utterances.is_empty() {
            return Err(SporError::Transcript("transcript has no utterances".to_string()));
        }
        for (i, u) in utterances.iter().enumerate() {
            if u.end_ms < u.start_ms {
                return Err(SporError::Transcript(format!(
                    "utterance {} ends ({} ms) before it starts ({} ms)",
                    i, u.end_ms, u.start_ms
                )));
            }
        }
        Ok(Self { utterances })
    }

    /// Load the transcript that ships with the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_TRANSCRIPT)
    }

    /// Load a transcript from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SporError::Transcript(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse a transcript from a JSON array of utterances.
    pub fn from_json(json: &str) -> Result<Self> {
        let utterances: Vec<Utterance> = serde_json::from_str(json)?;
        Self::new(utterances)
    }

    /// All utterances, in episode order.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Number of utterances.
    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    /// Whether the transcript is empty. Never true for a constructed transcript.
    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// The concatenated, speaker-attributed transcript text handed to the
    /// answer model. Speakers stay in so the model can cite who said what.
    pub fn full_text(&self) -> String {
        self.utterances
            .iter()
            .map(|u| u.indexed_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// SHA-256 over the utterances, hex-encoded.
    ///
    /// Stored in the index manifest so a transcript change invalidates a
    /// previously persisted index instead of silently serving stale segments.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for u in &self.utterances {
            hasher.update(u.speaker.as_bytes());
            hasher.update([0u8]);
            hasher.update(u.text.as_bytes());
            hasher.update(u.start_ms.to_le_bytes());
            hasher.update(u.end_ms.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(speaker: &str, text: &str, start_ms: u64, end_ms: u64) -> Utterance {
        Utterance {
            speaker: speaker.to_string(),
            text: text.to_string(),
            start_ms,
            end_ms,
        }
    }

    #[test]
    fn test_embedded_transcript_loads() {
        let transcript = Transcript::embedded().unwrap();
        assert!(!transcript.is_empty());
        for u in transcript.utterances() {
            assert!(u.end_ms >= u.start_ms);
        }
    }

    #[test]
    fn test_indexed_text_format() {
        let u = utterance("A", "Chess is hard", 0, 2000);
        assert_eq!(u.indexed_text(), "A : Chess is hard");
    }

    #[test]
    fn test_rejects_inverted_timestamps() {
        let result = Transcript::new(vec![utterance("A", "hi", 2000, 1000)]);
        assert!(matches!(result, Err(SporError::Transcript(_))));
    }

    #[test]
    fn test_rejects_empty_transcript() {
        assert!(Transcript::new(Vec::new()).is_err());
    }

    #[test]
    fn test_full_text_keeps_speakers() {
        let transcript = Transcript::new(vec![
            utterance("A", "Hello", 0, 1000),
            utterance("B", "world", 1000, 2000),
        ])
        .unwrap();
        assert_eq!(transcript.full_text(), "A : Hello\nB : world");
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = Transcript::new(vec![utterance("A", "Hello", 0, 1000)]).unwrap();
        let b = Transcript::new(vec![utterance("A", "Hello!", 0, 1000)]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.fingerprint());
    }
}
