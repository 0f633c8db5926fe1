//! Citation retrieval and timestamped link formatting.
//!
//! The generated answer is treated as a fresh query against the transcript
//! index; whatever scores above the threshold becomes a clickable deep link
//! into the source video.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{Retrieval, VectorIndex};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

/// Retrieve the top-k transcript segments most similar to the query text.
#[instrument(skip(index, embedder, query_text))]
pub async fn retrieve(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    query_text: &str,
    top_k: usize,
) -> Result<Vec<Retrieval>> {
    let query_embedding = embedder.embed(query_text).await?;
    let results = index.search(&query_embedding, top_k).await?;
    debug!("Retrieved {} segments", results.len());
    Ok(results)
}

/// A clickable deep link into the source video.
#[derive(Debug, Clone, Serialize)]
pub struct TimestampLink {
    /// Deep link into the video at the cited moment.
    pub url: String,
    /// Offset into the video, whole seconds.
    pub seconds_offset: u64,
    /// Formatted offset (e.g. "02:34").
    pub timestamp: String,
    /// Who is speaking at that moment.
    pub speaker: String,
    /// The cited transcript text.
    pub excerpt: String,
    /// Similarity score of the citation.
    pub score: f32,
}

/// Convert retrievals above the threshold into timestamped links.
///
/// The comparison is strict: a score exactly at the threshold is dropped.
/// Input order (descending similarity) is preserved; dropped results are not
/// reported.
pub fn format_links(results: &[Retrieval], threshold: f32, video_id: &str) -> Vec<TimestampLink> {
    results
        .iter()
        .filter(|r| r.score > threshold)
        .map(|r| {
            let seconds_offset = r.document.start_ms / 1000;
            TimestampLink {
                url: watch_url(video_id, seconds_offset),
                seconds_offset,
                timestamp: format_timestamp(seconds_offset),
                speaker: r.document.speaker.clone(),
                excerpt: r.document.content.clone(),
                score: r.score,
            }
        })
        .collect()
}

/// Build a YouTube watch URL with a start offset.
fn watch_url(video_id: &str, seconds_offset: u64) -> String {
    Url::parse_with_params(
        "https://www.youtube.com/watch",
        &[("v", video_id), ("t", seconds_offset.to_string().as_str())],
    )
    .expect("static base URL is valid")
    .to_string()
}

/// Format a seconds offset for display.
pub fn format_timestamp(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexedUtterance;
    use uuid::Uuid;

    fn retrieval(start_ms: u64, score: f32) -> Retrieval {
        Retrieval {
            document: IndexedUtterance {
                id: Uuid::new_v4(),
                speaker: "A".to_string(),
                content: "A : Chess is hard".to_string(),
                start_ms,
                end_ms: start_ms + 2000,
                position: 0,
                embedding: vec![],
            },
            score,
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let results = vec![retrieval(0, 0.5), retrieval(1000, 0.50001), retrieval(2000, 0.49)];
        let links = format_links(&results, 0.5, "6-RtRVIjlkQ");

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].seconds_offset, 1);
    }

    #[test]
    fn test_seconds_offset_truncates_milliseconds() {
        let results = vec![retrieval(0, 0.9), retrieval(1999, 0.8), retrieval(60_000, 0.7)];
        let links = format_links(&results, 0.5, "6-RtRVIjlkQ");

        assert_eq!(links[0].seconds_offset, 0);
        assert_eq!(links[1].seconds_offset, 1);
        assert_eq!(links[2].seconds_offset, 60);
    }

    #[test]
    fn test_url_shape() {
        let results = vec![retrieval(125_000, 0.9)];
        let links = format_links(&results, 0.5, "6-RtRVIjlkQ");

        assert_eq!(links[0].url, "https://www.youtube.com/watch?v=6-RtRVIjlkQ&t=125");
        assert_eq!(links[0].timestamp, "02:05");
    }

    #[test]
    fn test_input_order_is_preserved() {
        let results = vec![retrieval(9000, 0.9), retrieval(3000, 0.8), retrieval(6000, 0.7)];
        let links = format_links(&results, 0.5, "6-RtRVIjlkQ");

        let offsets: Vec<u64> = links.iter().map(|l| l.seconds_offset).collect();
        assert_eq!(offsets, vec![9, 3, 6]);
    }

    #[test]
    fn test_format_timestamp_rolls_over_to_hours() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(125), "02:05");
        assert_eq!(format_timestamp(3661), "01:01:01");
    }
}
