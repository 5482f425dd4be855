//! Transcript segments from speech-to-text output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One timed unit of speech-to-text output.
///
/// Ephemeral; a job's transcript lives only for the duration of its run and
/// is persisted solely as concatenated caption text on derived clip records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Spoken text
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new segment.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Error validating a transcript.
#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    #[error("Segment has non-positive span: start {start}s, end {end}s")]
    EmptySpan { start: f64, end: f64 },

    #[error("Segment has negative start time: {0}s")]
    NegativeStart(f64),
}

/// Sort segments by start time and validate each span.
///
/// Speech-to-text engines occasionally return segments out of order; callers
/// must see a time-ordered transcript with `start < end` on every segment.
pub fn sort_and_validate(
    mut segments: Vec<TranscriptSegment>,
) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    for seg in &segments {
        if seg.start < 0.0 {
            return Err(TranscriptError::NegativeStart(seg.start));
        }
        if seg.start >= seg.end {
            return Err(TranscriptError::EmptySpan {
                start: seg.start,
                end: seg.end,
            });
        }
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_and_validate_orders_by_start() {
        let segments = vec![
            TranscriptSegment::new(10.0, 12.0, "second"),
            TranscriptSegment::new(0.0, 5.0, "first"),
        ];
        let sorted = sort_and_validate(segments).unwrap();
        assert_eq!(sorted[0].text, "first");
        assert_eq!(sorted[1].text, "second");
    }

    #[test]
    fn test_sort_and_validate_rejects_empty_span() {
        let segments = vec![TranscriptSegment::new(5.0, 5.0, "nothing")];
        assert_eq!(
            sort_and_validate(segments),
            Err(TranscriptError::EmptySpan { start: 5.0, end: 5.0 })
        );
    }

    #[test]
    fn test_sort_and_validate_rejects_negative_start() {
        let segments = vec![TranscriptSegment::new(-1.0, 2.0, "bad")];
        assert_eq!(
            sort_and_validate(segments),
            Err(TranscriptError::NegativeStart(-1.0))
        );
    }
}
