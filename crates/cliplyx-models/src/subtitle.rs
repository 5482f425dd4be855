//! SRT subtitle rendering for clip windows.
//!
//! Cues are numbered from 1 and use the standard `HH:MM:SS,mmm` time
//! notation. The window filter keeps only segments fully contained in the
//! window; segments straddling a boundary are dropped whole rather than
//! truncated.

use crate::{CandidateWindow, TranscriptSegment};

/// Format seconds as an SRT cue time: `HH:MM:SS,mmm`.
///
/// Rounds to whole milliseconds first, then decomposes with integer
/// division so fractional inputs like 3661.234 keep their last digit.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Keep transcript segments fully contained in the window.
///
/// A segment is kept when `segment.start >= window.start` and
/// `segment.end <= window.end`. Partial overlaps are excluded entirely.
pub fn filter_window_segments<'a>(
    segments: &'a [TranscriptSegment],
    window: &CandidateWindow,
) -> Vec<&'a TranscriptSegment> {
    segments
        .iter()
        .filter(|seg| seg.start >= window.start && seg.end <= window.end)
        .collect()
}

/// Render segments as SRT file content.
///
/// Each cue is an index line, a time range line, the text, and a blank
/// separator. Segments are rendered in the order given; callers pass a
/// time-ordered transcript.
pub fn render_srt<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a TranscriptSegment>,
{
    let mut out = String::new();

    for (index, seg) in segments.into_iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(seg.start),
            format_srt_time(seg.end),
            seg.text.trim()
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StylePreset;

    fn window(start: f64, end: f64) -> CandidateWindow {
        CandidateWindow {
            start,
            end,
            score: StylePreset::Viral.score(),
            reason: StylePreset::Viral.reason().to_string(),
        }
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.234), "01:01:01,234");
        assert_eq!(format_srt_time(59.999), "00:00:59,999");
        assert_eq!(format_srt_time(90.5), "00:01:30,500");
        // 0.07 has no exact binary form; millisecond rounding must not drop it to ,069.
        assert_eq!(format_srt_time(0.07), "00:00:00,070");
    }

    #[test]
    fn test_filter_drops_partial_overlaps() {
        let segments = vec![
            TranscriptSegment::new(5.0, 15.0, "inside"),
            TranscriptSegment::new(19.5, 20.5, "straddles end"),
        ];
        let kept = filter_window_segments(&segments, &window(0.0, 20.0));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "inside");
    }

    #[test]
    fn test_filter_keeps_boundary_touching_segments() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "at start"),
            TranscriptSegment::new(15.0, 20.0, "at end"),
        ];
        let kept = filter_window_segments(&segments, &window(0.0, 20.0));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_render_srt_layout() {
        let segments = vec![
            TranscriptSegment::new(0.0, 2.5, " hello "),
            TranscriptSegment::new(2.5, 5.0, "world"),
        ];
        let srt = render_srt(segments.iter());
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,500\nhello\n\n\
             2\n00:00:02,500 --> 00:00:05,000\nworld\n\n"
        );
    }

    #[test]
    fn test_render_srt_empty() {
        assert_eq!(render_srt(std::iter::empty()), "");
    }
}
