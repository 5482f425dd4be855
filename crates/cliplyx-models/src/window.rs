//! Candidate window selection.
//!
//! Pure, deterministic windowing heuristic: the source duration and a style
//! preset fully determine the emitted windows. No content analysis happens
//! here; relevance scores are fixed per preset and currently unused for
//! ranking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::StylePreset;

/// A contiguous time range of the source video chosen as a clip candidate.
///
/// Ephemeral; never persisted. Clips derived from a window carry the window
/// bounds on their own record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateWindow {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Fixed relevance score of the producing heuristic
    pub score: f64,
    /// Tag identifying which heuristic produced this window
    pub reason: String,
}

impl CandidateWindow {
    /// Window duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Select candidate windows for a video of the given duration.
///
/// Fixed-length presets emit `[t, t+L]` while `t + L <= duration`, stepping
/// by `L - overlap`, so the final admissible window is never truncated below
/// the preset length. `Auto` cycles its length through 30/60/90 seconds per
/// emitted window, steps by `len - 10`, and keeps emitting while
/// `t < duration - 30` (its final window may be truncated to `duration`).
///
/// A duration shorter than one window yields an empty list; that is a valid
/// outcome, not an error.
pub fn select_windows(duration: f64, style: StylePreset) -> Vec<CandidateWindow> {
    if duration <= 0.0 {
        return Vec::new();
    }

    match style.window_length() {
        Some(length) => fixed_windows(duration, length, style),
        None => auto_windows(duration, style),
    }
}

fn fixed_windows(duration: f64, length: f64, style: StylePreset) -> Vec<CandidateWindow> {
    let step = length - style.overlap();
    let mut windows = Vec::new();
    let mut start = 0.0;

    while start + length <= duration {
        windows.push(CandidateWindow {
            start,
            end: start + length,
            score: style.score(),
            reason: style.reason().to_string(),
        });
        start += step;
    }

    windows
}

fn auto_windows(duration: f64, style: StylePreset) -> Vec<CandidateWindow> {
    let lengths = StylePreset::AUTO_LENGTHS;
    let mut windows = Vec::new();
    let mut start = 0.0;
    let mut cycle = 0usize;

    while start < duration - lengths[0] {
        let length = lengths[cycle % lengths.len()];
        windows.push(CandidateWindow {
            start,
            end: (start + length).min(duration),
            score: style.score(),
            reason: style.reason().to_string(),
        });
        start += length - style.overlap();
        cycle += 1;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viral_50s_yields_three_windows() {
        let windows = select_windows(50.0, StylePreset::Viral);
        let bounds: Vec<(f64, f64)> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(bounds, vec![(0.0, 20.0), (15.0, 35.0), (30.0, 50.0)]);
        for w in &windows {
            assert_eq!(w.score, 0.8);
            assert_eq!(w.reason, "viral-segment");
        }
    }

    #[test]
    fn test_viral_45s_yields_two_windows() {
        // 45s admits starts at 0 and 15 (30 + 20 > 45).
        let windows = select_windows(45.0, StylePreset::Viral);
        let bounds: Vec<(f64, f64)> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(bounds, vec![(0.0, 20.0), (15.0, 35.0)]);
    }

    #[test]
    fn test_short_video_yields_no_windows() {
        assert!(select_windows(10.0, StylePreset::Viral).is_empty());
        assert!(select_windows(0.0, StylePreset::Podcast).is_empty());
        assert!(select_windows(25.0, StylePreset::Auto).is_empty());
    }

    #[test]
    fn test_exact_length_video_yields_one_window() {
        let windows = select_windows(20.0, StylePreset::Viral);
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (0.0, 20.0));
    }

    #[test]
    fn test_windows_are_ordered_with_constant_overlap() {
        for style in [StylePreset::Viral, StylePreset::Educational, StylePreset::Podcast] {
            let windows = select_windows(600.0, style);
            assert!(!windows.is_empty());
            let length = style.window_length().unwrap();
            for pair in windows.windows(2) {
                assert!(pair[1].start > pair[0].start);
                // Consecutive windows overlap by exactly the preset constant.
                assert_eq!(pair[0].end - pair[1].start, style.overlap());
            }
            for w in &windows {
                assert!(w.end <= 600.0);
                assert_eq!(w.duration(), length);
            }
        }
    }

    #[test]
    fn test_auto_cycles_lengths() {
        let windows = select_windows(300.0, StylePreset::Auto);
        assert!(windows.len() >= 3);
        assert_eq!(windows[0].duration(), 30.0);
        assert_eq!(windows[1].duration(), 60.0);
        assert_eq!(windows[2].duration(), 90.0);
        // Step is current length minus 10.
        assert_eq!(windows[1].start, 20.0);
        assert_eq!(windows[2].start, 70.0);
        for w in &windows {
            assert!(w.end <= 300.0);
            assert_eq!(w.reason, "auto-segment");
        }
    }

    #[test]
    fn test_auto_stops_inside_final_30s() {
        // 100s: start=70 is not < 70, so the 90s window never starts.
        let windows = select_windows(100.0, StylePreset::Auto);
        let bounds: Vec<(f64, f64)> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(bounds, vec![(0.0, 30.0), (20.0, 80.0)]);
    }

    #[test]
    fn test_auto_truncates_final_window_to_duration() {
        // 105s admits start=70; the 90s window is cut at the source end.
        let windows = select_windows(105.0, StylePreset::Auto);
        let bounds: Vec<(f64, f64)> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(bounds, vec![(0.0, 30.0), (20.0, 80.0), (70.0, 105.0)]);
    }

    #[test]
    fn test_determinism() {
        let a = select_windows(437.5, StylePreset::Educational);
        let b = select_windows(437.5, StylePreset::Educational);
        assert_eq!(a, b);
    }
}
