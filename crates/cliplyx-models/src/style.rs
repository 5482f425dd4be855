//! Windowing style presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named heuristic profile controlling candidate window length and overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    /// Mix of short, medium and long windows (30/60/90s cycle)
    #[default]
    Auto,
    /// Short, punchy windows for short-form feeds
    Viral,
    /// Longer topic-sized windows
    Educational,
    /// Long conversation-sized windows
    Podcast,
}

impl StylePreset {
    /// All available presets.
    pub const ALL: &'static [StylePreset] = &[
        StylePreset::Auto,
        StylePreset::Viral,
        StylePreset::Educational,
        StylePreset::Podcast,
    ];

    /// Target window length in seconds for fixed-length presets.
    ///
    /// `Auto` has no single length; it cycles through
    /// [`Self::AUTO_LENGTHS`] per emitted window.
    pub fn window_length(&self) -> Option<f64> {
        match self {
            StylePreset::Auto => None,
            StylePreset::Viral => Some(20.0),
            StylePreset::Educational => Some(75.0),
            StylePreset::Podcast => Some(105.0),
        }
    }

    /// Overlap between consecutive windows in seconds.
    pub fn overlap(&self) -> f64 {
        match self {
            StylePreset::Auto => 10.0,
            StylePreset::Viral => 5.0,
            StylePreset::Educational => 10.0,
            StylePreset::Podcast => 15.0,
        }
    }

    /// Fixed relevance score assigned to windows produced by this preset.
    pub fn score(&self) -> f64 {
        match self {
            StylePreset::Auto => 0.75,
            StylePreset::Viral => 0.8,
            StylePreset::Educational => 0.7,
            StylePreset::Podcast => 0.6,
        }
    }

    /// Reason tag attached to windows produced by this preset.
    pub fn reason(&self) -> &'static str {
        match self {
            StylePreset::Auto => "auto-segment",
            StylePreset::Viral => "viral-segment",
            StylePreset::Educational => "educational-segment",
            StylePreset::Podcast => "podcast-segment",
        }
    }

    /// Window length cycle for the `Auto` preset.
    pub const AUTO_LENGTHS: &'static [f64] = &[30.0, 60.0, 90.0];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StylePreset::Auto => "auto",
            StylePreset::Viral => "viral",
            StylePreset::Educational => "educational",
            StylePreset::Podcast => "podcast",
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing a style preset from a string.
#[derive(Debug, Error)]
#[error("Unknown style preset: {0}")]
pub struct StyleParseError(pub String);

impl FromStr for StylePreset {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(StylePreset::Auto),
            "viral" => Ok(StylePreset::Viral),
            "educational" => Ok(StylePreset::Educational),
            "podcast" => Ok(StylePreset::Podcast),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for preset in StylePreset::ALL {
            assert_eq!(preset.as_str().parse::<StylePreset>().unwrap(), *preset);
        }
        assert!("cinematic".parse::<StylePreset>().is_err());
    }

    #[test]
    fn test_window_constants() {
        assert_eq!(StylePreset::Viral.window_length(), Some(20.0));
        assert_eq!(StylePreset::Viral.overlap(), 5.0);
        assert_eq!(StylePreset::Podcast.window_length(), Some(105.0));
        assert_eq!(StylePreset::Auto.window_length(), None);
        assert_eq!(StylePreset::AUTO_LENGTHS, &[30.0, 60.0, 90.0]);
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&StylePreset::Educational).unwrap(),
            "\"educational\""
        );
    }
}
