//! Highlight color palette

use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed palette of highlight colors.
///
/// Each color carries a paired fill/border value used by the surface-side
/// painter stylesheet. Unknown names or hex values fall back to [`Self::Yellow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Purple,
    Orange,
}

impl HighlightColor {
    /// All palette entries, in picker order.
    pub const ALL: [Self; 6] = [
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Pink,
        Self::Purple,
        Self::Orange,
    ];

    /// Lowercase display name, used on the wire and in CSS class names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Orange => "orange",
        }
    }

    /// Background fill value.
    #[must_use]
    pub const fn fill(self) -> &'static str {
        match self {
            Self::Yellow => "#fef9c3",
            Self::Green => "#d1fae5",
            Self::Blue => "#dbeafe",
            Self::Pink => "#fce7f3",
            Self::Purple => "#e9d5ff",
            Self::Orange => "#fed7aa",
        }
    }

    /// Border value paired with the fill.
    #[must_use]
    pub const fn border(self) -> &'static str {
        match self {
            Self::Yellow => "#fde68a",
            Self::Green => "#a7f3d0",
            Self::Blue => "#bfdbfe",
            Self::Pink => "#fbcfe8",
            Self::Purple => "#d8b4fe",
            Self::Orange => "#fdba74",
        }
    }

    /// Resolve a color from a palette name or a fill hex value.
    ///
    /// Color pickers hand the engine fill values while the wire format uses
    /// names; both resolve here. Anything unrecognized maps to Yellow.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(value) || color.fill() == value)
            .unwrap_or_default()
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name() {
        assert_eq!(HighlightColor::parse("green"), HighlightColor::Green);
        assert_eq!(HighlightColor::parse("Purple"), HighlightColor::Purple);
    }

    #[test]
    fn test_parse_by_fill_value() {
        assert_eq!(HighlightColor::parse("#fef9c3"), HighlightColor::Yellow);
        assert_eq!(HighlightColor::parse("#fed7aa"), HighlightColor::Orange);
    }

    #[test]
    fn test_parse_unknown_falls_back_to_yellow() {
        assert_eq!(HighlightColor::parse("#123456"), HighlightColor::Yellow);
        assert_eq!(HighlightColor::parse(""), HighlightColor::Yellow);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&HighlightColor::Pink).unwrap();
        assert_eq!(json, "\"pink\"");
        let parsed: HighlightColor = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(parsed, HighlightColor::Blue);
    }
}
