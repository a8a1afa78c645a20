//! Scroll-axis configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a chapter is paginated inside the viewport
///
/// Fixed per reading session. Selects which of width/height is the
/// paginating axis and whether the surface snaps to pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollAxisMode {
    /// Continuous vertical scrolling, pages stacked top to bottom
    #[default]
    Vertical,
    /// Chapter laid out in columns, pages side by side
    Horizontal,
    /// Chapters side by side, content inside a chapter scrolls vertically
    HorizontalWithVerticalContent,
}

impl ScrollAxisMode {
    /// Pick the value that belongs to this mode
    pub fn select<T>(self, vertical: T, horizontal: T, horizontal_with_vertical_content: T) -> T {
        match self {
            ScrollAxisMode::Vertical => vertical,
            ScrollAxisMode::Horizontal => horizontal,
            ScrollAxisMode::HorizontalWithVerticalContent => horizontal_with_vertical_content,
        }
    }

    /// Whether pages run along the x axis
    pub fn paginates_horizontally(self) -> bool {
        self == ScrollAxisMode::Horizontal
    }
}

impl fmt::Display for ScrollAxisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrollAxisMode::Vertical => "vertical",
            ScrollAxisMode::Horizontal => "horizontal",
            ScrollAxisMode::HorizontalWithVerticalContent => "horizontal-with-vertical-content",
        };
        f.write_str(name)
    }
}

/// Error for unknown scroll-axis names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown scroll direction: {0}")]
pub struct ParseScrollAxisError(pub String);

impl FromStr for ScrollAxisMode {
    type Err = ParseScrollAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vertical" | "default-vertical" => Ok(ScrollAxisMode::Vertical),
            "horizontal" => Ok(ScrollAxisMode::Horizontal),
            "horizontal-with-vertical-content" => Ok(ScrollAxisMode::HorizontalWithVerticalContent),
            other => Err(ParseScrollAxisError(other.to_string())),
        }
    }
}
