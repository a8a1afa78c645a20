//! Raw scroll metrics reported by the rendering surface

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pagination::ScrollAxisMode;

/// Script installed into every document at document start.
///
/// `getContentDimensions()` is the contract between the engine and the
/// rendering surface; field names must not change.
pub const DIMENSIONS_SCRIPT: &str = r#"
function getContentDimensions() {
    let sWidth = document.documentElement.scrollWidth
    let sHeight = document.documentElement.scrollHeight
    let sLeft = window.pageXOffset
    let sTop = window.pageYOffset
    let vWidth = document.documentElement.clientWidth
    let vHeight = document.documentElement.clientHeight

    return { scrollWidth : sWidth, scrollHeight: sHeight, scrollLeft : sLeft, scrollTop : sTop, viewportWidth: vWidth, viewportHeight: vHeight }
}
"#;

/// Snapshot of the document's scroll metrics
///
/// Recomputed every time the surface content changes; never cached across
/// loads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentDimensions {
    pub content_width: f64,
    pub content_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl ContentDimensions {
    /// Parse the object returned by `getContentDimensions()`.
    ///
    /// Returns `None` when any of the six fields is missing or not a number.
    pub fn from_script_result(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |name: &str| object.get(name).and_then(Value::as_f64);

        Some(Self {
            content_width: field("scrollWidth")?,
            content_height: field("scrollHeight")?,
            viewport_width: field("viewportWidth")?,
            viewport_height: field("viewportHeight")?,
            scroll_left: field("scrollLeft")?,
            scroll_top: field("scrollTop")?,
        })
    }

    /// Viewport extent along the paginating axis
    pub fn page_extent(&self, mode: ScrollAxisMode) -> f64 {
        mode.select(self.viewport_height, self.viewport_width, self.viewport_height)
    }

    /// Content extent along the paginating axis
    pub fn total_content_extent(&self, mode: ScrollAxisMode) -> f64 {
        mode.select(self.content_height, self.content_width, self.content_height)
    }

    /// Current scroll position along the paginating axis
    pub fn scroll_offset(&self, mode: ScrollAxisMode) -> f64 {
        mode.select(self.scroll_top, self.scroll_left, self.scroll_top)
    }

    /// Whether the surface has laid out anything measurable yet
    pub fn is_laid_out(&self, mode: ScrollAxisMode) -> bool {
        self.page_extent(mode) > 0.0 && self.total_content_extent(mode) > 0.0
    }
}
