//! Scripts evaluated against the rendering surface
//!
//! String arguments are encoded as JSON string literals, which are valid
//! script literals whatever quotes or backslashes the value contains.

use serde_json::Value;

use crate::config::ClassBasedOnClickListener;
use crate::geometry::Point;
use crate::pagination::ScrollAxisMode;

/// Document readiness probe
pub const READY_STATE: &str = "document.readyState";

/// Six-field metrics query, see `geometry::DIMENSIONS_SCRIPT`
pub const CONTENT_DIMENSIONS: &str = "getContentDimensions()";

pub const GET_HTML: &str = "getHTML()";
pub const GET_SELECTED_TEXT: &str = "getSelectedText()";
pub const GET_HIGHLIGHT_ID: &str = "getHighlightId()";
pub const GET_HIGHLIGHT_CONTENT: &str = "getHighlightContent()";
pub const REMOVE_THIS_HIGHLIGHT: &str = "removeThisHighlight()";
pub const WRAP_SENTENCES: &str = "wrappingSentencesWithinPTags()";

fn literal(value: &str) -> String {
    Value::from(value).to_string()
}

fn number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "0".to_string()
    }
}

/// Scroll the document to a point
pub fn scroll_to(point: Point) -> String {
    format!("scrollTo({}, {})", number(point.x), number(point.y))
}

/// Offset of an `#anchor` element along the paginating axis
pub fn anchor_offset(anchor: &str, horizontal: bool) -> String {
    format!("getAnchorOffset({}, {})", literal(anchor), horizontal)
}

/// Mark the element currently being narrated
pub fn audio_mark_id(playback_active_class: &str, identifier: &str) -> String {
    format!(
        "audioMarkID({}, {})",
        literal(playback_active_class),
        literal(identifier)
    )
}

/// Register a class-based click listener in the document
pub fn add_click_listener(listener: &ClassBasedOnClickListener) -> String {
    format!(
        "addClassBasedOnClickListener({}, {}, {}, {})",
        literal(&listener.scheme_name),
        literal(&listener.query_selector),
        literal(&listener.attribute_name),
        literal(&listener.select_all.to_string())
    )
}

/// Wrap the current selection in highlight markup with the given class
pub fn highlight_string(style_class: &str) -> String {
    format!("highlightString({})", literal(style_class))
}

/// Wrap the current selection in highlight markup that opens a note
pub fn highlight_string_with_note(style_class: &str) -> String {
    format!("highlightStringWithNote({})", literal(style_class))
}

/// Restyle the selected highlight; resolves to its id
pub fn set_highlight_style(style_class: &str) -> String {
    format!("setHighlightStyle({})", literal(style_class))
}

/// Height of the `#page` container for an axis mode
pub fn page_height(mode: ScrollAxisMode) -> &'static str {
    mode.select("auto", "100vh", "auto")
}

/// Re-apply the `#page` container height after a mode change
pub fn set_page_height(mode: ScrollAxisMode) -> String {
    format!(
        "document.getElementById(\"page\").style.height = {}",
        literal(page_height(mode))
    )
}
