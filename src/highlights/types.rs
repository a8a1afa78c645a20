//! Highlight record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visual style of a highlight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Underline,
    /// Highlight created together with a note
    Note,
}

impl HighlightStyle {
    /// The styles offered in the colors menu
    pub const PALETTE: [HighlightStyle; 5] = [
        HighlightStyle::Yellow,
        HighlightStyle::Green,
        HighlightStyle::Blue,
        HighlightStyle::Pink,
        HighlightStyle::Underline,
    ];

    /// CSS class applied to the highlight markup
    pub fn class_name(self) -> &'static str {
        match self {
            HighlightStyle::Yellow => "highlight-yellow",
            HighlightStyle::Green => "highlight-green",
            HighlightStyle::Blue => "highlight-blue",
            HighlightStyle::Pink => "highlight-pink",
            HighlightStyle::Underline => "highlight-underline",
            HighlightStyle::Note => "highlight-note",
        }
    }

    /// Style for a CSS class found in rendered markup
    pub fn from_class(class: &str) -> Option<Self> {
        match class.trim() {
            "highlight-yellow" => Some(HighlightStyle::Yellow),
            "highlight-green" => Some(HighlightStyle::Green),
            "highlight-blue" => Some(HighlightStyle::Blue),
            "highlight-pink" => Some(HighlightStyle::Pink),
            "highlight-underline" => Some(HighlightStyle::Underline),
            "highlight-note" => Some(HighlightStyle::Note),
            _ => None,
        }
    }

    /// Integer code used in storage
    pub fn code(self) -> i64 {
        match self {
            HighlightStyle::Yellow => 0,
            HighlightStyle::Green => 1,
            HighlightStyle::Blue => 2,
            HighlightStyle::Pink => 3,
            HighlightStyle::Underline => 4,
            HighlightStyle::Note => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(HighlightStyle::Yellow),
            1 => Some(HighlightStyle::Green),
            2 => Some(HighlightStyle::Blue),
            3 => Some(HighlightStyle::Pink),
            4 => Some(HighlightStyle::Underline),
            5 => Some(HighlightStyle::Note),
            _ => None,
        }
    }
}

/// A persisted highlight
///
/// `content_pre + content + content_post` was a literal substring of the
/// chapter text when the highlight was created; it is the locator used to
/// find `content` again on later renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    pub id: String,
    pub book_id: String,
    /// Chapter page the highlight belongs to (1-indexed)
    pub page: i64,
    pub content: String,
    pub content_pre: String,
    pub content_post: String,
    pub style: HighlightStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Selection offsets reported by the surface at creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HighlightRecord {
    /// Create a record with a fresh id
    pub fn new(book_id: &str, page: i64, content_pre: &str, content: &str, content_post: &str) -> Self {
        Self::with_id(&Uuid::new_v4().to_string(), book_id, page, content_pre, content, content_post)
    }

    /// Create a record with an id issued elsewhere (e.g. by the surface script)
    pub fn with_id(
        id: &str,
        book_id: &str,
        page: i64,
        content_pre: &str,
        content: &str,
        content_post: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            book_id: book_id.to_string(),
            page,
            content: content.to_string(),
            content_pre: content_pre.to_string(),
            content_post: content_post.to_string(),
            style: HighlightStyle::default(),
            note: None,
            start_offset: None,
            end_offset: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_style(mut self, style: HighlightStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// The text searched for when re-anchoring this highlight
    pub fn locator(&self) -> String {
        format!("{}{}{}", self.content_pre, self.content, self.content_post)
    }

    pub fn has_note(&self) -> bool {
        self.note.is_some()
    }

    /// Records without an id or highlighted text cannot be anchored
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && !self.content.is_empty()
    }
}
