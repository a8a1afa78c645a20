//! Building highlight records from user selections
//!
//! Two entry points:
//! - `match_selection`: character offsets of a selection in the surface text
//! - `match_highlight`: markup the surface already wrapped around the
//!   selection (`<highlight id="…" …>`), as returned by `getHTML()`
//!
//! Both capture up to `CONTEXT_WINDOW` characters of context on each side,
//! clipped to the enclosing text node, so the locator stays a literal
//! substring of the chapter.

use regex::Regex;

use super::normalize::{after_last_tag, before_first_tag, byte_index, head_chars, remove_sentence_spam, tail_chars};
use super::types::{HighlightRecord, HighlightStyle};

/// Characters of context captured on each side of a selection
pub const CONTEXT_WINDOW: usize = 30;

/// A selection reported by the rendering surface
#[derive(Debug, Clone)]
pub struct MatchingHighlight<'a> {
    /// Full current text (HTML) of the surface
    pub text: &'a str,
    /// Identifier issued for the new highlight
    pub id: &'a str,
    pub book_id: &'a str,
    pub page: i64,
    /// Selection offsets as reported by the surface script
    pub start_offset: Option<i64>,
    pub end_offset: Option<i64>,
}

/// Recover a record from highlight markup already present in `text`
pub fn match_highlight(matching: &MatchingHighlight<'_>) -> Option<HighlightRecord> {
    let pattern = format!(
        r#"(?s)<highlight id="{}" onclick=".*?" class="(.*?)">(.*?)</highlight>"#,
        regex::escape(matching.id)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(highlight_id = %matching.id, error = %e, "Invalid highlight pattern");
            return None;
        }
    };

    let captures = re.captures(matching.text)?;
    let whole = captures.get(0)?;
    let class = captures.get(1)?.as_str();
    let content = remove_sentence_spam(captures.get(2)?.as_str());

    let pre_window = tail_chars(&matching.text[..whole.start()], CONTEXT_WINDOW);
    let post_window = head_chars(&matching.text[whole.end()..], CONTEXT_WINDOW);
    let content_pre = remove_sentence_spam(after_last_tag(pre_window));
    let content_post = remove_sentence_spam(before_first_tag(post_window));

    let mut record = HighlightRecord::with_id(
        matching.id,
        matching.book_id,
        matching.page,
        &content_pre,
        &content,
        &content_post,
    )
    .with_style(HighlightStyle::from_class(class).unwrap_or_default());
    record.start_offset = matching.start_offset;
    record.end_offset = matching.end_offset;

    Some(record)
}

/// Build a record for the characters `start..end` of `text`.
///
/// Returns `None` for empty or out-of-range selections.
pub fn match_selection(
    text: &str,
    start: usize,
    end: usize,
    id: &str,
    book_id: &str,
    page: i64,
) -> Option<HighlightRecord> {
    if start >= end {
        return None;
    }

    let start_byte = byte_index(text, start)?;
    let end_byte = byte_index(text, end)?;

    let content = &text[start_byte..end_byte];
    let content_pre = after_last_tag(tail_chars(&text[..start_byte], CONTEXT_WINDOW));
    let content_post = before_first_tag(head_chars(&text[end_byte..], CONTEXT_WINDOW));

    let mut record = HighlightRecord::with_id(id, book_id, page, content_pre, content, content_post);
    record.start_offset = Some(start as i64);
    record.end_offset = Some(end as i64);

    Some(record)
}
