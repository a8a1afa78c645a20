//! Text normalization shared by injection and matching
//!
//! Narration wraps every sentence in `<span class="sentence">` after the
//! chapter loads, so text read back from the surface carries markup the
//! stored chapter never had. Both stored context and locators go through
//! the same filter.

const SENTENCE_OPEN: &str = "<span class=\"sentence\">";
const SPAN_CLOSE: &str = "</span>";

/// Remove narration sentence wrappers from `text`
pub fn remove_sentence_spam(text: &str) -> String {
    text.replace(SENTENCE_OPEN, "").replace(SPAN_CLOSE, "")
}

/// Text after the last tag close (`>`), i.e. the text node a prefix ends in
pub fn after_last_tag(text: &str) -> &str {
    match text.rfind('>') {
        Some(pos) => &text[pos + 1..],
        None => text,
    }
}

/// Text before the first tag open (`<`), i.e. the text node a suffix starts in
pub fn before_first_tag(text: &str) -> &str {
    match text.find('<') {
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// The last `count` characters of `text`
pub fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((pos, _)) => &text[pos..],
        None => text,
    }
}

/// The first `count` characters of `text`
pub fn head_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((pos, _)) => &text[..pos],
        None => text,
    }
}

/// Byte index of character offset `offset`, if it lies within `text`
pub fn byte_index(text: &str, offset: usize) -> Option<usize> {
    if offset == text.chars().count() {
        return Some(text.len());
    }
    text.char_indices().nth(offset).map(|(pos, _)| pos)
}
