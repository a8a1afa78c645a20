//! Highlight injection into chapter HTML
//!
//! Each stored highlight is re-anchored by searching for its locator
//! (`content_pre + content + content_post`) as a literal string and
//! wrapping the `content` part in `<highlight>` markup. Records are
//! applied in the order given, each against the output of the previous
//! ones, so callers pass them in creation order.

use lol_html::{element, rewrite_str, RewriteStrSettings};

use super::normalize::remove_sentence_spam;
use super::types::HighlightRecord;
use crate::pagination::ScrollAxisMode;
use crate::surface::scripts;

/// Configuration for highlight markup
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Element name wrapping highlighted text
    pub tag_name: String,
    /// Click handler for plain highlights
    pub click_handler: String,
    /// Click handler for highlights carrying a note
    pub note_click_handler: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            tag_name: "highlight".to_string(),
            click_handler: "callHighlightURL(this);".to_string(),
            note_click_handler: "callHighlightWithNoteURL(this);".to_string(),
        }
    }
}

/// Result of highlight injection
#[derive(Debug)]
pub struct InjectionResult {
    /// The processed HTML with highlight markup
    pub html: String,
    /// Number of highlights successfully injected
    pub injected_count: usize,
    /// Highlights whose locator was not found or that were malformed
    pub skipped: Vec<String>,
}

/// Inject highlight markup into HTML content.
///
/// Highlights that cannot be anchored are skipped and reported in
/// `skipped`; the text around them is left untouched.
pub fn inject_highlights(
    html: &str,
    highlights: &[HighlightRecord],
    config: &HighlightConfig,
) -> InjectionResult {
    let mut output = html.to_string();
    let mut injected_count = 0;
    let mut skipped = Vec::new();

    for highlight in highlights {
        if !highlight.is_well_formed() {
            tracing::warn!(highlight_id = %highlight.id, "Skipping malformed highlight record");
            skipped.push(highlight.id.clone());
            continue;
        }

        let pre = remove_sentence_spam(&highlight.content_pre);
        let content = remove_sentence_spam(&highlight.content);
        let post = remove_sentence_spam(&highlight.content_post);
        if content.is_empty() {
            tracing::warn!(highlight_id = %highlight.id, "Skipping highlight with no text");
            skipped.push(highlight.id.clone());
            continue;
        }
        let locator = format!("{}{}{}", pre, content, post);

        match output.find(&locator) {
            Some(pos) => {
                let start = pos + pre.len();
                let end = start + content.len();
                let tag = format_highlight_tag(highlight, &content, config);
                output.replace_range(start..end, &tag);
                injected_count += 1;
            }
            None => {
                tracing::warn!(highlight_id = %highlight.id, "Highlight range not found");
                skipped.push(highlight.id.clone());
            }
        }
    }

    InjectionResult {
        html: output,
        injected_count,
        skipped,
    }
}

/// Format the markup wrapping a highlight's text
pub fn format_highlight_tag(highlight: &HighlightRecord, text: &str, config: &HighlightConfig) -> String {
    let handler = if highlight.has_note() {
        &config.note_click_handler
    } else {
        &config.click_handler
    };

    format!(
        "<{tag} id=\"{id}\" onclick=\"{handler}\" class=\"{class}\">{text}</{tag}>",
        tag = config.tag_name,
        id = html_escape::encode_double_quoted_attribute(&highlight.id),
        handler = handler,
        class = highlight.style.class_name(),
        text = text,
    )
}

/// Errors during document preparation
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

/// Size the `#page` container for the active axis mode before loading
pub fn prepare_document(html: &str, mode: ScrollAxisMode) -> Result<String, InjectError> {
    let height = scripts::page_height(mode);

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("#page", move |el| {
                let style = match el.get_attribute("style") {
                    Some(existing) if !existing.trim().is_empty() => {
                        format!("{}; height: {}", existing.trim().trim_end_matches(';'), height)
                    }
                    _ => format!("height: {}", height),
                };
                el.set_attribute("style", &style)?;
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| InjectError::RewriteError(e.to_string()))?;

    Ok(result)
}
