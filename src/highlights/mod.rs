//! Highlight anchoring and injection
//!
//! - `inject_highlights`: re-anchor stored highlights in chapter HTML and
//!   wrap them in `<highlight>` markup before the chapter is loaded
//! - `match_selection` / `match_highlight`: build a record, with the
//!   context needed to re-anchor it later, from a user selection
//! - `HighlightStore`: persistence contract, with a SQLite implementation

mod injector;
mod matcher;
mod normalize;
mod store;
mod types;

pub use injector::{
    format_highlight_tag, inject_highlights, prepare_document, HighlightConfig, InjectError, InjectionResult,
};
pub use matcher::{match_highlight, match_selection, MatchingHighlight, CONTEXT_WINDOW};
pub use normalize::remove_sentence_spam;
pub use store::{HighlightStore, SqliteHighlightStore};
pub use types::{HighlightRecord, HighlightStyle};
