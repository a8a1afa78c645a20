//! Callbacks from a page to the reader container

use crate::geometry::{Point, Rect};
use crate::highlights::HighlightRecord;
use crate::menu::MenuItem;

/// What the container does on a page's behalf.
///
/// Presentation lives outside the core; the page only decides when.
pub trait ReaderHost: Send + Sync {
    /// Show the selection menu anchored at `rect` (zero: keep the current anchor)
    fn show_menu(&self, rect: Rect, items: &[MenuItem]);

    fn hide_menu(&self);

    /// Start narration of `fragment_id` in the chapter at `chapter_href`
    fn play_audio(&self, chapter_href: &str, fragment_id: &str);

    /// Zero-based index of the chapter with `href`, if the book has one
    fn page_for_href(&self, href: &str) -> Option<usize>;

    fn change_chapter(&self, href: &str);

    /// Open a web link the user tapped
    fn open_external(&self, url: &str);

    /// Hand a URL to the system opener. Returns false when nothing can open it.
    fn open_with_system(&self, url: &str) -> bool;

    fn class_clicked(&self, scheme: &str, content: Option<&str>, point: Point);

    /// Let the user write or edit the note of `record`
    fn present_note_editor(&self, record: &HighlightRecord, editing: bool);
}
