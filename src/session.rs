//! Reader session shared by every page of an open book
//!
//! Owned by the container and handed to pages as `Arc<SessionContext>`.
//! Mutations are broadcast as `SessionEvent`s so live pages can re-apply
//! their layout.

use std::path::Path;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::ReaderConfig;
use crate::highlights::HighlightStyle;
use crate::pagination::ScrollAxisMode;

const EVENT_CAPACITY: usize = 64;

/// Class the narration script puts on the fragment being read aloud
pub const DEFAULT_PLAYBACK_ACTIVE_CLASS: &str = "epub-media-overlay-playing";

/// The book currently open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookContext {
    /// File name without extension
    pub book_id: String,
    pub has_audio: bool,
    pub playback_active_class: String,
    /// Directory that chapter hrefs are relative to: the package document's
    /// directory, or the book name when the package sits at the root
    pub resource_base: String,
}

impl BookContext {
    pub fn from_file_name(file_name: &str) -> Self {
        let book_id = Path::new(file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        Self {
            resource_base: book_id.clone(),
            book_id,
            has_audio: false,
            playback_active_class: DEFAULT_PLAYBACK_ACTIVE_CLASS.to_string(),
        }
    }

    pub fn with_audio(mut self, playback_active_class: Option<&str>) -> Self {
        self.has_audio = true;
        if let Some(class) = playback_active_class.filter(|c| !c.is_empty()) {
            self.playback_active_class = class.to_string();
        }
        self
    }

    /// Use the package document's directory as resource base
    pub fn with_package_dir(mut self, dir: &str) -> Self {
        let dir = dir.trim_matches('/');
        if !dir.is_empty() {
            self.resource_base = dir.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SessionEvent {
    ScrollDirectionChanged(ScrollAxisMode),
    HighlightStyleChanged(HighlightStyle),
    NightModeChanged(bool),
    BookOpened(String),
    PageChanged(usize),
}

pub struct SessionContext {
    config: RwLock<ReaderConfig>,
    book: RwLock<Option<BookContext>>,
    highlight_style: RwLock<HighlightStyle>,
    night_mode: RwLock<bool>,
    current_page: RwLock<usize>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(config: ReaderConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config: RwLock::new(config),
            book: RwLock::new(None),
            highlight_style: RwLock::new(HighlightStyle::default()),
            night_mode: RwLock::new(false),
            current_page: RwLock::new(0),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> ReaderConfig {
        self.config.read().clone()
    }

    pub fn scroll_direction(&self) -> ScrollAxisMode {
        self.config.read().scroll_direction
    }

    pub fn set_scroll_direction(&self, mode: ScrollAxisMode) {
        {
            let mut config = self.config.write();
            if config.scroll_direction == mode {
                return;
            }
            config.scroll_direction = mode;
        }
        tracing::info!(mode = %mode, "Scroll direction changed");
        self.publish(SessionEvent::ScrollDirectionChanged(mode));
    }

    pub fn book(&self) -> Option<BookContext> {
        self.book.read().clone()
    }

    pub fn book_id(&self) -> Option<String> {
        self.book.read().as_ref().map(|book| book.book_id.clone())
    }

    pub fn open_book(&self, book: BookContext) {
        let book_id = book.book_id.clone();
        *self.book.write() = Some(book);
        *self.current_page.write() = 0;
        tracing::info!(book_id = %book_id, "Book opened");
        self.publish(SessionEvent::BookOpened(book_id));
    }

    /// Book has audio, or text-to-speech is on
    pub fn narration_available(&self) -> bool {
        let has_audio = self.book.read().as_ref().is_some_and(|book| book.has_audio);
        has_audio || self.config.read().enable_tts
    }

    pub fn highlight_style(&self) -> HighlightStyle {
        *self.highlight_style.read()
    }

    pub fn set_highlight_style(&self, style: HighlightStyle) {
        let changed = {
            let mut current = self.highlight_style.write();
            std::mem::replace(&mut *current, style) != style
        };
        if changed {
            self.publish(SessionEvent::HighlightStyleChanged(style));
        }
    }

    pub fn night_mode(&self) -> bool {
        *self.night_mode.read()
    }

    pub fn set_night_mode(&self, enabled: bool) {
        let changed = std::mem::replace(&mut *self.night_mode.write(), enabled) != enabled;
        if changed {
            self.publish(SessionEvent::NightModeChanged(enabled));
        }
    }

    pub fn current_page(&self) -> usize {
        *self.current_page.read()
    }

    pub fn set_current_page(&self, page: usize) {
        let changed = std::mem::replace(&mut *self.current_page.write(), page) != page;
        if changed {
            self.publish(SessionEvent::PageChanged(page));
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No live pages is fine
        if self.events.send(event).is_err() {
            tracing::trace!("Session event dropped, no subscribers");
        }
    }
}
