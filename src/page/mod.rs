//! Reader page controller
//!
//! A `ReaderPage` drives one chapter page: it loads the chapter with its
//! stored highlights injected, answers navigation requests from the
//! document, runs the highlight menu actions and converts between pages
//! and scroll offsets.
//!
//! Pages are pooled by the container. `setup` attaches a page to a
//! rendering surface, `recycle` detaches it; completions of queries issued
//! before a recycle are discarded. Operations on a detached page do nothing
//! and return `ReaderError::Detached` or a zero sentinel.

mod host;
mod selection;

pub use host::ReaderHost;
pub use selection::SelectionReport;

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::{ReaderError, Result};
use crate::geometry::{ContentDimensions, DimensionsProvider, Rect};
use crate::highlights::{
    inject_highlights, match_highlight, prepare_document, HighlightConfig, HighlightRecord, HighlightStore,
    HighlightStyle, InjectionResult, MatchingHighlight,
};
use crate::menu::{is_one_word, menu_items, HighlightInteraction, MenuMode, MenuOptions};
use crate::navigation::{classify, resolve_internal_href, NavigationAction, NavigationPolicy, NavigationRequest};
use crate::pagination::{
    frame_extent, last_page_filler, should_scroll_to_anchor, viewport_frame, ChromeInsets, Paginator, ScrollAxisMode,
    ScrollBehavior,
};
use crate::session::{SessionContext, SessionEvent, DEFAULT_PLAYBACK_ACTIVE_CLASS};
use crate::surface::{evaluate_guarded, scripts, CompletionGuard, PageGeneration, QueryError, ReadyQuery, RenderingSurface};

/// Where the page cell sits on screen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageLayout {
    pub bounds: Rect,
    pub chrome: ChromeInsets,
}

pub struct ReaderPage {
    session: Arc<SessionContext>,
    store: Arc<dyn HighlightStore>,
    host: Arc<dyn ReaderHost>,
    surface: RwLock<Option<Arc<dyn RenderingSurface>>>,
    generation: PageGeneration,
    /// Bumped on every attach and recycle; session listeners stop on change
    lifecycle: watch::Sender<u64>,
    page_number: RwLock<usize>,
    chapter_href: RwLock<Option<String>>,
    layout: RwLock<PageLayout>,
    interaction: Mutex<HighlightInteraction>,
    highlight_config: HighlightConfig,
}

impl ReaderPage {
    pub fn new(session: Arc<SessionContext>, store: Arc<dyn HighlightStore>, host: Arc<dyn ReaderHost>) -> Self {
        let generation = PageGeneration::new();
        let (lifecycle, _) = watch::channel(generation.current());

        Self {
            session,
            store,
            host,
            surface: RwLock::new(None),
            generation,
            lifecycle,
            page_number: RwLock::new(0),
            chapter_href: RwLock::new(None),
            layout: RwLock::new(PageLayout::default()),
            interaction: Mutex::new(HighlightInteraction::new()),
            highlight_config: HighlightConfig::default(),
        }
    }

    /// Attach to `surface` as page `page_number` (1-indexed) of the book
    pub fn setup(&self, surface: Arc<dyn RenderingSurface>, page_number: usize, chapter_href: Option<&str>) {
        let generation = self.generation.advance();
        self.lifecycle.send_replace(generation);

        surface.apply_scroll_behavior(ScrollBehavior::for_mode(self.mode()));

        *self.surface.write() = Some(surface);
        *self.page_number.write() = page_number;
        *self.chapter_href.write() = chapter_href.map(str::to_string);
        *self.interaction.lock() = HighlightInteraction::new();

        tracing::debug!(page = page_number, generation, "Page attached");
    }

    /// Detach from the surface and drop every outstanding completion
    pub fn recycle(&self) {
        let generation = self.generation.advance();
        self.lifecycle.send_replace(generation);

        let was_attached = self.surface.write().take().is_some();
        *self.interaction.lock() = HighlightInteraction::new();

        if was_attached {
            tracing::debug!(page = self.page_number(), generation, "Page recycled");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.surface.read().is_some()
    }

    pub fn page_number(&self) -> usize {
        *self.page_number.read()
    }

    pub fn set_layout(&self, bounds: Rect, chrome: ChromeInsets) {
        *self.layout.write() = PageLayout { bounds, chrome };
    }

    pub fn interaction(&self) -> HighlightInteraction {
        self.interaction.lock().clone()
    }

    fn mode(&self) -> ScrollAxisMode {
        self.session.scroll_direction()
    }

    fn paginator(&self) -> Paginator {
        Paginator::new(self.mode())
    }

    fn attached(&self) -> Result<(Arc<dyn RenderingSurface>, CompletionGuard)> {
        let surface = self.surface.read().clone().ok_or(ReaderError::Detached)?;
        Ok((surface, self.generation.guard()))
    }

    /// Readiness check, then `script`
    async fn run_ready(&self, script: &str) -> Result<Value> {
        let (surface, guard) = self.attached()?;
        let mut query = ReadyQuery::new(surface.as_ref(), guard);
        Ok(query.run(script).await?)
    }

    async fn run_script(&self, script: &str) -> Result<Value> {
        let (surface, guard) = self.attached()?;
        Ok(evaluate_guarded(surface.as_ref(), &guard, script).await?)
    }

    // Loading

    /// Inject this page's highlights into `html`, size `#page` for the
    /// current mode and hand the result to the surface.
    pub async fn load_html(&self, html: &str, base_url: Option<&str>) -> Result<InjectionResult> {
        let (surface, guard) = self.attached()?;
        let page = self.page_number() as i64;

        let records = match self.session.book_id() {
            Some(book_id) => self.store.all_by_book(&book_id, Some(page)).await?,
            None => Vec::new(),
        };
        guard.check()?;

        let mut result = inject_highlights(html, &records, &self.highlight_config);
        result.html = prepare_document(&result.html, self.mode())?;

        surface.load_document(&result.html, base_url).await?;
        guard.check()?;

        tracing::info!(
            page,
            injected = result.injected_count,
            skipped = result.skipped.len(),
            "Chapter loaded"
        );
        Ok(result)
    }

    /// Finish setting up a loaded document.
    ///
    /// Registers click listeners, re-applies the page mode, wraps sentences
    /// for text-to-speech when the book has no audio, sizes `#page` and
    /// optionally scrolls to the last page (paging backwards). A step whose
    /// query is unavailable is skipped; the rest still run.
    pub async fn did_finish_load(&self, scroll_to_bottom: bool) -> Result<()> {
        let config = self.session.config();
        let mode = config.scroll_direction;

        for listener in &config.class_based_on_click_listeners {
            let registered = self.run_script(&scripts::add_click_listener(listener)).await;
            self.settle_step("click listener", registered)?;
        }

        let refreshed = self.refresh_page_mode().await;
        self.settle_step("page mode", refreshed)?;

        let has_audio = self.session.book().is_some_and(|book| book.has_audio);
        if config.enable_tts && !has_audio {
            let wrapped = self.run_script(scripts::WRAP_SENTENCES).await;
            self.settle_step("sentence wrapping", wrapped)?;
        }

        let sized = self.run_script(&scripts::set_page_height(mode)).await;
        self.settle_step("page height", sized)?;

        let ready_state = self.run_script(scripts::READY_STATE).await;
        if let Some(ready_state) = self.settle_step("readiness", ready_state)? {
            tracing::debug!(page = self.page_number(), ready_state = %ready_state, "Page ready");
        }

        if scroll_to_bottom && mode != ScrollAxisMode::HorizontalWithVerticalContent {
            let scrolled = self.scroll_page_to_bottom().await;
            self.settle_step("scroll to bottom", scrolled)?;
        }

        *self.interaction.lock() = HighlightInteraction::new();
        Ok(())
    }

    /// Outcome of one independent load step.
    ///
    /// Stale completions, detached pages and store or document failures end
    /// the sequence; any other failure only skips the step.
    fn settle_step<T>(&self, step: &'static str, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_stale() || !e.is_recoverable() || matches!(e, ReaderError::Detached) => Err(e),
            Err(e) => {
                tracing::warn!(page = self.page_number(), step, error = %e, "Load step skipped");
                Ok(None)
            }
        }
    }

    // Geometry and pagination

    pub async fn content_dimensions(&self) -> Result<ContentDimensions> {
        let (surface, guard) = self.attached()?;
        Ok(DimensionsProvider::new(surface.as_ref()).query(guard).await?)
    }

    /// Pages in the chapter; 0 when unavailable
    pub async fn page_count(&self) -> usize {
        match self.content_dimensions().await {
            Ok(dims) => self.paginator().page_count(&dims),
            Err(e) => {
                tracing::debug!(error = %e, "Page count unavailable");
                0
            }
        }
    }

    /// Page under the current scroll offset; 0 when unavailable
    pub async fn current_page_number(&self) -> usize {
        match self.content_dimensions().await {
            Ok(dims) => self.paginator().current_page_number(&dims),
            Err(e) => {
                tracing::debug!(error = %e, "Current page unavailable");
                0
            }
        }
    }

    pub async fn scroll_page_to_offset(&self, offset: f64) -> Result<()> {
        let point = self.paginator().project(offset);
        self.run_ready(&scripts::scroll_to(point)).await?;
        Ok(())
    }

    pub async fn scroll_to_page(&self, page_number: usize) -> Result<()> {
        let dims = self.content_dimensions().await?;
        let point = self.paginator().offset_for_page_number(page_number, &dims);
        self.run_ready(&scripts::scroll_to(point)).await?;
        Ok(())
    }

    pub async fn scroll_page_to_bottom(&self) -> Result<()> {
        let dims = self.content_dimensions().await?;
        let point = self.paginator().offset_for_last_page(&dims);
        self.run_ready(&scripts::scroll_to(point)).await?;
        Ok(())
    }

    /// Scroll to an `#anchor`. Returns whether the page moved.
    pub async fn handle_anchor(&self, anchor: &str, avoid_beginning_anchors: bool) -> Result<bool> {
        let mode = self.mode();
        let script = scripts::anchor_offset(anchor, mode.paginates_horizontally());
        let reply = self.run_ready(&script).await?;

        let offset = match &reply {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or(QueryError::Malformed(script))?;

        let extent = frame_extent(self.viewport_frame(), mode);
        if !should_scroll_to_anchor(offset, extent, mode, avoid_beginning_anchors) {
            return Ok(false);
        }

        self.scroll_page_to_offset(offset).await?;
        Ok(true)
    }

    /// Mark the fragment being narrated
    pub async fn audio_mark_id(&self, identifier: &str) -> Result<()> {
        let class = self
            .session
            .book()
            .map(|book| book.playback_active_class)
            .unwrap_or_else(|| DEFAULT_PLAYBACK_ACTIVE_CLASS.to_string());

        self.run_script(&scripts::audio_mark_id(&class, identifier)).await?;
        Ok(())
    }

    /// Content frame inside the page bounds for the current mode
    pub fn viewport_frame(&self) -> Rect {
        let layout = *self.layout.read();
        let options = self.session.config().frame_options();
        viewport_frame(layout.bounds, layout.chrome, options, self.mode())
    }

    /// Re-apply paging behavior for the current mode.
    ///
    /// In night mode, returns the blank area of the last page the host
    /// should paint; otherwise a zero rect.
    pub async fn refresh_page_mode(&self) -> Result<Rect> {
        let (surface, guard) = self.attached()?;
        let mode = self.mode();
        surface.apply_scroll_behavior(ScrollBehavior::for_mode(mode));

        if !self.session.night_mode() {
            return Ok(Rect::ZERO);
        }

        let dims = DimensionsProvider::new(surface.as_ref()).query(guard).await?;
        let page_count = self.paginator().page_count(&dims);
        Ok(last_page_filler(self.viewport_frame(), page_count, dims.content_height))
    }

    // Navigation

    /// Decide whether the surface may follow an outgoing request
    pub async fn decide_policy(&self, request: NavigationRequest<'_>) -> NavigationPolicy {
        if !self.is_attached() {
            return NavigationPolicy::Cancel;
        }

        let listeners = self.session.config().class_based_on_click_listeners;
        let action = classify(request.url, request.link_activated, &listeners);
        tracing::trace!(url = %request.url, action = ?action, "Navigation request");

        match action {
            NavigationAction::ShowHighlightMenu { rect, .. } => {
                self.show_menu(rect, MenuMode::ExistingHighlight, None);
                NavigationPolicy::Cancel
            }
            NavigationAction::PlayAudio { fragment_id } => {
                let href = self.chapter_href.read().clone().unwrap_or_default();
                self.host.play_audio(&href, &fragment_id);
                NavigationPolicy::Cancel
            }
            NavigationAction::InternalLink { path, anchor } => self.follow_internal_link(&path, anchor.as_deref()).await,
            NavigationAction::Anchor { anchor } => {
                self.follow_anchor(&anchor).await;
                NavigationPolicy::Cancel
            }
            NavigationAction::ClickListener { scheme, content, point } => {
                self.host.class_clicked(&scheme, content.as_deref(), point);
                NavigationPolicy::Cancel
            }
            NavigationAction::OpenExternal { url } => {
                self.host.open_external(&url);
                NavigationPolicy::Cancel
            }
            NavigationAction::OpenWithSystem { url } => {
                if self.host.open_with_system(&url) {
                    NavigationPolicy::Cancel
                } else {
                    NavigationPolicy::Allow
                }
            }
            NavigationAction::Allow => NavigationPolicy::Allow,
            NavigationAction::Cancel => NavigationPolicy::Cancel,
        }
    }

    async fn follow_internal_link(&self, path: &str, anchor: Option<&str>) -> NavigationPolicy {
        let Some(base) = self.session.book().map(|book| book.resource_base) else {
            return NavigationPolicy::Allow;
        };
        let Some(href) = resolve_internal_href(path, &base) else {
            return NavigationPolicy::Allow;
        };

        let href_page = self.host.page_for_href(&href).unwrap_or(0) + 1;
        if href_page == self.page_number() {
            if let Some(anchor) = anchor {
                self.follow_anchor(anchor).await;
            }
        } else {
            self.host.change_chapter(&href);
        }

        NavigationPolicy::Cancel
    }

    async fn follow_anchor(&self, anchor: &str) {
        if let Err(e) = self.handle_anchor(anchor, false).await {
            tracing::debug!(anchor, error = %e, "Anchor not followed");
        }
    }

    // Highlight menu

    fn menu_options(&self, selection: Option<&str>) -> MenuOptions {
        MenuOptions {
            allow_sharing: self.session.config().allow_sharing,
            narration_available: self.session.narration_available(),
            is_one_word: selection.is_some_and(is_one_word),
        }
    }

    // The interaction lock is never held across a host callback: hosts may
    // read page state while presenting.
    fn show_menu(&self, rect: Rect, mode: MenuMode, selection: Option<&str>) {
        if !self.session.config().use_reader_menu_controller {
            tracing::trace!(mode = ?mode, "Reader menu disabled");
            return;
        }

        let options = self.menu_options(selection);
        let shown = {
            let mut interaction = self.interaction.lock();
            if mode != MenuMode::Colors {
                interaction.select();
            }
            interaction.show_menu(rect, mode)
        };

        match shown {
            Ok(anchor) => self.host.show_menu(anchor, &menu_items(mode, options)),
            Err(e) => tracing::debug!(error = %e, "Menu not shown"),
        }
    }

    fn close_menu(&self) {
        {
            self.interaction.lock().dismiss();
        }
        self.host.hide_menu();
    }

    /// Show the default menu for a plain text selection at `rect`
    pub async fn show_selection_menu(&self, rect: Rect) -> Result<()> {
        let selected = self.run_script(scripts::GET_SELECTED_TEXT).await?;
        self.show_menu(rect, MenuMode::Default, selected.as_str());
        Ok(())
    }

    /// Switch the open highlight menu to the color picker
    pub fn show_colors(&self) {
        self.show_menu(Rect::ZERO, MenuMode::Colors, None);
    }

    pub fn dismiss_menu(&self) {
        self.close_menu();
    }

    /// Wrap the selection in highlight markup with the session's current
    /// style, persist the new record and open its menu.
    pub async fn highlight_selection(&self) -> Result<HighlightRecord> {
        let style = self.session.highlight_style();
        let reply = self.run_script(&scripts::highlight_string(style.class_name())).await?;
        let report = SelectionReport::from_script_result(&reply)?;

        self.show_menu(report.rect, MenuMode::ExistingHighlight, None);

        let record = self.match_reported(&report).await?;
        self.store.insert(&record).await?;

        tracing::info!(highlight_id = %record.id, page = record.page, "Highlight created");
        Ok(record)
    }

    /// Wrap the selection and open the note editor for it.
    ///
    /// The record is stored once the note is saved with `update_note`.
    pub async fn highlight_selection_with_note(&self) -> Result<HighlightRecord> {
        let style = self.session.highlight_style();
        let reply = self
            .run_script(&scripts::highlight_string_with_note(style.class_name()))
            .await?;
        let report = SelectionReport::from_script_result(&reply)?;

        let record = self.match_reported(&report).await?;
        self.host.present_note_editor(&record, false);
        Ok(record)
    }

    async fn match_reported(&self, report: &SelectionReport) -> Result<HighlightRecord> {
        let html = self.run_script(scripts::GET_HTML).await?;
        let text = html
            .as_str()
            .ok_or_else(|| QueryError::Malformed(scripts::GET_HTML.to_string()))?;
        let book_id = self
            .session
            .book_id()
            .ok_or_else(|| ReaderError::MalformedRecord(format!("no book open for {}", report.id)))?;

        let matching = MatchingHighlight {
            text,
            id: &report.id,
            book_id: &book_id,
            page: self.page_number() as i64,
            start_offset: Some(report.start_offset),
            end_offset: Some(report.end_offset),
        };

        match_highlight(&matching).ok_or_else(|| ReaderError::LocatorNotFound(report.id.clone()))
    }

    /// Restyle the selected highlight and remember `style` for new ones.
    ///
    /// Returns the id of the restyled highlight.
    pub async fn change_highlight_style(&self, style: HighlightStyle) -> Result<Option<String>> {
        self.session.set_highlight_style(style);

        let reply = self.run_script(&scripts::set_highlight_style(style.class_name())).await;
        let updated = match reply {
            Ok(value) => value.as_str().map(str::to_string),
            Err(e) => {
                self.close_menu();
                return Err(e);
            }
        };

        if let Some(id) = &updated {
            self.store.update_style(id, style).await?;
            let changed = { self.interaction.lock().change_color(id, style) };
            if let Err(e) = changed {
                tracing::debug!(error = %e, "Style changed outside the menu");
            }
        }

        self.host.hide_menu();
        Ok(updated)
    }

    /// Remove the selected highlight from the document and the store
    pub async fn remove_highlight(&self) -> Result<Option<String>> {
        let reply = self.run_script(scripts::REMOVE_THIS_HIGHLIGHT).await?;
        let removed = reply.as_str().map(str::to_string);

        if let Some(id) = &removed {
            self.store.remove(id).await?;
            let dropped = { self.interaction.lock().remove(id) };
            if let Err(e) = dropped {
                tracing::debug!(error = %e, "Highlight removed outside the menu");
            }
            tracing::info!(highlight_id = %id, "Highlight removed");
        }

        self.host.hide_menu();
        Ok(removed)
    }

    /// The stored record of the highlight under the menu
    pub async fn selected_highlight(&self) -> Result<Option<HighlightRecord>> {
        let reply = self.run_script(scripts::GET_HIGHLIGHT_ID).await?;
        match reply.as_str() {
            Some(id) if !id.is_empty() => self.store.get_by_id(id).await,
            _ => Ok(None),
        }
    }

    /// Text of the highlight under the menu, for sharing
    pub async fn selected_highlight_text(&self) -> Result<Option<String>> {
        let reply = self.run_script(scripts::GET_HIGHLIGHT_CONTENT).await?;
        Ok(reply.as_str().map(str::to_string))
    }

    /// Open the note editor for the highlight under the menu
    pub async fn edit_selected_note(&self) -> Result<Option<HighlightRecord>> {
        let Some(record) = self.selected_highlight().await? else {
            return Ok(None);
        };

        let editing = { self.interaction.lock().edit_note(&record.id) };
        if let Err(e) = editing {
            tracing::debug!(error = %e, "Note edited outside the menu");
        }
        self.host.hide_menu();
        self.host.present_note_editor(&record, true);
        Ok(Some(record))
    }

    /// Save the note of `record`, storing the record first if it is new
    pub async fn update_note(&self, record: &HighlightRecord, note: Option<&str>) -> Result<HighlightRecord> {
        let note = note.map(str::trim).filter(|n| !n.is_empty());

        if self.store.get_by_id(&record.id).await?.is_some() {
            self.store.update_note(&record.id, note).await?;
        } else {
            let mut new_record = record.clone();
            new_record.note = note.map(str::to_string);
            self.store.insert(&new_record).await?;
        }

        self.store
            .get_by_id(&record.id)
            .await?
            .ok_or_else(|| ReaderError::MalformedRecord(record.id.clone()))
    }

    // Session

    /// Follow session changes until the page is recycled or re-attached
    pub fn spawn_session_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let page: Weak<Self> = Arc::downgrade(self);
        let mut events = self.session.subscribe();
        let mut lifecycle = self.lifecycle.subscribe();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = lifecycle.changed() => break,
                    event = events.recv() => event,
                };

                match event {
                    Ok(event) => {
                        let Some(page) = page.upgrade() else { break };
                        page.apply_session_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Page lagged behind session events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn apply_session_event(&self, event: &SessionEvent) {
        let result = match event {
            SessionEvent::ScrollDirectionChanged(mode) => {
                if let Err(e) = self.refresh_page_mode().await {
                    tracing::debug!(page = self.page_number(), error = %e, "Page mode not refreshed");
                }
                self.run_script(&scripts::set_page_height(*mode)).await.map(|_| ())
            }
            SessionEvent::NightModeChanged(_) => self.refresh_page_mode().await.map(|_| ()),
            _ => Ok(()),
        };

        if let Err(e) = result {
            tracing::debug!(page = self.page_number(), error = %e, "Session change not applied");
        }
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> PageGeneration {
        self.generation.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassBasedOnClickListener, ReaderConfig};
    use crate::geometry::Point;
    use crate::highlights::SqliteHighlightStore;
    use crate::menu::{InteractionState, MenuItem};
    use crate::session::BookContext;
    use crate::surface::testing::ScriptedSurface;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum HostCall {
        ShowMenu(Rect, Vec<MenuItem>),
        HideMenu,
        PlayAudio(String, String),
        ChangeChapter(String),
        OpenExternal(String),
        OpenWithSystem(String),
        ClassClicked(String, Option<String>, Point),
        NoteEditor(String, bool),
    }

    #[derive(Default)]
    struct RecordingHost {
        calls: Mutex<Vec<HostCall>>,
        /// Page whose interaction state is read back from menu callbacks
        page: Mutex<Weak<ReaderPage>>,
        seen: Mutex<Vec<InteractionState>>,
    }

    impl RecordingHost {
        fn calls(&self) -> Vec<HostCall> {
            self.calls.lock().clone()
        }

        fn record(&self, call: HostCall) {
            self.calls.lock().push(call);
        }

        fn read_back_from(&self, page: &Arc<ReaderPage>) {
            *self.page.lock() = Arc::downgrade(page);
        }

        fn seen(&self) -> Vec<InteractionState> {
            self.seen.lock().clone()
        }

        fn read_back_state(&self) {
            let page = self.page.lock().upgrade();
            if let Some(page) = page {
                self.seen.lock().push(page.interaction().state().clone());
            }
        }
    }

    impl ReaderHost for RecordingHost {
        fn show_menu(&self, rect: Rect, items: &[MenuItem]) {
            self.record(HostCall::ShowMenu(rect, items.to_vec()));
            self.read_back_state();
        }

        fn hide_menu(&self) {
            self.record(HostCall::HideMenu);
            self.read_back_state();
        }

        fn play_audio(&self, chapter_href: &str, fragment_id: &str) {
            self.record(HostCall::PlayAudio(chapter_href.to_string(), fragment_id.to_string()));
        }

        fn page_for_href(&self, href: &str) -> Option<usize> {
            match href {
                "text/ch1.xhtml" => Some(0),
                "text/ch2.xhtml" => Some(1),
                _ => None,
            }
        }

        fn change_chapter(&self, href: &str) {
            self.record(HostCall::ChangeChapter(href.to_string()));
        }

        fn open_external(&self, url: &str) {
            self.record(HostCall::OpenExternal(url.to_string()));
        }

        fn open_with_system(&self, url: &str) -> bool {
            self.record(HostCall::OpenWithSystem(url.to_string()));
            url.starts_with("tel:")
        }

        fn class_clicked(&self, scheme: &str, content: Option<&str>, point: Point) {
            self.record(HostCall::ClassClicked(
                scheme.to_string(),
                content.map(str::to_string),
                point,
            ));
        }

        fn present_note_editor(&self, record: &HighlightRecord, editing: bool) {
            self.record(HostCall::NoteEditor(record.id.clone(), editing));
        }
    }

    struct Fixture {
        page: Arc<ReaderPage>,
        surface: Arc<ScriptedSurface>,
        host: Arc<RecordingHost>,
        store: SqliteHighlightStore,
        session: Arc<SessionContext>,
    }

    async fn setup_page(config: ReaderConfig) -> Fixture {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteHighlightStore::from_pool(pool);
        store.init().await.unwrap();

        let session = Arc::new(SessionContext::new(config));
        session.open_book(BookContext::from_file_name("moby.epub").with_package_dir("OEBPS"));

        let host = Arc::new(RecordingHost::default());
        let surface = Arc::new(ScriptedSurface::new());
        let page = Arc::new(ReaderPage::new(session.clone(), Arc::new(store.clone()), host.clone()));
        page.set_layout(Rect::new(0.0, 0.0, 375.0, 812.0), ChromeInsets::default());
        page.setup(surface.clone(), 1, Some("text/ch1.xhtml"));

        Fixture {
            page,
            surface,
            host,
            store,
            session,
        }
    }

    const CHAPTER: &str = r#"<div id="page"><p>Call me Ishmael. Some years ago, never mind how long</p></div>"#;

    #[tokio::test]
    async fn test_load_html_injects_page_highlights() {
        let fx = setup_page(ReaderConfig::default()).await;
        let stored = HighlightRecord::with_id("h1", "moby", 1, "Call me ", "Ishmael", ". Some");
        let other_page = HighlightRecord::with_id("h2", "moby", 2, "Some ", "years", " ago");
        let gone = HighlightRecord::with_id("h3", "moby", 1, "Call ", "you", " Ishmael");
        fx.store.insert(&stored).await.unwrap();
        fx.store.insert(&other_page).await.unwrap();
        fx.store.insert(&gone).await.unwrap();

        let result = fx.page.load_html(CHAPTER, Some("file:///books/moby/OEBPS/")).await.unwrap();

        assert_eq!(result.injected_count, 1);
        assert_eq!(result.skipped, vec!["h3".to_string()]);

        let loaded = fx.surface.loaded();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].0.contains(r#"<highlight id="h1" onclick="callHighlightURL(this);" class="highlight-yellow">Ishmael</highlight>"#));
        assert!(loaded[0].0.contains("height: auto"));
        assert_eq!(loaded[0].1.as_deref(), Some("file:///books/moby/OEBPS/"));
    }

    #[tokio::test]
    async fn test_detached_page_is_a_no_op() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.page.recycle();
        assert!(!fx.page.is_attached());

        assert_eq!(fx.page.page_count().await, 0);
        assert_eq!(fx.page.current_page_number().await, 0);
        assert!(matches!(fx.page.scroll_to_page(2).await, Err(ReaderError::Detached)));
        assert!(matches!(fx.page.load_html(CHAPTER, None).await, Err(ReaderError::Detached)));
        assert_eq!(
            fx.page.decide_policy(NavigationRequest::new("highlight://1,2,3,4", false)).await,
            NavigationPolicy::Cancel
        );
        assert!(fx.host.calls().is_empty());
        assert!(fx.surface.loaded().is_empty());
    }

    #[tokio::test]
    async fn test_page_count_and_scroll_to_page() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond_dimensions(375.0, 2000.0, 375.0, 812.0);

        assert_eq!(fx.page.page_count().await, 2);
        assert_eq!(fx.page.current_page_number().await, 1);

        fx.page.scroll_to_page(2).await.unwrap();
        assert!(fx.surface.evaluated().contains(&"scrollTo(0, 812)".to_string()));
    }

    #[tokio::test]
    async fn test_stale_dimensions_are_discarded() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond_dimensions(375.0, 2000.0, 375.0, 812.0);
        fx.surface.advance_on(scripts::CONTENT_DIMENSIONS, fx.page.generation());

        let err = fx.page.content_dimensions().await.unwrap_err();
        assert!(err.is_stale());
        assert_eq!(fx.page.page_count().await, 0);
    }

    #[tokio::test]
    async fn test_highlight_tap_shows_existing_highlight_menu() {
        let fx = setup_page(ReaderConfig::default()).await;

        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("highlight://50,50,100,40", false))
            .await;

        assert_eq!(policy, NavigationPolicy::Cancel);
        let rect = Rect::new(50.0, 50.0, 100.0, 40.0);
        assert_eq!(
            fx.host.calls(),
            vec![HostCall::ShowMenu(
                rect,
                vec![MenuItem::Colors, MenuItem::EditNote, MenuItem::Remove, MenuItem::Share]
            )]
        );
        assert_eq!(
            fx.page.interaction().state(),
            &InteractionState::MenuVisible {
                rect,
                mode: MenuMode::ExistingHighlight
            }
        );
    }

    #[tokio::test]
    async fn test_host_reads_page_state_from_menu_callbacks() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.host.read_back_from(&fx.page);

        let page = fx.page.clone();
        let (done, finished) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let policy = runtime.block_on(page.decide_policy(NavigationRequest::new("highlight://1,2,3,4", false)));
            page.show_colors();
            page.dismiss_menu();
            let _ = done.send(policy);
        });

        let policy = finished.recv_timeout(Duration::from_secs(3)).unwrap();
        assert_eq!(policy, NavigationPolicy::Cancel);

        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(
            fx.host.seen(),
            vec![
                InteractionState::MenuVisible {
                    rect,
                    mode: MenuMode::ExistingHighlight
                },
                InteractionState::MenuVisible {
                    rect,
                    mode: MenuMode::Colors
                },
                InteractionState::Dismissed,
            ]
        );
    }

    #[tokio::test]
    async fn test_menu_left_to_host_when_reader_menu_disabled() {
        let fx = setup_page(ReaderConfig {
            use_reader_menu_controller: false,
            ..Default::default()
        })
        .await;

        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("highlight://50,50,100,40", false))
            .await;

        assert_eq!(policy, NavigationPolicy::Cancel);
        assert!(fx.host.calls().is_empty());
        assert_eq!(fx.page.interaction().state(), &InteractionState::Unselected);
    }

    #[tokio::test]
    async fn test_play_audio_request() {
        let fx = setup_page(ReaderConfig::default()).await;
        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("play-audio://abc123", false))
            .await;

        assert_eq!(policy, NavigationPolicy::Cancel);
        assert_eq!(
            fx.host.calls(),
            vec![HostCall::PlayAudio("text/ch1.xhtml".to_string(), "abc123".to_string())]
        );
    }

    #[tokio::test]
    async fn test_internal_links() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond(scripts::anchor_offset("sec-2", false), json!(900));

        // Same chapter: follow the anchor
        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("file:///books/moby/OEBPS/text/ch1.xhtml#sec-2", true))
            .await;
        assert_eq!(policy, NavigationPolicy::Cancel);
        assert!(fx.surface.evaluated().contains(&"scrollTo(0, 900)".to_string()));

        // Other chapter: hand off to the container
        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("file:///books/moby/OEBPS/text/ch2.xhtml", true))
            .await;
        assert_eq!(policy, NavigationPolicy::Cancel);
        assert_eq!(fx.host.calls(), vec![HostCall::ChangeChapter("text/ch2.xhtml".to_string())]);

        // Outside the book
        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("file:///elsewhere/notes.html", true))
            .await;
        assert_eq!(policy, NavigationPolicy::Allow);
    }

    #[tokio::test]
    async fn test_anchor_near_beginning_is_skipped_when_avoided() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond(scripts::anchor_offset("top", false), json!("120"));

        assert!(!fx.page.handle_anchor("top", true).await.unwrap());
        assert!(fx.page.handle_anchor("top", false).await.unwrap());
        assert!(fx.surface.evaluated().contains(&"scrollTo(0, 120)".to_string()));
    }

    #[tokio::test]
    async fn test_external_and_system_links() {
        let fx = setup_page(ReaderConfig::default()).await;

        assert_eq!(
            fx.page
                .decide_policy(NavigationRequest::new("https://example.com", true))
                .await,
            NavigationPolicy::Cancel
        );
        assert_eq!(
            fx.page.decide_policy(NavigationRequest::new("tel:555", false)).await,
            NavigationPolicy::Cancel
        );
        assert_eq!(
            fx.page
                .decide_policy(NavigationRequest::new("custom://thing", false))
                .await,
            NavigationPolicy::Allow
        );
        assert_eq!(
            fx.host.calls(),
            vec![
                HostCall::OpenExternal("https://example.com".to_string()),
                HostCall::OpenWithSystem("tel:555".to_string()),
                HostCall::OpenWithSystem("custom://thing".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_click_listener_request() {
        let config = ReaderConfig {
            class_based_on_click_listeners: vec![ClassBasedOnClickListener {
                scheme_name: "footnote".to_string(),
                query_selector: ".footnote".to_string(),
                attribute_name: "data-ref".to_string(),
                select_all: false,
            }],
            ..Default::default()
        };
        let fx = setup_page(config).await;

        let policy = fx
            .page
            .decide_policy(NavigationRequest::new("footnote://n1/clientX=10&clientY=20", false))
            .await;
        assert_eq!(policy, NavigationPolicy::Cancel);
        assert_eq!(
            fx.host.calls(),
            vec![HostCall::ClassClicked(
                "footnote".to_string(),
                Some("n1".to_string()),
                Point::new(10.0, 20.0)
            )]
        );
    }

    #[tokio::test]
    async fn test_did_finish_load_sequence() {
        let listener = ClassBasedOnClickListener {
            scheme_name: "footnote".to_string(),
            query_selector: ".footnote".to_string(),
            attribute_name: "data-ref".to_string(),
            select_all: true,
        };
        let config = ReaderConfig {
            enable_tts: true,
            class_based_on_click_listeners: vec![listener.clone()],
            ..Default::default()
        };
        let fx = setup_page(config).await;

        fx.page.did_finish_load(false).await.unwrap();

        assert_eq!(
            fx.surface.evaluated(),
            vec![
                scripts::add_click_listener(&listener),
                scripts::WRAP_SENTENCES.to_string(),
                scripts::set_page_height(ScrollAxisMode::Vertical),
                scripts::READY_STATE.to_string(),
            ]
        );
        // setup and refresh both apply the mode
        assert_eq!(fx.surface.behaviors().len(), 2);
    }

    #[tokio::test]
    async fn test_did_finish_load_continues_without_night_mode_filler() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.session.set_night_mode(true);
        fx.surface.respond(scripts::CONTENT_DIMENSIONS, json!({"scrollWidth": 10}));

        fx.page.did_finish_load(false).await.unwrap();

        assert_eq!(
            fx.surface.evaluated(),
            vec![
                scripts::READY_STATE.to_string(),
                scripts::CONTENT_DIMENSIONS.to_string(),
                scripts::set_page_height(ScrollAxisMode::Vertical),
                scripts::READY_STATE.to_string(),
            ]
        );
        assert_eq!(fx.page.interaction().state(), &InteractionState::Unselected);
    }

    #[tokio::test]
    async fn test_did_finish_load_stops_when_recycled() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.advance_on(scripts::set_page_height(ScrollAxisMode::Vertical), fx.page.generation());

        let err = fx.page.did_finish_load(false).await.unwrap_err();
        assert!(err.is_stale());
        assert!(!fx.surface.evaluated().contains(&scripts::READY_STATE.to_string()));
    }

    #[tokio::test]
    async fn test_did_finish_load_scrolls_to_bottom() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond_dimensions(375.0, 2000.0, 375.0, 812.0);

        fx.page.did_finish_load(true).await.unwrap();
        assert_eq!(fx.surface.evaluated().last().map(String::as_str), Some("scrollTo(0, 812)"));
    }

    #[tokio::test]
    async fn test_highlight_selection_persists_record() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond(
            scripts::highlight_string("highlight-yellow"),
            json!(r#"[{"id":"h1","rect":"{{10, 20}, {30, 40}}","startOffset":"8","endOffset":"15"}]"#),
        );
        fx.surface.respond(
            scripts::GET_HTML,
            json!(r#"<p>Call me <highlight id="h1" onclick="callHighlightURL(this);" class="highlight-yellow">Ishmael</highlight>. Some years ago</p>"#),
        );

        let record = fx.page.highlight_selection().await.unwrap();

        assert_eq!(record.id, "h1");
        assert_eq!(record.book_id, "moby");
        assert_eq!(record.page, 1);
        assert_eq!(record.content_pre, "Call me ");
        assert_eq!(record.content, "Ishmael");
        assert_eq!(record.start_offset, Some(8));

        let stored = fx.store.get_by_id("h1").await.unwrap().unwrap();
        assert_eq!(stored.locator(), record.locator());

        assert!(matches!(
            fx.host.calls().first(),
            Some(HostCall::ShowMenu(rect, _)) if *rect == Rect::new(10.0, 20.0, 30.0, 40.0)
        ));
    }

    #[tokio::test]
    async fn test_highlight_selection_with_unmatched_markup() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond(
            scripts::highlight_string("highlight-yellow"),
            json!([{ "id": "h9", "rect": "1,2,3,4", "startOffset": 0, "endOffset": 3 }]),
        );
        fx.surface.respond(scripts::GET_HTML, json!("<p>no markup</p>"));

        let err = fx.page.highlight_selection().await.unwrap_err();
        assert!(matches!(err, ReaderError::LocatorNotFound(ref id) if id == "h9"));
        assert!(err.is_recoverable());
        assert!(fx.store.get_by_id("h9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_highlight_with_note_flow() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond(
            scripts::highlight_string_with_note("highlight-yellow"),
            json!([{ "id": "n1", "rect": "", "startOffset": "8", "endOffset": "15" }]),
        );
        fx.surface.respond(
            scripts::GET_HTML,
            json!(r#"<p>Call me <highlight id="n1" onclick="callHighlightWithNoteURL(this);" class="highlight-yellow">Ishmael</highlight>.</p>"#),
        );

        let record = fx.page.highlight_selection_with_note().await.unwrap();
        assert_eq!(fx.host.calls(), vec![HostCall::NoteEditor("n1".to_string(), false)]);
        assert!(fx.store.get_by_id("n1").await.unwrap().is_none());

        let saved = fx.page.update_note(&record, Some("  the narrator ")).await.unwrap();
        assert_eq!(saved.note.as_deref(), Some("the narrator"));

        let cleared = fx.page.update_note(&record, Some("")).await.unwrap();
        assert_eq!(cleared.note, None);
    }

    #[tokio::test]
    async fn test_change_style_and_remove() {
        let fx = setup_page(ReaderConfig::default()).await;
        let record = HighlightRecord::with_id("h1", "moby", 1, "Call me ", "Ishmael", ".");
        fx.store.insert(&record).await.unwrap();

        fx.page
            .decide_policy(NavigationRequest::new("highlight://1,1,1,1", false))
            .await;
        fx.page.show_colors();
        assert_eq!(fx.page.interaction().menu_mode(), Some(MenuMode::Colors));

        fx.surface
            .respond(scripts::set_highlight_style("highlight-green"), json!("h1"));
        let updated = fx.page.change_highlight_style(HighlightStyle::Green).await.unwrap();
        assert_eq!(updated.as_deref(), Some("h1"));
        assert_eq!(fx.session.highlight_style(), HighlightStyle::Green);
        assert_eq!(
            fx.store.get_by_id("h1").await.unwrap().unwrap().style,
            HighlightStyle::Green
        );
        assert_eq!(
            fx.page.interaction().state(),
            &InteractionState::ColorChanged {
                id: "h1".to_string(),
                style: HighlightStyle::Green
            }
        );

        fx.page
            .decide_policy(NavigationRequest::new("highlight://1,1,1,1", false))
            .await;
        fx.surface.respond(scripts::REMOVE_THIS_HIGHLIGHT, json!("h1"));
        let removed = fx.page.remove_highlight().await.unwrap();
        assert_eq!(removed.as_deref(), Some("h1"));
        assert!(fx.store.get_by_id("h1").await.unwrap().is_none());
        assert_eq!(fx.host.calls().last(), Some(&HostCall::HideMenu));
    }

    #[tokio::test]
    async fn test_edit_selected_note() {
        let fx = setup_page(ReaderConfig::default()).await;
        let record = HighlightRecord::with_id("h1", "moby", 1, "Call me ", "Ishmael", ".").with_note("old");
        fx.store.insert(&record).await.unwrap();
        fx.surface.respond(scripts::GET_HIGHLIGHT_ID, json!("h1"));

        let selected = fx.page.edit_selected_note().await.unwrap().unwrap();
        assert_eq!(selected.note.as_deref(), Some("old"));
        assert_eq!(fx.host.calls().last(), Some(&HostCall::NoteEditor("h1".to_string(), true)));

        fx.page.update_note(&selected, Some("new")).await.unwrap();
        assert_eq!(
            fx.store.get_by_id("h1").await.unwrap().unwrap().note.as_deref(),
            Some("new")
        );
    }

    #[tokio::test]
    async fn test_selection_menu_offers_define_for_one_word() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.surface.respond(scripts::GET_SELECTED_TEXT, json!("Ishmael"));

        fx.page.show_selection_menu(Rect::new(5.0, 5.0, 50.0, 20.0)).await.unwrap();
        assert_eq!(
            fx.host.calls(),
            vec![HostCall::ShowMenu(
                Rect::new(5.0, 5.0, 50.0, 20.0),
                vec![
                    MenuItem::Highlight,
                    MenuItem::Define,
                    MenuItem::HighlightWithNote,
                    MenuItem::Share
                ]
            )]
        );
    }

    #[tokio::test]
    async fn test_audio_mark_uses_book_class() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.page.audio_mark_id("f-12").await.unwrap();
        assert_eq!(
            fx.surface.evaluated(),
            vec![scripts::audio_mark_id(DEFAULT_PLAYBACK_ACTIVE_CLASS, "f-12")]
        );
    }

    #[tokio::test]
    async fn test_viewport_frame_follows_mode() {
        let fx = setup_page(ReaderConfig::default()).await;
        let vertical = fx.page.viewport_frame();

        fx.session.set_scroll_direction(ScrollAxisMode::Horizontal);
        let horizontal = fx.page.viewport_frame();

        assert_eq!(vertical, Rect::new(0.0, 0.0, 375.0, 812.0));
        assert_ne!(vertical, horizontal);
    }

    #[tokio::test]
    async fn test_night_mode_filler() {
        let fx = setup_page(ReaderConfig::default()).await;
        fx.session.set_scroll_direction(ScrollAxisMode::Horizontal);
        // Two columns of 375pt, 1000pt of content in a 762pt frame
        fx.surface.respond_dimensions(750.0, 1000.0, 375.0, 812.0);

        assert_eq!(fx.page.refresh_page_mode().await.unwrap(), Rect::ZERO);

        fx.session.set_night_mode(true);
        let filler = fx.page.refresh_page_mode().await.unwrap();
        assert_eq!(filler, Rect::new(375.0, 238.0, 375.0, 524.0));
    }

    #[tokio::test]
    async fn test_session_listener_follows_scroll_direction() {
        let fx = setup_page(ReaderConfig::default()).await;
        let handle = fx.page.spawn_session_listener();

        fx.session.set_scroll_direction(ScrollAxisMode::Horizontal);

        let expected = scripts::set_page_height(ScrollAxisMode::Horizontal);
        tokio::time::timeout(Duration::from_secs(2), async {
            while !fx.surface.evaluated().contains(&expected) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(
            fx.surface.behaviors().last(),
            Some(&ScrollBehavior::for_mode(ScrollAxisMode::Horizontal))
        );

        fx.page.recycle();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
