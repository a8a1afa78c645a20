//! Navigation interception
//!
//! Every request leaving the chapter document passes through the page's
//! navigation hook, which answers with a `NavigationPolicy`. Custom schemes
//! carry highlight taps, narration and click-listener events back to the
//! reader; see `scheme`.

mod scheme;

pub use scheme::{
    classify, parse_rect, parse_touch_point, resolve_internal_href, NavigationAction, HIGHLIGHT_SCHEME,
    HIGHLIGHT_WITH_NOTE_SCHEME, PLAY_AUDIO_SCHEME,
};

use serde::Serialize;

/// Answer returned to the rendering surface for an outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

/// An outgoing request reported by the rendering surface
#[derive(Debug, Clone, Copy)]
pub struct NavigationRequest<'a> {
    pub url: &'a str,
    /// The user tapped a link, as opposed to a script-initiated load
    pub link_activated: bool,
}

impl<'a> NavigationRequest<'a> {
    pub fn new(url: &'a str, link_activated: bool) -> Self {
        Self { url, link_activated }
    }
}
