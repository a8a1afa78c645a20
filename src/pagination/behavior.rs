//! Native scroll behavior and anchor scrolling rules

use serde::{Deserialize, Serialize};

use super::ScrollAxisMode;

/// Paging snap and bounce settings for the surface's scroll view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollBehavior {
    pub paging_enabled: bool,
    pub bounces: bool,
}

impl ScrollBehavior {
    /// Horizontal pagination snaps to pages and does not bounce; every
    /// other mode scrolls freely.
    pub fn for_mode(mode: ScrollAxisMode) -> Self {
        let paged = mode.paginates_horizontally();
        Self {
            paging_enabled: paged,
            bounces: !paged,
        }
    }
}

/// Whether scrolling to an anchor at `offset` should happen.
///
/// In vertical mode, callers may skip anchors in the first half of the
/// frame (`avoid_beginning_anchors`); horizontal modes always scroll.
pub fn should_scroll_to_anchor(
    offset: f64,
    frame_extent: f64,
    mode: ScrollAxisMode,
    avoid_beginning_anchors: bool,
) -> bool {
    match mode {
        ScrollAxisMode::Vertical => {
            let is_beginning = offset < frame_extent * 0.5;
            !(avoid_beginning_anchors && is_beginning)
        }
        ScrollAxisMode::Horizontal | ScrollAxisMode::HorizontalWithVerticalContent => true,
    }
}
