//! Content frame inside the page cell

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

use super::ScrollAxisMode;

/// Padding above paginated content
pub const PADDING_TOP: f64 = 20.0;
/// Padding below paginated content
pub const PADDING_BOTTOM: f64 = 30.0;

/// Heights of the chrome overlays reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromeInsets {
    pub status_bar_height: f64,
    pub navigation_bar_height: f64,
}

/// Chrome-related reader options that shape the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOptions {
    /// Bars are never shown; content uses the full bounds
    pub hide_bars: bool,
    /// Bars only appear on tap, so no space is reserved for them
    pub should_hide_navigation_on_tap: bool,
}

/// Frame of the rendering surface within `bounds`.
///
/// Space for the status and navigation bars is reserved at the top unless
/// bars are hidden. Paginated (horizontal) content additionally gets the
/// fixed top and bottom padding.
pub fn viewport_frame(
    bounds: Rect,
    chrome: ChromeInsets,
    options: FrameOptions,
    mode: ScrollAxisMode,
) -> Rect {
    if options.hide_bars {
        return bounds;
    }

    let nav_total = if options.should_hide_navigation_on_tap {
        0.0
    } else {
        chrome.status_bar_height + chrome.navigation_bar_height
    };

    let top = bounds.y + nav_total;
    Rect {
        x: bounds.x,
        y: mode.select(top, top + PADDING_TOP, top),
        width: bounds.width,
        height: mode.select(
            bounds.height - nav_total,
            bounds.height - nav_total - PADDING_TOP - PADDING_BOTTOM,
            bounds.height - nav_total,
        ),
    }
}

/// Extent of a frame along the paginating axis
pub fn frame_extent(frame: Rect, mode: ScrollAxisMode) -> f64 {
    mode.select(frame.height, frame.width, frame.height)
}

/// Blank area below the content on the last page.
///
/// Night mode paints it so the unused part of the page matches the
/// background. Zero when the content fills every page.
pub fn last_page_filler(frame: Rect, page_count: usize, content_height: f64) -> Rect {
    if page_count == 0 {
        return Rect::ZERO;
    }

    let pages = page_count as f64;
    let blank = frame.height * pages - content_height;
    if blank <= 0.0 {
        return Rect::ZERO;
    }

    Rect::new(frame.width * (pages - 1.0), frame.height - blank, frame.width, blank)
}
