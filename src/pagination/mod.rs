//! Pagination engine
//!
//! Converts raw scroll metrics into pages and back for the active
//! scroll-axis mode, computes the content frame around the reader chrome,
//! and decides native paging/bounce behavior.

mod behavior;
mod frame;
mod paginator;
mod types;

pub use behavior::{should_scroll_to_anchor, ScrollBehavior};
pub use frame::{
    frame_extent, last_page_filler, viewport_frame, ChromeInsets, FrameOptions, PADDING_BOTTOM, PADDING_TOP,
};
pub use paginator::Paginator;
pub use types::{ParseScrollAxisError, ScrollAxisMode};
