//! Page arithmetic over a `ContentDimensions` snapshot
//!
//! Page numbers are 1-indexed. When the document has not been laid out
//! yet (either extent is zero) every quantity falls back to a sentinel
//! instead of dividing by zero.

use crate::geometry::{ContentDimensions, Point};

use super::ScrollAxisMode;

/// Page conversions for one scroll-axis mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    mode: ScrollAxisMode,
}

impl Paginator {
    pub fn new(mode: ScrollAxisMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ScrollAxisMode {
        self.mode
    }

    /// Number of pages in the document.
    ///
    /// Computed as `ceil(total) / extent`, truncated. Ceiling is applied to
    /// the total extent before dividing, so a trailing partial page is
    /// dropped (1000 / 400 gives 2, not 3). Likely off by one against
    /// `ceil(total / extent)`; stored reading positions depend on it.
    pub fn page_count(&self, dims: &ContentDimensions) -> usize {
        if !dims.is_laid_out(self.mode) {
            return 0;
        }

        let page_extent = dims.page_extent(self.mode);
        let total = dims.total_content_extent(self.mode);

        (total.ceil() / page_extent) as usize
    }

    /// Page containing `offset` along the paginating axis.
    ///
    /// Offsets within the first page extent are page 1. Past that, the
    /// result is `ceil(offset / extent) + 1`, which reports the page after
    /// the one containing the offset unless the offset sits exactly on a
    /// page boundary. Returns 0 when nothing is laid out.
    pub fn page_number_for_offset(&self, offset: f64, dims: &ContentDimensions) -> usize {
        if !dims.is_laid_out(self.mode) {
            return 0;
        }

        let page_extent = dims.page_extent(self.mode);
        let total = dims.total_content_extent(self.mode);

        if offset <= page_extent {
            return 1;
        }

        ((total / page_extent) * (offset / total)).ceil() as usize + 1
    }

    /// Scroll point at which page `page_number` starts
    pub fn offset_for_page_number(&self, page_number: usize, dims: &ContentDimensions) -> Point {
        let page_extent = dims.page_extent(self.mode);
        let offset = (page_number as f64 - 1.0) * page_extent;

        self.project(offset)
    }

    /// Scroll point of the last page
    pub fn offset_for_last_page(&self, dims: &ContentDimensions) -> Point {
        self.offset_for_page_number(self.page_count(dims), dims)
    }

    /// Page the surface is currently scrolled to
    pub fn current_page_number(&self, dims: &ContentDimensions) -> usize {
        self.page_number_for_offset(dims.scroll_offset(self.mode), dims)
    }

    /// Place a scalar offset on the paginating axis
    pub fn project(&self, offset: f64) -> Point {
        self.mode.select(
            Point::new(0.0, offset),
            Point::new(offset, 0.0),
            Point::new(0.0, offset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(total: f64, extent: f64) -> ContentDimensions {
        ContentDimensions {
            content_width: total,
            content_height: total,
            viewport_width: extent,
            viewport_height: extent,
            scroll_left: 0.0,
            scroll_top: 0.0,
        }
    }

    #[test]
    fn test_page_count_truncates_after_ceiling() {
        let paginator = Paginator::new(ScrollAxisMode::Horizontal);
        // ceil(1000) / 400 = 2.5 -> 2
        assert_eq!(paginator.page_count(&dims(1000.0, 400.0)), 2);
        assert_eq!(paginator.page_count(&dims(800.0, 400.0)), 2);
        // ceil(799.2) / 400 = 2.0 -> 2
        assert_eq!(paginator.page_count(&dims(799.2, 400.0)), 2);
        assert_eq!(paginator.page_count(&dims(1200.0, 400.0)), 3);
    }

    #[test]
    fn test_page_count_without_layout() {
        let paginator = Paginator::new(ScrollAxisMode::Vertical);
        assert_eq!(paginator.page_count(&dims(1000.0, 0.0)), 0);
        assert_eq!(paginator.page_count(&dims(0.0, 400.0)), 0);
        assert_eq!(paginator.page_count(&dims(-10.0, 400.0)), 0);
    }

    #[test]
    fn test_page_number_near_start() {
        let paginator = Paginator::new(ScrollAxisMode::Vertical);
        let d = dims(2000.0, 400.0);
        assert_eq!(paginator.page_number_for_offset(0.0, &d), 1);
        assert_eq!(paginator.page_number_for_offset(400.0, &d), 1);
    }

    #[test]
    fn test_page_number_past_first_page() {
        let paginator = Paginator::new(ScrollAxisMode::Vertical);
        let d = dims(2000.0, 400.0);
        // ceil(1.25) + 1
        assert_eq!(paginator.page_number_for_offset(500.0, &d), 3);
        // exact boundary: ceil(3) + 1
        assert_eq!(paginator.page_number_for_offset(1200.0, &d), 4);
    }

    #[test]
    fn test_page_number_without_layout() {
        let paginator = Paginator::new(ScrollAxisMode::Horizontal);
        assert_eq!(paginator.page_number_for_offset(500.0, &dims(0.0, 400.0)), 0);
        assert_eq!(paginator.page_number_for_offset(500.0, &dims(1000.0, 0.0)), 0);
    }

    #[test]
    fn test_offset_projection_by_mode() {
        let d = dims(2000.0, 400.0);

        let horizontal = Paginator::new(ScrollAxisMode::Horizontal);
        assert_eq!(horizontal.offset_for_page_number(3, &d), Point::new(800.0, 0.0));

        let vertical = Paginator::new(ScrollAxisMode::Vertical);
        assert_eq!(vertical.offset_for_page_number(3, &d), Point::new(0.0, 800.0));

        let mixed = Paginator::new(ScrollAxisMode::HorizontalWithVerticalContent);
        assert_eq!(mixed.offset_for_page_number(1, &d), Point::ZERO);
    }

    #[test]
    fn test_offset_for_last_page() {
        let paginator = Paginator::new(ScrollAxisMode::Horizontal);
        // 2 pages -> last page starts at 400
        assert_eq!(paginator.offset_for_last_page(&dims(1000.0, 400.0)), Point::new(400.0, 0.0));
    }

    #[test]
    fn test_round_trip_stays_within_one_page() {
        let paginator = Paginator::new(ScrollAxisMode::Vertical);
        let extent = 400.0;

        for total in [1000.0, 1600.0, 4321.0] {
            let d = dims(total, extent);
            let mut offset = 0.0;
            while offset <= total {
                let page = paginator.page_number_for_offset(offset, &d);
                let landed = paginator.offset_for_page_number(page, &d).y;
                assert!(
                    (landed - offset).abs() <= extent + 1e-9,
                    "offset {} landed on {} (page {})",
                    offset,
                    landed,
                    page
                );
                offset += 37.0;
            }
        }
    }

    #[test]
    fn test_current_page_uses_axis_scroll() {
        let paginator = Paginator::new(ScrollAxisMode::Horizontal);
        let mut d = dims(2000.0, 400.0);
        d.scroll_left = 1200.0;
        d.scroll_top = 0.0;
        assert_eq!(paginator.current_page_number(&d), 4);

        let vertical = Paginator::new(ScrollAxisMode::Vertical);
        assert_eq!(vertical.current_page_number(&d), 1);
    }
}
