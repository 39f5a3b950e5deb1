//! # Layout Manager
//!
//! Turns the terminal size and the ordered list of items into regions.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ header                               │  1 row
//! ├──────────────────────────────────────┤
//! │ [flow 1]  [flow 4]     [fixed]       │
//! │ [flow 2]  [flow 5]                   │  content bounds
//! │ [flow 3]                             │
//! ├──────────────────────────────────────┤
//! │ ── Controls ──────────────────────── │  title + lines
//! │ ── Log ───────────────────────────── │  title + max_log_messages
//! ├──────────────────────────────────────┤
//! │ status line                          │  1 row
//! └──────────────────────────────────────┘
//! ```
//!
//! Chrome sections are reserved first (header, status, controls, log), each
//! only while enough content rows remain. Inside the content bounds, fixed
//! and proportional items are placed first in registration order, then flow
//! items tile top-to-bottom and wrap into new columns left-to-right. Items
//! that cannot be placed without overlapping or leaving the bounds are
//! hidden.

use crate::core::geometry::{Region, Size};

/// Chrome sections are dropped rather than shrink content below this.
pub const MIN_CONTENT_ROWS: u16 = 3;

/// Where an item wants to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Next free slot in the flow, top-to-bottom then left-to-right.
    Flow,
    /// Cell offset from the top-left of the content bounds.
    Fixed { row: u16, col: u16 },
    /// Fractions (0.0–1.0) of the content bounds, resolved on every layout.
    Proportional { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRequest {
    pub min_size: Size,
    pub placement: Placement,
}

/// Regions for one terminal size. `regions[i]` is `None` for hidden items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutPlan {
    pub bounds: Region,
    pub regions: Vec<Option<Region>>,
}

impl LayoutPlan {
    pub fn region(&self, index: usize) -> Option<Region> {
        self.regions.get(index).copied().flatten()
    }

    pub fn hidden_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_none()).count()
    }

    pub fn visible(&self) -> impl Iterator<Item = Region> + '_ {
        self.regions.iter().filter_map(|r| *r)
    }
}

/// Row budget for the dashboard's own sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChromeSpec {
    pub header: bool,
    pub status: bool,
    /// Rows of the controls section including its title (0 = disabled).
    pub controls_rows: u16,
    /// Rows of the log section including its title (0 = disabled).
    pub log_rows: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChromeLayout {
    pub header: Option<Region>,
    pub content: Region,
    pub controls: Option<Region>,
    pub log: Option<Region>,
    pub status: Option<Region>,
}

impl ChromeLayout {
    pub fn compute(size: Size, spec: &ChromeSpec) -> Self {
        let full = Region::of_size(size);
        let mut budget = size.rows;
        let mut take = |enabled: bool, rows: u16| -> bool {
            if !enabled || rows == 0 || budget < rows.saturating_add(MIN_CONTENT_ROWS) {
                return false;
            }
            budget -= rows;
            true
        };

        let header = take(spec.header, 1);
        let status = take(spec.status, 1);
        let controls = take(true, spec.controls_rows);
        let log = take(true, spec.log_rows);

        let mut layout = ChromeLayout::default();
        let mut rest = full;
        if header {
            let (top, remaining) = rest.split_top(1);
            layout.header = Some(top);
            rest = remaining;
        }
        if status {
            let (remaining, bottom) = rest.split_bottom(1);
            layout.status = Some(bottom);
            rest = remaining;
        }
        if log {
            let (remaining, bottom) = rest.split_bottom(spec.log_rows);
            layout.log = Some(bottom);
            rest = remaining;
        }
        if controls {
            let (remaining, bottom) = rest.split_bottom(spec.controls_rows);
            layout.controls = Some(bottom);
            rest = remaining;
        }
        layout.content = rest;
        layout
    }

    /// All chrome regions, top to bottom.
    pub fn sections(&self) -> impl Iterator<Item = Region> + '_ {
        [self.header, self.controls, self.log, self.status]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutManager {
    /// Blank rows between flow items and blank columns between flow columns.
    pub gutter: Size,
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self {
            gutter: Size::new(0, 1),
        }
    }
}

impl LayoutManager {
    pub fn new(gutter: Size) -> Self {
        Self { gutter }
    }

    pub fn compute(&self, bounds: Region, requests: &[LayoutRequest]) -> LayoutPlan {
        let mut regions: Vec<Option<Region>> = vec![None; requests.len()];
        let mut occupied: Vec<Region> = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            let anchor = match request.placement {
                Placement::Flow => continue,
                Placement::Fixed { row, col } => (u32::from(row), u32::from(col)),
                Placement::Proportional { x, y } => (
                    fraction_of(y, bounds.height),
                    fraction_of(x, bounds.width),
                ),
            };
            let size = at_least_one(request.min_size);
            let candidate = make_region(
                u32::from(bounds.row) + anchor.0,
                u32::from(bounds.col) + anchor.1,
                size,
            );
            if let Some(region) = candidate
                && bounds.contains(&region)
                && !occupied.iter().any(|o| o.overlaps(&region))
            {
                regions[index] = Some(region);
                occupied.push(region);
            }
        }

        let mut flow = FlowCursor::new(bounds, self.gutter);
        for (index, request) in requests.iter().enumerate() {
            if request.placement != Placement::Flow {
                continue;
            }
            if let Some(region) = flow.place(at_least_one(request.min_size), &occupied) {
                regions[index] = Some(region);
                occupied.push(region);
            }
        }

        LayoutPlan { bounds, regions }
    }
}

struct FlowCursor {
    bounds: Region,
    gutter: Size,
    row: u32,
    col: u32,
    column_width: u32,
}

impl FlowCursor {
    fn new(bounds: Region, gutter: Size) -> Self {
        Self {
            bounds,
            gutter,
            row: u32::from(bounds.row),
            col: u32::from(bounds.col),
            column_width: 0,
        }
    }

    fn wrap(&mut self) {
        let step = (self.column_width + u32::from(self.gutter.cols)).max(1);
        self.col += step;
        self.row = u32::from(self.bounds.row);
        self.column_width = 0;
    }

    /// Next free slot for `size`, or `None` once the flow runs out of columns.
    fn place(&mut self, size: Size, occupied: &[Region]) -> Option<Region> {
        if size.rows > self.bounds.height || size.cols > self.bounds.width {
            return None;
        }
        let rows = u32::from(size.rows);
        let cols = u32::from(size.cols);

        loop {
            if self.row + rows > self.bounds.bottom() {
                self.wrap();
            }
            if self.col + cols > self.bounds.right() {
                return None;
            }

            let candidate = make_region(self.row, self.col, size)?;
            let blocker_bottom = occupied
                .iter()
                .filter(|o| o.overlaps(&candidate))
                .map(Region::bottom)
                .max();

            match blocker_bottom {
                Some(bottom) => self.row = bottom,
                None => {
                    self.row += rows + u32::from(self.gutter.rows);
                    self.column_width = self.column_width.max(cols);
                    return Some(candidate);
                }
            }
        }
    }
}

fn at_least_one(size: Size) -> Size {
    Size::new(size.rows.max(1), size.cols.max(1))
}

fn fraction_of(fraction: f32, extent: u16) -> u32 {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (fraction * f32::from(extent)) as u32
}

fn make_region(row: u32, col: u32, size: Size) -> Option<Region> {
    Some(Region::new(
        u16::try_from(row).ok()?,
        u16::try_from(col).ok()?,
        size.rows,
        size.cols,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(rows: u16, cols: u16) -> LayoutRequest {
        LayoutRequest {
            min_size: Size::new(rows, cols),
            placement: Placement::Flow,
        }
    }

    fn fixed(row: u16, col: u16, rows: u16, cols: u16) -> LayoutRequest {
        LayoutRequest {
            min_size: Size::new(rows, cols),
            placement: Placement::Fixed { row, col },
        }
    }

    fn assert_disjoint(plan: &LayoutPlan) {
        let visible: Vec<Region> = plan.visible().collect();
        for (i, a) in visible.iter().enumerate() {
            assert!(plan.bounds.contains(a), "{a:?} outside {:?}", plan.bounds);
            for b in &visible[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_flow_tiles_top_to_bottom_then_wraps() {
        let plan = LayoutManager::default().compute(
            Region::new(0, 0, 6, 40),
            &[flow(3, 10), flow(3, 8), flow(3, 12)],
        );
        assert_eq!(plan.region(0), Some(Region::new(0, 0, 3, 10)));
        assert_eq!(plan.region(1), Some(Region::new(3, 0, 3, 8)));
        // Column width is the widest item so far, plus one gutter column.
        assert_eq!(plan.region(2), Some(Region::new(0, 11, 3, 12)));
        assert_disjoint(&plan);
    }

    #[test]
    fn test_flow_respects_bounds_origin() {
        let plan = LayoutManager::default().compute(Region::new(1, 0, 4, 40), &[flow(3, 10)]);
        assert_eq!(plan.region(0), Some(Region::new(1, 0, 3, 10)));
    }

    #[test]
    fn test_overflow_hides_instead_of_failing() {
        let requests = vec![flow(3, 10); 5];
        let plan = LayoutManager::default().compute(Region::new(1, 0, 4, 40), &requests);
        assert_eq!(plan.hidden_count(), 2);
        assert!(plan.region(3).is_none());
        assert!(plan.region(4).is_none());
        assert_disjoint(&plan);
    }

    #[test]
    fn test_narrow_item_can_use_leftover_width() {
        let plan = LayoutManager::default().compute(
            Region::new(0, 0, 3, 30),
            &[flow(3, 10), flow(3, 10), flow(3, 10), flow(3, 7)],
        );
        assert!(plan.region(2).is_none());
        assert_eq!(plan.region(3), Some(Region::new(0, 22, 3, 7)));
    }

    #[test]
    fn test_item_larger_than_bounds_is_hidden() {
        let plan = LayoutManager::default().compute(Region::new(0, 0, 2, 10), &[flow(3, 5)]);
        assert_eq!(plan.hidden_count(), 1);
    }

    #[test]
    fn test_fixed_placed_before_flow_regardless_of_order() {
        let plan = LayoutManager::default().compute(
            Region::new(0, 0, 10, 40),
            &[flow(2, 10), fixed(0, 0, 3, 20)],
        );
        assert_eq!(plan.region(1), Some(Region::new(0, 0, 3, 20)));
        // Flow item slides below the fixed one.
        assert_eq!(plan.region(0), Some(Region::new(3, 0, 2, 10)));
        assert_disjoint(&plan);
    }

    #[test]
    fn test_overlapping_fixed_items_hide_the_later_one() {
        let plan = LayoutManager::default().compute(
            Region::new(0, 0, 10, 40),
            &[fixed(0, 0, 2, 10), fixed(1, 5, 2, 10)],
        );
        assert!(plan.region(0).is_some());
        assert!(plan.region(1).is_none());
    }

    #[test]
    fn test_fixed_outside_bounds_is_hidden() {
        let plan = LayoutManager::default()
            .compute(Region::new(0, 0, 10, 40), &[fixed(9, 35, 2, 10)]);
        assert_eq!(plan.hidden_count(), 1);
    }

    #[test]
    fn test_proportional_follows_bounds() {
        let request = LayoutRequest {
            min_size: Size::new(1, 5),
            placement: Placement::Proportional { x: 0.5, y: 0.5 },
        };
        let big = LayoutManager::default().compute(Region::new(0, 0, 20, 80), &[request]);
        assert_eq!(big.region(0), Some(Region::new(10, 40, 1, 5)));
        let small = LayoutManager::default().compute(Region::new(0, 0, 10, 40), &[request]);
        assert_eq!(small.region(0), Some(Region::new(5, 20, 1, 5)));
    }

    #[test]
    fn test_full_height_fixed_blocker_pushes_flow_right() {
        let plan = LayoutManager::new(Size::new(0, 0)).compute(
            Region::new(0, 0, 4, 20),
            &[fixed(0, 0, 4, 3), flow(2, 4)],
        );
        assert_eq!(plan.region(1), Some(Region::new(0, 3, 2, 4)));
        assert_disjoint(&plan);
    }

    #[test]
    fn test_zero_min_size_treated_as_one_cell() {
        let plan = LayoutManager::default().compute(Region::new(0, 0, 2, 2), &[flow(0, 0)]);
        assert_eq!(plan.region(0), Some(Region::new(0, 0, 1, 1)));
    }

    #[test]
    fn test_chrome_all_sections_on_large_terminal() {
        let spec = ChromeSpec {
            header: true,
            status: true,
            controls_rows: 4,
            log_rows: 7,
        };
        let chrome = ChromeLayout::compute(Size::new(24, 80), &spec);
        assert_eq!(chrome.header, Some(Region::new(0, 0, 1, 80)));
        assert_eq!(chrome.content, Region::new(1, 0, 11, 80));
        assert_eq!(chrome.controls, Some(Region::new(12, 0, 4, 80)));
        assert_eq!(chrome.log, Some(Region::new(16, 0, 7, 80)));
        assert_eq!(chrome.status, Some(Region::new(23, 0, 1, 80)));
    }

    #[test]
    fn test_chrome_drops_log_on_small_terminal() {
        let spec = ChromeSpec {
            header: true,
            status: true,
            controls_rows: 4,
            log_rows: 7,
        };
        let chrome = ChromeLayout::compute(Size::new(10, 40), &spec);
        assert!(chrome.log.is_none());
        assert_eq!(chrome.content, Region::new(1, 0, 4, 40));
        assert_eq!(chrome.controls, Some(Region::new(5, 0, 4, 40)));
        assert_eq!(chrome.status, Some(Region::new(9, 0, 1, 40)));
    }

    #[test]
    fn test_chrome_sections_never_overlap_content() {
        let spec = ChromeSpec {
            header: true,
            status: true,
            controls_rows: 4,
            log_rows: 7,
        };
        for rows in 0..30 {
            let chrome = ChromeLayout::compute(Size::new(rows, 20), &spec);
            for section in chrome.sections() {
                assert!(!section.overlaps(&chrome.content), "rows={rows}");
                assert!(section.bottom() <= u32::from(rows));
            }
            assert!(chrome.content.bottom() <= u32::from(rows));
        }
    }

    #[test]
    fn test_resize_scenario_five_flow_items() {
        let spec = ChromeSpec {
            header: true,
            status: true,
            controls_rows: 4,
            log_rows: 7,
        };
        let requests = vec![flow(3, 10); 5];
        let manager = LayoutManager::default();

        let wide_content = ChromeLayout::compute(Size::new(24, 80), &spec).content;
        let wide = manager.compute(wide_content, &requests);
        assert_eq!(wide.hidden_count(), 0);

        let narrow =
            manager.compute(ChromeLayout::compute(Size::new(10, 40), &spec).content, &requests);
        assert_eq!(narrow.visible().count(), 3);
        assert_eq!(narrow.hidden_count(), 2);
        assert_disjoint(&narrow);
    }
}
