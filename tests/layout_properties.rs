use labterm::core::layout::{
    ChromeLayout, ChromeSpec, LayoutManager, LayoutRequest, MIN_CONTENT_ROWS, Placement,
};
use labterm::core::{Region, Size};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn placement() -> impl Strategy<Value = Placement> {
    prop_oneof![
        3 => Just(Placement::Flow),
        1 => (0u16..60, 0u16..120).prop_map(|(row, col)| Placement::Fixed { row, col }),
        1 => (0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(x, y)| Placement::Proportional { x, y }),
    ]
}

fn request() -> impl Strategy<Value = LayoutRequest> {
    (0u16..8, 0u16..30, placement()).prop_map(|(rows, cols, placement)| LayoutRequest {
        min_size: Size::new(rows, cols),
        placement,
    })
}

fn chrome_spec() -> impl Strategy<Value = ChromeSpec> {
    (any::<bool>(), any::<bool>(), 0u16..6, 0u16..9).prop_map(
        |(header, status, controls_rows, log_rows)| ChromeSpec {
            header,
            status,
            controls_rows,
            log_rows,
        },
    )
}

fn assert_disjoint(regions: &[Region]) {
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn test_items_stay_inside_content_and_never_overlap(
        cols in 1u16..200,
        rows in 1u16..80,
        spec in chrome_spec(),
        requests in prop::collection::vec(request(), 0..24),
    ) {
        let chrome = ChromeLayout::compute(Size::new(rows, cols), &spec);
        let plan = LayoutManager::default().compute(chrome.content, &requests);

        prop_assert_eq!(plan.regions.len(), requests.len());
        let visible: Vec<Region> = plan.visible().collect();
        for region in &visible {
            prop_assert!(
                chrome.content.contains(region),
                "{:?} outside {:?}",
                region,
                chrome.content
            );
        }
        assert_disjoint(&visible);

        let mut everything = visible.clone();
        everything.extend(chrome.sections());
        assert_disjoint(&everything);
    }

    #[test]
    fn test_visible_regions_meet_minimum_size(
        cols in 1u16..200,
        rows in 1u16..80,
        requests in prop::collection::vec(request(), 0..24),
    ) {
        let bounds = Region::new(0, 0, rows, cols);
        let plan = LayoutManager::default().compute(bounds, &requests);
        for (request, region) in requests.iter().zip(&plan.regions) {
            if let Some(region) = region {
                prop_assert!(region.height >= request.min_size.rows.max(1));
                prop_assert!(region.width >= request.min_size.cols.max(1));
            }
        }
    }

    #[test]
    fn test_chrome_keeps_minimum_content(
        cols in 1u16..200,
        rows in 1u16..80,
        spec in chrome_spec(),
    ) {
        let chrome = ChromeLayout::compute(Size::new(rows, cols), &spec);
        let reserved: u16 = chrome.sections().map(|r| r.height).sum();
        prop_assert_eq!(reserved + chrome.content.height, rows);
        if reserved > 0 {
            prop_assert!(chrome.content.height >= MIN_CONTENT_ROWS);
        }
    }

    #[test]
    fn test_layout_is_deterministic(
        cols in 1u16..200,
        rows in 1u16..80,
        requests in prop::collection::vec(request(), 0..16),
    ) {
        let bounds = Region::new(1, 0, rows, cols);
        let manager = LayoutManager::default();
        prop_assert_eq!(manager.compute(bounds, &requests), manager.compute(bounds, &requests));
    }
}
