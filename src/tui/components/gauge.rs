//! # Gauge
//!
//! Two rows: `label value` on top, a horizontal bar between `min` and `max`
//! below. Values outside the range pin the bar at either end.

use crate::core::error::RenderError;
use crate::core::geometry::Size;
use crate::core::layout::Placement;
use crate::tui::component::{
    Binding, Cell, DashboardItem, RenderContext, format_value, text_width,
};

pub struct Gauge {
    id: String,
    binding: Binding,
    label: String,
    min: f64,
    max: f64,
    decimals: Option<usize>,
    width: u16,
    placement: Placement,
}

impl Gauge {
    pub fn new(
        id: impl Into<String>,
        instrument: impl Into<String>,
        key: &str,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            id: id.into(),
            label: key.to_string(),
            binding: Binding::new(instrument, &[key]),
            min,
            max,
            decimals: None,
            width: 20,
            placement: Placement::Flow,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Filled columns out of `width` for `value`.
    fn filled(&self, value: f64, width: u16) -> u16 {
        let span = self.max - self.min;
        if !value.is_finite() || span <= 0.0 {
            return 0;
        }
        let ratio = ((value - self.min) / span).clamp(0.0, 1.0);
        (ratio * f64::from(width)).round() as u16
    }
}

impl DashboardItem for Gauge {
    fn id(&self) -> &str {
        &self.id
    }

    fn binding(&self) -> Option<&Binding> {
        Some(&self.binding)
    }

    fn min_size(&self) -> Size {
        Size::new(2, self.width.max(text_width(&self.label).saturating_add(2)))
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError> {
        let mut canvas = ctx.canvas();
        let key = self.binding.keys.first().map(String::as_str).unwrap_or_default();
        let value = ctx.value(key);

        let col = canvas.text(0, 0, &format!("{} ", self.label), ctx.style());
        canvas.text(
            0,
            col,
            &format_value(value, self.decimals),
            ctx.highlight(ctx.theme.accent()),
        );

        let width = canvas.width();
        let filled = value
            .and_then(|v| v.as_f64())
            .map(|v| self.filled(v, width))
            .unwrap_or(0);
        canvas.fill(1, 0, filled, "█", ctx.highlight(ctx.theme.accent()));
        canvas.fill(1, filled, width - filled, "░", ctx.style());
        Ok(canvas.into_cells())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Region;
    use crate::core::instrument::DataMap;
    use crate::tui::component::test_helpers::{context, row_of};
    use crate::tui::theme::Theme;
    use serde_json::json;

    fn bar(value: serde_json::Value) -> (String, String) {
        let gauge = Gauge::new("g", "temp", "t", 0.0, 100.0).label("Temp").width(10);
        let region = Region::new(0, 0, 2, 10);
        let theme = Theme::default();
        let data: DataMap = [("t".to_string(), value)].into_iter().collect();
        let cells = gauge.render(&context(region, &data, &theme)).unwrap();
        (row_of(&cells, region, 0), row_of(&cells, region, 1))
    }

    #[test]
    fn test_gauge_half_full() {
        let (top, bottom) = bar(json!(50));
        assert_eq!(top.trim_end(), "Temp 50");
        assert_eq!(bottom, "█████░░░░░");
    }

    #[test]
    fn test_gauge_clamps_out_of_range() {
        assert_eq!(bar(json!(250)).1, "██████████");
        assert_eq!(bar(json!(-5)).1, "░░░░░░░░░░");
    }

    #[test]
    fn test_gauge_missing_value_is_empty_bar() {
        let (top, bottom) = bar(serde_json::Value::Null);
        assert_eq!(top.trim_end(), "Temp --");
        assert_eq!(bottom, "░░░░░░░░░░");
    }
}
