//! # Light
//!
//! Status lamp: green `●` when the bound value is truthy, red `●` when it is
//! not, `-` while missing.

use crate::core::error::RenderError;
use crate::core::geometry::Size;
use crate::core::layout::Placement;
use crate::tui::component::{Binding, Cell, DashboardItem, RenderContext, is_truthy, text_width};

pub struct Light {
    id: String,
    binding: Binding,
    label: String,
    placement: Placement,
}

impl Light {
    pub fn new(id: impl Into<String>, instrument: impl Into<String>, key: &str) -> Self {
        Self {
            id: id.into(),
            label: key.to_string(),
            binding: Binding::new(instrument, &[key]),
            placement: Placement::Flow,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

impl DashboardItem for Light {
    fn id(&self) -> &str {
        &self.id
    }

    fn binding(&self) -> Option<&Binding> {
        Some(&self.binding)
    }

    fn min_size(&self) -> Size {
        Size::new(1, text_width(&self.label).saturating_add(2))
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError> {
        let mut canvas = ctx.canvas();
        let key = self.binding.keys.first().map(String::as_str).unwrap_or_default();
        let (lamp, style) = match ctx.value(key) {
            Some(v) if is_truthy(v) => ("●", ctx.theme.ok()),
            Some(_) => ("●", ctx.theme.alert()),
            None => ("-", ctx.style()),
        };
        canvas.text(0, 0, lamp, ctx.highlight(style));
        canvas.text(0, 2, &self.label, ctx.style());
        Ok(canvas.into_cells())
    }
}
