//! # Readonly
//!
//! Shows one data value as `label: <prefix><value><suffix>`.

use crate::core::error::RenderError;
use crate::core::geometry::Size;
use crate::core::layout::Placement;
use crate::tui::component::{
    Binding, Cell, DashboardItem, RenderContext, format_value, text_width,
};

pub struct Readonly {
    id: String,
    binding: Binding,
    label: String,
    prefix: String,
    suffix: String,
    decimals: Option<usize>,
    width: u16,
    placement: Placement,
}

impl Readonly {
    pub fn new(id: impl Into<String>, instrument: impl Into<String>, key: &str) -> Self {
        let id = id.into();
        Self {
            label: key.to_string(),
            binding: Binding::new(instrument, &[key]),
            id,
            prefix: String::new(),
            suffix: String::new(),
            decimals: None,
            width: 20,
            placement: Placement::Flow,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
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

    fn key(&self) -> &str {
        self.binding.keys.first().map(String::as_str).unwrap_or_default()
    }
}

impl DashboardItem for Readonly {
    fn id(&self) -> &str {
        &self.id
    }

    fn binding(&self) -> Option<&Binding> {
        Some(&self.binding)
    }

    fn min_size(&self) -> Size {
        Size::new(1, self.width.max(text_width(&self.label).saturating_add(2)))
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError> {
        let mut canvas = ctx.canvas();
        let style = ctx.style();
        let col = canvas.text(0, 0, &format!("{}: ", self.label), style);
        let value = match ctx.value(self.key()) {
            Some(v) => format!(
                "{}{}{}",
                self.prefix,
                format_value(Some(v), self.decimals),
                self.suffix
            ),
            None => format_value(None, None),
        };
        canvas.text(0, col, &value, ctx.highlight(ctx.theme.accent()));
        Ok(canvas.into_cells())
    }
}
