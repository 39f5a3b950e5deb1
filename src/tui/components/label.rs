//! # Label
//!
//! Static text with no instrument binding. Never focusable, never dirty after
//! the first frame unless the layout changes.

use crate::core::error::RenderError;
use crate::core::geometry::Size;
use crate::core::layout::Placement;
use crate::tui::component::{Align, Binding, Cell, DashboardItem, RenderContext, text_width};

pub struct Label {
    id: String,
    text: String,
    align: Align,
    width: Option<u16>,
    placement: Placement,
}

impl Label {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            align: Align::Left,
            width: None,
            placement: Placement::Flow,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Reserve `width` columns instead of the text's own width.
    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

impl DashboardItem for Label {
    fn id(&self) -> &str {
        &self.id
    }

    fn binding(&self) -> Option<&Binding> {
        None
    }

    fn min_size(&self) -> Size {
        Size::new(1, self.width.unwrap_or_else(|| text_width(&self.text)))
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError> {
        let mut canvas = ctx.canvas();
        canvas.aligned(0, &self.text, self.align, ctx.style());
        Ok(canvas.into_cells())
    }
}
