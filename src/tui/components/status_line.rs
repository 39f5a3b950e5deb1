//! # Status Line
//!
//! Bottom row: one health marker per instrument, then the hidden-item
//! diagnostic and the editing indicator when they apply.
//!
//! ```text
//!  psu ✓  temp !3  scope ✗        │ 2 items hidden │ editing
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::core::status::InstrumentHealth;
use crate::tui::component::Component;
use crate::tui::theme::Theme;

pub struct StatusLine<'a> {
    pub health: &'a [(String, InstrumentHealth)],
    pub hidden_items: usize,
    pub editing: bool,
    pub theme: &'a Theme,
}

impl StatusLine<'_> {
    fn health_spans(&self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for (name, health) in self.health {
            let style = match health {
                InstrumentHealth::Ok => self.theme.ok(),
                InstrumentHealth::Failing { .. } => self.theme.warning(),
                InstrumentHealth::Stopped { .. } => self.theme.alert(),
            };
            spans.push(Span::styled(format!(" {name} "), self.theme.base()));
            spans.push(Span::styled(health.marker(), style));
            spans.push(Span::styled(" ", self.theme.base()));
        }
        spans
    }

    fn diagnostic_spans(&self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        if self.hidden_items > 0 {
            let noun = if self.hidden_items == 1 { "item" } else { "items" };
            spans.push(Span::styled(
                format!("│ {} {noun} hidden ", self.hidden_items),
                self.theme.warning(),
            ));
        }
        if self.editing {
            spans.push(Span::styled("│ editing ", self.theme.accent()));
        }
        spans
    }
}

impl Component for StatusLine<'_> {
    /// Diagnostics are pinned to the right edge. Health markers fill what is
    /// left and are the part cut off on narrow terminals.
    fn render(&self, buf: &mut Buffer, area: Rect) {
        buf.set_style(area, self.theme.base());
        let diagnostics = Line::from(self.diagnostic_spans());
        let reserved = u16::try_from(diagnostics.width())
            .unwrap_or(u16::MAX)
            .min(area.width);
        let health_area = Rect {
            width: area.width - reserved,
            ..area
        };
        let diagnostics_area = Rect {
            x: area.x + health_area.width,
            width: reserved,
            ..area
        };
        Line::from(self.health_spans()).render(health_area, buf);
        diagnostics.render(diagnostics_area, buf);
    }
}
