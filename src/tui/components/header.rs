//! # Header Bar
//!
//! Top row of the dashboard: application title on the left and, when
//! enabled, the current date and time centered.
//!
//! Purely presentational. The dashboard passes the clock text in as a prop
//! so the bar renders identically for identical input, and only redraws it
//! when the displayed second changes.
//!
//! ```rust,ignore
//! let header = HeaderBar::new("Bench 3".into(), Some(clock_text()), theme);
//! header.render(&mut scratch, area);
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::tui::component::Component;
use crate::tui::theme::Theme;

/// Format of the header clock.
pub const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct HeaderBar {
    pub title: String,
    /// `None` hides the clock.
    pub clock: Option<String>,
    pub style: Style,
}

impl HeaderBar {
    pub fn new(title: String, clock: Option<String>, theme: &Theme) -> Self {
        Self {
            title,
            clock,
            style: theme.header(),
        }
    }
}

impl Component for HeaderBar {
    fn render(&self, buf: &mut Buffer, area: Rect) {
        buf.set_style(area, self.style);
        Line::from(Span::raw(format!(" {}", self.title))).render(area, buf);
        if let Some(clock) = &self.clock {
            Line::from(clock.as_str()).centered().render(area, buf);
        }
    }
}
