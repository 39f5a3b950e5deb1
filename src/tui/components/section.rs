//! # Section
//!
//! A titled block of plain lines, used for the *Controls* and *Log* parts of
//! the chrome. The title row is a rule (`── Log ────`); lines that do not fit
//! are cut off at the bottom.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

use crate::tui::component::Component;
use crate::tui::theme::Theme;

pub struct Section<'a> {
    pub title: &'a str,
    pub lines: Vec<String>,
    pub theme: &'a Theme,
}

impl Component for Section<'_> {
    fn render(&self, buf: &mut Buffer, area: Rect) {
        buf.set_style(area, self.theme.base());
        let block = Block::new()
            .borders(Borders::TOP)
            .title(format!(" {} ", self.title))
            .title_style(self.theme.section_title())
            .border_style(self.theme.base());
        let lines: Vec<Line> = self
            .lines
            .iter()
            .map(|l| Line::from(format!(" {l}")))
            .collect();
        Paragraph::new(lines)
            .style(self.theme.base())
            .block(block)
            .render(area, buf);
    }
}
