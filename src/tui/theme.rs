use ratatui::style::{Color, Modifier, Style};

/// Styles shared by items and chrome. `inverted` swaps to dark-on-light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Theme {
    pub inverted: bool,
}

impl Theme {
    pub fn toggle(&mut self) {
        self.inverted = !self.inverted;
    }

    pub fn base(&self) -> Style {
        if self.inverted {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default().fg(Color::Reset).bg(Color::Reset)
        }
    }

    pub fn focused(&self) -> Style {
        self.base().add_modifier(Modifier::REVERSED)
    }

    /// Items whose instrument has stopped.
    pub fn stale(&self) -> Style {
        self.base().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    }

    pub fn header(&self) -> Style {
        self.base().add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    pub fn section_title(&self) -> Style {
        self.base().add_modifier(Modifier::BOLD)
    }

    pub fn ok(&self) -> Style {
        self.base().fg(Color::Green)
    }

    pub fn alert(&self) -> Style {
        self.base().fg(Color::Red)
    }

    pub fn warning(&self) -> Style {
        self.base().fg(Color::Yellow)
    }

    pub fn accent(&self) -> Style {
        if self.inverted {
            self.base().fg(Color::Blue)
        } else {
            self.base().fg(Color::Cyan)
        }
    }
}
