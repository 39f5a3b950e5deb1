//! # Editable
//!
//! Numeric entry field. Shows the bound value until Enter starts editing;
//! while editing the field captures every key except Ctrl-C.
//!
//! | State   | Key              | Effect                                     |
//! |---------|------------------|--------------------------------------------|
//! | idle    | Enter            | start editing with an empty buffer         |
//! | editing | `0-9` `.` `-`    | append                                     |
//! | editing | Backspace        | delete last char                           |
//! | editing | Enter            | commit `{"cmd": action, "value": f64}`     |
//! | editing | Esc              | cancel                                     |
//!
//! A buffer that does not parse as a number cancels on commit.

use log::debug;
use serde_json::json;

use crate::core::error::RenderError;
use crate::core::geometry::Size;
use crate::core::key::Key;
use crate::core::layout::Placement;
use crate::tui::component::{
    ActionRequest, Binding, Cell, DashboardItem, RenderContext, format_value, text_width,
};

pub struct Editable {
    id: String,
    binding: Binding,
    label: String,
    action: String,
    decimals: Option<usize>,
    width: u16,
    placement: Placement,
    buffer: Option<String>,
}

impl Editable {
    /// `action` becomes the `cmd` of the committed payload.
    pub fn new(
        id: impl Into<String>,
        instrument: impl Into<String>,
        key: &str,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: key.to_string(),
            binding: Binding::new(instrument, &[key]),
            action: action.into(),
            decimals: None,
            width: 20,
            placement: Placement::Flow,
            buffer: None,
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

    pub fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    fn commit(&mut self) -> Option<ActionRequest> {
        let text = self.buffer.take()?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(ActionRequest::new(json!({
                "cmd": self.action,
                "value": value,
            }))),
            _ => {
                debug!("'{}' discarded unparsable input {:?}", self.id, text);
                None
            }
        }
    }
}

impl DashboardItem for Editable {
    fn id(&self) -> &str {
        &self.id
    }

    fn binding(&self) -> Option<&Binding> {
        Some(&self.binding)
    }

    fn min_size(&self) -> Size {
        Size::new(1, self.width.max(text_width(&self.label).saturating_add(4)))
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn focusable(&self) -> bool {
        true
    }

    fn captures_input(&self) -> bool {
        self.is_editing()
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError> {
        let mut canvas = ctx.canvas();
        let col = canvas.text(0, 0, &format!("{}: ", self.label), ctx.style());
        match &self.buffer {
            Some(buffer) => {
                let col = col + canvas.text(0, col, buffer, ctx.highlight(ctx.theme.warning()));
                canvas.text(0, col, "_", ctx.highlight(ctx.theme.warning()));
            }
            None => {
                let key = self.binding.keys.first().map(String::as_str).unwrap_or_default();
                let value = format_value(ctx.value(key), self.decimals);
                canvas.text(0, col, &value, ctx.highlight(ctx.theme.accent()));
            }
        }
        Ok(canvas.into_cells())
    }

    fn handle_key(&mut self, key: &Key) -> Option<ActionRequest> {
        let Some(buffer) = self.buffer.as_mut() else {
            if *key == Key::Enter {
                self.buffer = Some(String::new());
            }
            return None;
        };

        match key {
            Key::Char(c) if c.is_ascii_digit() || *c == '.' || *c == '-' => {
                buffer.push(*c);
                None
            }
            Key::Backspace => {
                buffer.pop();
                None
            }
            Key::Enter => self.commit(),
            Key::Esc => {
                self.buffer = None;
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Region;
    use crate::core::instrument::DataMap;
    use crate::tui::component::test_helpers::{context, row_of};
    use crate::tui::theme::Theme;

    fn type_keys(field: &mut Editable, keys: &[Key]) -> Vec<Option<ActionRequest>> {
        keys.iter().map(|k| field.handle_key(k)).collect()
    }

    #[test]
    fn test_commit_sends_number() {
        let mut field = Editable::new("sp", "temp", "setpoint", "set_setpoint");
        let results = type_keys(
            &mut field,
            &[
                Key::Enter,
                Key::Char('2'),
                Key::Char('x'),
                Key::Char('2'),
                Key::Char('.'),
                Key::Char('5'),
                Key::Enter,
            ],
        );
        assert_eq!(
            results.last().cloned().flatten(),
            Some(ActionRequest::new(json!({ "cmd": "set_setpoint", "value": 22.5 })))
        );
        assert!(!field.is_editing());
    }

    #[test]
    fn test_editing_captures_input() {
        let mut field = Editable::new("sp", "temp", "setpoint", "set");
        assert!(!field.captures_input());
        field.handle_key(&Key::Enter);
        assert!(field.captures_input());
        assert_eq!(field.handle_key(&Key::Char('q')), None);
        assert!(field.is_editing());
    }

    #[test]
    fn test_escape_cancels() {
        let mut field = Editable::new("sp", "temp", "setpoint", "set");
        type_keys(&mut field, &[Key::Enter, Key::Char('1'), Key::Esc]);
        assert!(!field.is_editing());
    }

    #[test]
    fn test_unparsable_buffer_cancels() {
        let mut field = Editable::new("sp", "temp", "setpoint", "set");
        let keys = [Key::Enter, Key::Char('-'), Key::Char('.'), Key::Enter];
        let results = type_keys(&mut field, &keys);
        assert!(results.iter().all(Option::is_none));
        assert!(!field.is_editing());
    }

    #[test]
    fn test_backspace_deletes() {
        let mut field = Editable::new("sp", "temp", "setpoint", "set");
        let results = type_keys(
            &mut field,
            &[Key::Enter, Key::Char('4'), Key::Char('9'), Key::Backspace, Key::Enter],
        );
        assert_eq!(
            results.last().cloned().flatten().map(|r| r.payload["value"].clone()),
            Some(json!(4.0))
        );
    }

    #[test]
    fn test_render_shows_value_then_buffer() {
        let mut field = Editable::new("sp", "temp", "setpoint", "set")
            .label("Setpoint")
            .decimals(1);
        let region = Region::new(0, 0, 1, 20);
        let theme = Theme::default();
        let data: DataMap = [("setpoint".to_string(), json!(21))].into_iter().collect();

        let cells = field.render(&context(region, &data, &theme)).unwrap();
        assert_eq!(row_of(&cells, region, 0).trim_end(), "Setpoint: 21.0");

        type_keys(&mut field, &[Key::Enter, Key::Char('3')]);
        let cells = field.render(&context(region, &data, &theme)).unwrap();
        assert_eq!(row_of(&cells, region, 0).trim_end(), "Setpoint: 3_");
    }
}
