//! # Switch
//!
//! `label [ON]` / `label [OFF]` reflecting a boolean key. Enter sends the
//! configured payload (default `{"cmd": "toggle"}`); the displayed state only
//! changes once the instrument publishes the new value.

use serde_json::{Value, json};

use crate::core::error::RenderError;
use crate::core::geometry::Size;
use crate::core::key::Key;
use crate::core::layout::Placement;
use crate::tui::component::{
    ActionRequest, Binding, Cell, DashboardItem, RenderContext, is_truthy, text_width,
};

pub struct Switch {
    id: String,
    binding: Binding,
    label: String,
    payload: Value,
    placement: Placement,
}

impl Switch {
    pub fn new(id: impl Into<String>, instrument: impl Into<String>, key: &str) -> Self {
        Self {
            id: id.into(),
            label: key.to_string(),
            binding: Binding::new(instrument, &[key]),
            payload: json!({ "cmd": "toggle" }),
            placement: Placement::Flow,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

impl DashboardItem for Switch {
    fn id(&self) -> &str {
        &self.id
    }

    fn binding(&self) -> Option<&Binding> {
        Some(&self.binding)
    }

    fn min_size(&self) -> Size {
        Size::new(1, text_width(&self.label).saturating_add(6))
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn focusable(&self) -> bool {
        true
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError> {
        let mut canvas = ctx.canvas();
        let col = canvas.text(0, 0, &format!("{} ", self.label), ctx.style());
        let key = self.binding.keys.first().map(String::as_str).unwrap_or_default();
        let (text, accent) = match ctx.value(key) {
            Some(v) if is_truthy(v) => ("[ON]", ctx.theme.ok()),
            Some(_) => ("[OFF]", ctx.theme.alert()),
            None => ("[--]", ctx.theme.base()),
        };
        canvas.text(0, col, text, ctx.highlight(accent));
        Ok(canvas.into_cells())
    }

    fn handle_key(&mut self, key: &Key) -> Option<ActionRequest> {
        match key {
            Key::Enter | Key::Char(' ') => Some(ActionRequest::new(self.payload.clone())),
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

    #[test]
    fn test_switch_shows_state() {
        let switch = Switch::new("power", "psu", "on").label("Power");
        let region = Region::new(0, 0, 1, 12);
        let theme = Theme::default();

        let on: DataMap = [("on".to_string(), json!(true))].into_iter().collect();
        let cells = switch.render(&context(region, &on, &theme)).unwrap();
        assert_eq!(row_of(&cells, region, 0).trim_end(), "Power [ON]");

        let off: DataMap = [("on".to_string(), json!(false))].into_iter().collect();
        let cells = switch.render(&context(region, &off, &theme)).unwrap();
        assert_eq!(row_of(&cells, region, 0).trim_end(), "Power [OFF]");
    }

    #[test]
    fn test_enter_emits_toggle() {
        let mut switch = Switch::new("power", "psu", "on");
        assert_eq!(
            switch.handle_key(&Key::Enter),
            Some(ActionRequest::new(json!({ "cmd": "toggle" })))
        );
        assert_eq!(switch.handle_key(&Key::Char('x')), None);
        assert!(!switch.captures_input());
    }

    #[test]
    fn test_custom_payload() {
        let mut switch = Switch::new("relay", "psu", "relay").payload(json!({ "cmd": "relay" }));
        assert_eq!(
            switch.handle_key(&Key::Enter).map(|r| r.payload),
            Some(json!({ "cmd": "relay" }))
        );
    }
}
