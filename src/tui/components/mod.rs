//! # TUI Components
//!
//! ## Dashboard Items
//!
//! Widgets the host binds to instrument data. Each implements
//! [`DashboardItem`](crate::tui::component::DashboardItem) and renders
//! through a `Canvas`:
//!
//! - `Label`: static text
//! - `Readonly`: one formatted value
//! - `Switch`: `[ON]`/`[OFF]`, Enter sends an action
//! - `Editable`: numeric entry committed as an action
//! - `Light`: green/red lamp
//! - `Gauge`: value with a horizontal bar
//!
//! ## Chrome
//!
//! Stateless, props-based sections owned by the dashboard itself. Each
//! implements [`Component`](crate::tui::component::Component) and draws with
//! ratatui widgets:
//!
//! - `HeaderBar`: title and clock
//! - `StatusLine`: instrument health and diagnostics
//! - `Section`: the *Controls* and *Log* blocks
//!
//! ```text
//! components/
//! ├── mod.rs          (this file)
//! ├── label.rs        ├── header.rs
//! ├── readonly.rs     ├── status_line.rs
//! ├── switch.rs       └── section.rs
//! ├── editable.rs
//! ├── light.rs
//! └── gauge.rs
//! ```

mod editable;
mod gauge;
mod header;
mod label;
mod light;
mod readonly;
mod section;
mod status_line;
mod switch;

pub use editable::Editable;
pub use gauge::Gauge;
pub use header::{CLOCK_FORMAT, HeaderBar};
pub use label::Label;
pub use light::Light;
pub use readonly::Readonly;
pub use section::Section;
pub use status_line::StatusLine;
pub use switch::Switch;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataMap, Key, Region};
    use crate::tui::component::DashboardItem;
    use crate::tui::component::test_helpers::context;
    use crate::tui::theme::Theme;
    use serde_json::json;

    fn render_twice(item: &dyn DashboardItem, region: Region, data: &DataMap) {
        let theme = Theme::default();
        let ctx = context(region, data, &theme);
        let first = item.render(&ctx).unwrap();
        let second = item.render(&ctx).unwrap();
        assert!(!first.is_empty(), "{} drew nothing", item.id());
        assert_eq!(first, second, "{} rendered differently", item.id());
    }

    #[test]
    fn test_rendering_same_context_twice_is_identical() {
        let data: DataMap = [
            ("v".to_string(), json!(12.345)),
            ("t".to_string(), json!(42.0)),
            ("on".to_string(), json!(true)),
            ("sp".to_string(), json!(21)),
        ]
        .into_iter()
        .collect();
        let region = Region::new(3, 4, 2, 30);

        render_twice(&Label::new("title", "Bench"), region, &data);
        render_twice(&Readonly::new("v", "psu", "v").decimals(2), region, &data);
        render_twice(&Switch::new("on", "psu", "on"), region, &data);
        render_twice(&Light::new("lamp", "psu", "on"), region, &data);
        render_twice(&Gauge::new("t", "temp", "t", 0.0, 100.0), region, &data);

        let mut field = Editable::new("sp", "temp", "sp", "set").decimals(1);
        render_twice(&field, region, &data);
        field.handle_key(&Key::Enter);
        field.handle_key(&Key::Char('3'));
        assert!(field.is_editing());
        render_twice(&field, region, &data);
    }
}
