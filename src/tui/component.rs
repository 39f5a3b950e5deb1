use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::core::error::RenderError;
use crate::core::geometry::{Region, Size};
use crate::core::instrument::DataMap;
use crate::core::key::Key;
use crate::core::layout::Placement;
use crate::tui::theme::Theme;

/// One styled terminal cell in absolute surface coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: u16,
    pub col: u16,
    pub symbol: String,
    pub style: Style,
}

/// Which instrument an item reads from, and which of its keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub instrument: String,
    /// Empty means every key of the instrument.
    pub keys: Vec<String>,
}

impl Binding {
    pub fn new(instrument: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            instrument: instrument.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Whether any key in `changed` is one this binding displays.
    pub fn watches(&self, changed: &DataMap) -> bool {
        self.keys.is_empty() || self.keys.iter().any(|k| changed.contains_key(k))
    }
}

/// Payload an item asks to deliver to its instrument's `action()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub payload: Value,
}

impl ActionRequest {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }
}

/// Everything an item may look at while rendering.
pub struct RenderContext<'a> {
    pub region: Region,
    pub data: &'a DataMap,
    pub focused: bool,
    /// The bound instrument has stopped polling.
    pub stale: bool,
    pub theme: &'a Theme,
}

impl RenderContext<'_> {
    /// Value for `key`, treating `null` as missing.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// Base style for this item: stale wins over focused.
    pub fn style(&self) -> Style {
        if self.stale {
            self.theme.stale()
        } else if self.focused {
            self.theme.focused()
        } else {
            self.theme.base()
        }
    }

    /// `accent` unless the item is stale, so stale items stay uniformly dim.
    pub fn highlight(&self, accent: Style) -> Style {
        if self.stale { self.theme.stale() } else { accent }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.region, self.style())
    }
}

/// A widget bound to an instrument.
///
/// `render` must be a pure function of the context: the same region, data,
/// flags and theme always produce the same cells. `handle_key` may change only
/// the item's own transient state (e.g. an edit buffer).
pub trait DashboardItem: Send {
    /// Unique within a dashboard.
    fn id(&self) -> &str;

    /// `None` for static items such as labels.
    fn binding(&self) -> Option<&Binding>;

    fn min_size(&self) -> Size;

    fn placement(&self) -> Placement {
        Placement::Flow
    }

    fn focusable(&self) -> bool {
        false
    }

    /// While true, focus, quit and invert keys are delivered to the item.
    fn captures_input(&self) -> bool {
        false
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Cell>, RenderError>;

    fn handle_key(&mut self, _key: &Key) -> Option<ActionRequest> {
        None
    }
}

/// A dashboard-owned section (header, status line, controls, log), drawn with
/// ratatui widgets into a scratch buffer.
pub trait Component {
    fn render(&self, buf: &mut Buffer, area: Rect);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Drawing area for one item. Everything written is clipped to the region.
pub struct Canvas {
    buf: Buffer,
}

impl Canvas {
    /// A region filled with blanks in `style`.
    pub fn new(region: Region, style: Style) -> Self {
        let area: Rect = region.into();
        let mut buf = Buffer::empty(area);
        buf.set_style(area, style);
        Self { buf }
    }

    pub fn width(&self) -> u16 {
        self.buf.area.width
    }

    pub fn height(&self) -> u16 {
        self.buf.area.height
    }

    /// Writes `text` at a position relative to the region. Returns the
    /// columns actually written.
    pub fn text(&mut self, row: u16, col: u16, text: &str, style: Style) -> u16 {
        if row >= self.height() || col >= self.width() {
            return 0;
        }
        let area = self.buf.area;
        let max_width = usize::from(self.width() - col);
        let (end_x, _) =
            self.buf
                .set_stringn(area.x + col, area.y + row, text, max_width, style);
        end_x.saturating_sub(area.x + col)
    }

    pub fn aligned(&mut self, row: u16, text: &str, align: Align, style: Style) -> u16 {
        let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
        let free = self.width().saturating_sub(width);
        let col = match align {
            Align::Left => 0,
            Align::Center => free / 2,
            Align::Right => free,
        };
        self.text(row, col, text, style)
    }

    /// Repeats `symbol` over `width` columns starting at `col`.
    pub fn fill(&mut self, row: u16, col: u16, width: u16, symbol: &str, style: Style) {
        let end = col.saturating_add(width).min(self.width());
        for c in col..end {
            self.text(row, c, symbol, style);
        }
    }

    pub fn into_cells(self) -> Vec<Cell> {
        let area = self.buf.area;
        let mut cells = Vec::with_capacity(usize::from(area.width) * usize::from(area.height));
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = self.buf.cell((x, y)) {
                    cells.push(Cell {
                        row: y,
                        col: x,
                        symbol: cell.symbol().to_string(),
                        style: cell.style(),
                    });
                }
            }
        }
        cells
    }
}

/// Display form of a data value. Missing or `null` renders as `--`.
pub fn format_value(value: Option<&Value>, decimals: Option<usize>) -> String {
    match value {
        None | Some(Value::Null) => "--".to_string(),
        Some(Value::Number(n)) => match (decimals, n.as_f64()) {
            (Some(d), Some(f)) => format!("{f:.d$}"),
            _ => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| format_value(Some(v), decimals))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Truthiness used by lights and switches.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Display width of `text` in terminal columns.
pub fn text_width(text: &str) -> u16 {
    u16::try_from(text.width()).unwrap_or(u16::MAX)
}


#[cfg(test)]
mod tests {
    use super::test_helpers::row_of;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value_variants() {
        assert_eq!(format_value(None, None), "--");
        assert_eq!(format_value(Some(&Value::Null), Some(2)), "--");
        assert_eq!(format_value(Some(&json!(21)), None), "21");
        assert_eq!(format_value(Some(&json!(3.14159)), Some(2)), "3.14");
        assert_eq!(format_value(Some(&json!("idle")), None), "idle");
        assert_eq!(format_value(Some(&json!([1.0, 2.5])), Some(1)), "1.0, 2.5");
        assert_eq!(format_value(Some(&json!(true)), None), "true");
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn test_canvas_clips_to_region() {
        let region = Region::new(2, 5, 1, 4);
        let mut canvas = Canvas::new(region, Style::default());
        let written = canvas.text(0, 1, "overflow", Style::default());
        assert_eq!(written, 3);
        assert_eq!(canvas.text(1, 0, "below", Style::default()), 0);

        let cells = canvas.into_cells();
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|c| region.contains_cell(c.row, c.col)));
        assert_eq!(row_of(&cells, region, 0), " ove");
    }

    #[test]
    fn test_canvas_alignment() {
        let region = Region::new(0, 0, 1, 9);
        let mut canvas = Canvas::new(region, Style::default());
        canvas.aligned(0, "abc", Align::Center, Style::default());
        assert_eq!(row_of(&canvas.into_cells(), region, 0), "   abc   ");

        let mut canvas = Canvas::new(region, Style::default());
        canvas.aligned(0, "abc", Align::Right, Style::default());
        assert_eq!(row_of(&canvas.into_cells(), region, 0), "      abc");
    }

    #[test]
    fn test_canvas_wide_glyphs_measured_by_width() {
        assert_eq!(text_width("温度"), 4);
        let region = Region::new(0, 0, 1, 3);
        let mut canvas = Canvas::new(region, Style::default());
        assert_eq!(canvas.text(0, 0, "温度", Style::default()), 2);
    }

    #[test]
    fn test_binding_watches() {
        let changed: DataMap = [("t".to_string(), json!(21))].into_iter().collect();
        assert!(Binding::new("temp", &["t"]).watches(&changed));
        assert!(!Binding::new("temp", &["setpoint"]).watches(&changed));
        assert!(Binding::new("temp", &[]).watches(&changed));
    }

    #[test]
    fn test_stale_style_wins_over_focus() {
        let theme = Theme::default();
        let data = DataMap::new();
        let ctx = RenderContext {
            region: Region::new(0, 0, 1, 1),
            data: &data,
            focused: true,
            stale: true,
            theme: &theme,
        };
        assert_eq!(ctx.style(), theme.stale());
    }
}
