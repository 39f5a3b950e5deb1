//! # Geometry
//!
//! Cell-coordinate primitives shared by the layout manager, the items and the
//! terminal surface. Rows grow downwards, columns grow to the right, and
//! `(0, 0)` is the top-left cell of the terminal.

use ratatui::layout::Rect;

/// Terminal or item dimensions, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// A rectangular area of the terminal assigned to one item or chrome section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub row: u16,
    pub col: u16,
    pub height: u16,
    pub width: u16,
}

impl Region {
    pub const fn new(row: u16, col: u16, height: u16, width: u16) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    /// The whole surface of a terminal of the given size.
    pub fn of_size(size: Size) -> Self {
        Self::new(0, 0, size.rows, size.cols)
    }

    /// One past the last row.
    pub fn bottom(&self) -> u32 {
        u32::from(self.row) + u32::from(self.height)
    }

    /// One past the last column.
    pub fn right(&self) -> u32 {
        u32::from(self.col) + u32::from(self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    pub fn contains_cell(&self, row: u16, col: u16) -> bool {
        row >= self.row
            && col >= self.col
            && u32::from(row) < self.bottom()
            && u32::from(col) < self.right()
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Region) -> bool {
        other.row >= self.row
            && other.col >= self.col
            && other.bottom() <= self.bottom()
            && other.right() <= self.right()
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        u32::from(self.row) < other.bottom()
            && u32::from(other.row) < self.bottom()
            && u32::from(self.col) < other.right()
            && u32::from(other.col) < self.right()
    }

    /// Splits off `rows` rows from the top, returning `(top, rest)`.
    pub fn split_top(&self, rows: u16) -> (Region, Region) {
        let rows = rows.min(self.height);
        let top = Region::new(self.row, self.col, rows, self.width);
        let rest = Region::new(self.row + rows, self.col, self.height - rows, self.width);
        (top, rest)
    }

    /// Splits off `rows` rows from the bottom, returning `(rest, bottom)`.
    pub fn split_bottom(&self, rows: u16) -> (Region, Region) {
        let rows = rows.min(self.height);
        let rest = Region::new(self.row, self.col, self.height - rows, self.width);
        let bottom = Region::new(self.row + self.height - rows, self.col, rows, self.width);
        (rest, bottom)
    }
}

impl From<Region> for Rect {
    fn from(region: Region) -> Self {
        Rect::new(region.col, region.row, region.width, region.height)
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::new(rect.y, rect.x, rect.height, rect.width)
    }
}
