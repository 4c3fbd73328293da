#![forbid(unsafe_code)]

//! Cell geometry for grid placement.
//!
//! All coordinates are whole grid cells with the origin at the top-left and
//! `y` growing downward. Edges follow half-open interval semantics: a rect
//! covers columns `x..x + w` and rows `y..y + h`.

use serde::{Deserialize, Serialize};

/// A rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    /// Left column (inclusive).
    pub x: u16,
    /// Top row (inclusive).
    pub y: u16,
    /// Width in columns.
    pub w: u16,
    /// Height in rows.
    pub h: u16,
}

impl GridRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// A `w x h` rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(w: u16, h: u16) -> Self {
        Self::new(0, 0, w, h)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.h)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.w as u32 * self.h as u32
    }

    /// Check if the rectangle covers no cells.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Same size, moved to `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn at(self, x: u16, y: u16) -> Self {
        Self::new(x, y, self.w, self.h)
    }

    /// Same rectangle, moved to row `y`.
    #[inline]
    #[must_use]
    pub const fn with_y(self, y: u16) -> Self {
        Self::new(self.x, y, self.w, self.h)
    }

    /// Check whether two rectangles share at least one cell.
    #[inline]
    pub const fn intersects(&self, other: &GridRect) -> bool {
        intersects(self, other)
    }

    /// Check whether two rectangles overlap or share an edge or corner.
    ///
    /// Equivalent to intersecting `other` grown by half a cell on every side.
    #[inline]
    pub const fn is_touching(&self, other: &GridRect) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// Check if every cell of `other` lies inside this rectangle.
    #[inline]
    pub const fn contains_rect(&self, other: &GridRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if the cell at `(x, y)` is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Compute the overlap with another rectangle, returning `None` if they
    /// share no cell.
    #[inline]
    pub fn intersection(&self, other: &GridRect) -> Option<GridRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(GridRect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Number of cells shared with `other`.
    #[inline]
    pub fn overlap_area(&self, other: &GridRect) -> u32 {
        self.intersection(other).map_or(0, |r| r.area())
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &GridRect) -> GridRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        GridRect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    /// Raster index of the top-left cell on a grid `column` cells wide.
    #[inline]
    pub const fn raster_index(&self, column: u16) -> u64 {
        self.y as u64 * column as u64 + self.x as u64
    }
}

/// Half-open overlap test on both axes.
#[inline]
pub const fn intersects(a: &GridRect, b: &GridRect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}
