//! Declarative marker templates.
//!
//! A [`Pattern`] describes what a marker printed on a receipt looks like:
//! individual pixels that must be black or white, an optional uniform border,
//! and bounds on the fraction of black pixels. It says nothing about where
//! the marker is; see the search functions for that.

use std::collections::BTreeMap;

use crate::bitmap::resolve_index;
use crate::rect::{Point, Rect};
use crate::view::Raster;

/// Required colour of a constrained pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Pixel value as stored in a bitmap.
    pub fn value(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn from_value(value: u8) -> Self {
        if value != 0 {
            Color::Black
        } else {
            Color::White
        }
    }
}

/// Template of pixel constraints.
///
/// Built with consuming setters:
///
/// ```
/// use epos_raster::{Pattern, Rect};
///
/// // A 40x8 black bar with a white line above it
/// let bar = Pattern::new(40, 9)
///     .white_rows(&[0])
///     .black_area(Rect::new(0, 1, 40, 9))
///     .search_area(Rect::new(0, -200, i32::MAX, i32::MAX))
///     .from_bottom(true);
/// assert_eq!(bar.constraint_count(), 360);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    width: u32,
    height: u32,
    points: BTreeMap<Point, Color>,
    ratio_lower: f64,
    ratio_upper: f64,
    border_width: u32,
    search_area: Option<Rect>,
    from_bottom: bool,
}

impl Pattern {
    /// Unconstrained pattern of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Pattern {
            width,
            height,
            points: BTreeMap::new(),
            ratio_lower: 0.0,
            ratio_upper: 1.0,
            border_width: 0,
            search_area: None,
            from_bottom: false,
        }
    }

    /// Pattern that requires every pixel to equal the pixels of `template`.
    pub fn from_raster<R: Raster + ?Sized>(template: &R) -> Self {
        let mut pattern = Pattern::new(template.width(), template.height());
        for y in 0..template.height() as i32 {
            for x in 0..template.width() as i32 {
                let color = Color::from_value(template.pixel(x, y));
                pattern.points.insert(Point::new(x, y), color);
            }
        }
        pattern
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rectangle of a match at `origin`.
    pub fn rect_at(&self, origin: Point) -> Rect {
        Rect::from_size(origin.x, origin.y, self.width as i32, self.height as i32)
    }

    pub fn constraint_count(&self) -> usize {
        self.points.len()
    }

    /// Constraint on pattern pixel `(x, y)`, if any.
    pub fn color_at(&self, x: i32, y: i32) -> Option<Color> {
        let x = resolve_index(x, self.width);
        let y = resolve_index(y, self.height);
        self.points.get(&Point::new(x, y)).copied()
    }

    pub fn border_width(&self) -> u32 {
        self.border_width
    }

    /// Inclusive `(lower, upper)` bounds on the black ratio.
    pub fn ratio_bounds(&self) -> (f64, f64) {
        (self.ratio_lower, self.ratio_upper)
    }

    pub fn is_from_bottom(&self) -> bool {
        self.from_bottom
    }

    pub(crate) fn raw_search_area(&self) -> Option<Rect> {
        self.search_area
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    fn constrain(&mut self, x: i32, y: i32, color: Color) {
        let x = resolve_index(x, self.width);
        let y = resolve_index(y, self.height);
        if self.contains(x, y) {
            self.points.insert(Point::new(x, y), color);
        }
    }

    fn constrain_area(mut self, area: Rect, color: Color) -> Self {
        let bounds = Rect::new(0, 0, self.width as i32, self.height as i32);
        let area = area.intersect(&bounds);
        for y in area.y0..area.y1 {
            for x in area.x0..area.x1 {
                self.points.insert(Point::new(x, y), color);
            }
        }
        self
    }

    /// Require pixel `(x, y)` to have `color`. Negative coordinates count
    /// from the pattern's right and bottom edges; points outside the pattern
    /// are ignored.
    pub fn point(mut self, x: i32, y: i32, color: Color) -> Self {
        self.constrain(x, y, color);
        self
    }

    pub fn black_point(self, x: i32, y: i32) -> Self {
        self.point(x, y, Color::Black)
    }

    pub fn white_point(self, x: i32, y: i32) -> Self {
        self.point(x, y, Color::White)
    }

    pub fn black_points(mut self, points: &[(i32, i32)]) -> Self {
        for &(x, y) in points {
            self.constrain(x, y, Color::Black);
        }
        self
    }

    pub fn white_points(mut self, points: &[(i32, i32)]) -> Self {
        for &(x, y) in points {
            self.constrain(x, y, Color::White);
        }
        self
    }

    fn rows(mut self, rows: &[i32], color: Color) -> Self {
        for &y in rows {
            for x in 0..self.width as i32 {
                self.constrain(x, y, color);
            }
        }
        self
    }

    fn columns(mut self, columns: &[i32], color: Color) -> Self {
        for &x in columns {
            for y in 0..self.height as i32 {
                self.constrain(x, y, color);
            }
        }
        self
    }

    /// Require whole rows to be black.
    pub fn black_rows(self, rows: &[i32]) -> Self {
        self.rows(rows, Color::Black)
    }

    /// Require whole rows to be white.
    pub fn white_rows(self, rows: &[i32]) -> Self {
        self.rows(rows, Color::White)
    }

    pub fn black_columns(self, columns: &[i32]) -> Self {
        self.columns(columns, Color::Black)
    }

    pub fn white_columns(self, columns: &[i32]) -> Self {
        self.columns(columns, Color::White)
    }

    /// Require every pixel of `area` (clipped to the pattern) to be black.
    pub fn black_area(self, area: Rect) -> Self {
        self.constrain_area(area, Color::Black)
    }

    pub fn white_area(self, area: Rect) -> Self {
        self.constrain_area(area, Color::White)
    }

    /// Constrain a ring `width` pixels thick along the pattern edges.
    pub fn border_ring(mut self, width: u32, color: Color) -> Self {
        let (w, h, b) = (self.width as i32, self.height as i32, width as i32);
        for y in 0..h {
            for x in 0..w {
                if x < b || y < b || x >= w - b || y >= h - b {
                    self.points.insert(Point::new(x, y), color);
                }
            }
        }
        self
    }

    /// Drop every constraint inside `area`.
    pub fn delete_area(mut self, area: Rect) -> Self {
        self.points.retain(|p, _| !area.contains(p.x, p.y));
        self
    }

    /// Require a ring `width` pixels thick to be one colour, whichever colour
    /// the top-left pixel of the match has. `0` disables the check.
    pub fn uniform_border(self, width: u32) -> Self {
        Pattern {
            border_width: width,
            ..self
        }
    }

    /// Inclusive bounds on the fraction of black pixels over the whole
    /// pattern. Values are clamped to `0.0..=1.0`.
    pub fn black_ratio(self, lower: f64, upper: f64) -> Self {
        Pattern {
            ratio_lower: lower.clamp(0.0, 1.0),
            ratio_upper: upper.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Restrict searching to `area` of the target. Negative coordinates
    /// count from the target's right and bottom edges and the area is
    /// clipped to the target, so `i32::MAX` reaches the far edge.
    pub fn search_area(self, area: Rect) -> Self {
        Pattern {
            search_area: Some(area),
            ..self
        }
    }

    /// Scan rows bottom to top.
    pub fn from_bottom(self, flag: bool) -> Self {
        Pattern {
            from_bottom: flag,
            ..self
        }
    }

    fn has_ratio_bounds(&self) -> bool {
        self.ratio_lower > 0.0 || self.ratio_upper < 1.0
    }

    fn border_matches<R: Raster + ?Sized>(&self, target: &R, ox: i32, oy: i32) -> bool {
        let (w, h, b) = (self.width as i32, self.height as i32, self.border_width as i32);
        let reference = target.pixel(ox, oy);
        for y in 0..h {
            if y < b || y >= h - b {
                if (0..w).any(|x| target.pixel(ox + x, oy + y) != reference) {
                    return false;
                }
            } else {
                let edges = (0..b.min(w)).chain((w - b).max(0)..w);
                for x in edges {
                    if target.pixel(ox + x, oy + y) != reference {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Compares the black fraction itself against the bounds, inclusively.
    /// Scanning stops once the fraction is certain to fall outside them.
    fn ratio_matches<R: Raster + ?Sized>(&self, target: &R, ox: i32, oy: i32) -> bool {
        let total = (self.width as usize * self.height as usize) as f64;
        let mut black = 0usize;
        let mut remaining = self.width as usize * self.height as usize;
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                remaining -= 1;
                if target.pixel(ox + x, oy + y) != 0 {
                    black += 1;
                    if black as f64 / total > self.ratio_upper {
                        return false;
                    }
                }
                if ((black + remaining) as f64 / total) < self.ratio_lower {
                    return false;
                }
            }
        }
        true
    }

    /// `true` if the pattern matches `target` with its top-left corner at
    /// `(ox, oy)`.
    ///
    /// Checks run cheapest first: the pattern must fit, then each point
    /// constraint, then the uniform border, then the black ratio.
    pub fn is_match_at<R: Raster + ?Sized>(&self, target: &R, ox: i32, oy: i32) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        if ox < 0
            || oy < 0
            || ox as i64 + self.width as i64 > target.width() as i64
            || oy as i64 + self.height as i64 > target.height() as i64
        {
            return false;
        }
        for (p, color) in &self.points {
            if target.pixel(ox + p.x, oy + p.y) != color.value() {
                return false;
            }
        }
        if self.border_width > 0 && !self.border_matches(target, ox, oy) {
            return false;
        }
        if self.has_ratio_bounds() && !self.ratio_matches(target, ox, oy) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;

    fn target() -> Bitmap {
        // 16x6 with a 4x2 black block at (6, 2)
        let mut img = Bitmap::new(16, 6);
        for y in 2..4 {
            for x in 6..10 {
                img.set_black(x, y);
            }
        }
        img
    }

    #[test]
    fn test_negative_points_resolve_at_build_time() {
        let p = Pattern::new(4, 3).black_point(-1, -1).white_point(9, 9);
        assert_eq!(p.constraint_count(), 1);
        assert_eq!(p.color_at(3, 2), Some(Color::Black));
        assert_eq!(p.color_at(-1, -1), Some(Color::Black));
    }

    #[test]
    fn test_rows_columns_and_areas() {
        let p = Pattern::new(4, 3).black_rows(&[0]).white_columns(&[-1]);
        // Column 3 overrides the black corner of row 0
        assert_eq!(p.constraint_count(), 6);
        assert_eq!(p.color_at(3, 0), Some(Color::White));

        let ring = Pattern::new(5, 5)
            .border_ring(1, Color::White)
            .black_area(Rect::new(1, 1, 4, 4))
            .delete_area(Rect::new(2, 2, 3, 3));
        assert_eq!(ring.constraint_count(), 24);
        assert_eq!(ring.color_at(2, 2), None);
        assert_eq!(ring.color_at(0, 4), Some(Color::White));
    }

    #[test]
    fn test_match_points() {
        let img = target();
        let block = Pattern::new(4, 2).black_area(Rect::new(0, 0, 4, 2));
        assert!(block.is_match_at(&img, 6, 2));
        assert!(!block.is_match_at(&img, 5, 2));
        // Does not fit
        assert!(!block.is_match_at(&img, 13, 2));
        assert!(!block.is_match_at(&img, -1, 2));
    }

    #[test]
    fn test_reflexive_and_sensitive_to_flips() {
        let img = target();
        let view = img.select(Rect::new(4, 1, 12, 5)).unwrap();
        let p = Pattern::from_raster(&view);
        assert!(p.is_match_at(&img, 4, 1));

        let mut flipped = img.clone();
        flipped.set_pixel(7, 3, 0);
        assert!(!p.is_match_at(&flipped, 4, 1));
    }

    #[test]
    fn test_uniform_border_uses_top_left_colour() {
        let img = target();
        let framed = Pattern::new(6, 4).uniform_border(1);
        assert!(framed.is_match_at(&img, 5, 1));
        assert!(!framed.is_match_at(&img, 6, 1));

        let mut black = Bitmap::new(8, 8);
        black.select_mut(Rect::new(0, 0, 8, 8)).unwrap().fill_black();
        black.set_white(3, 3);
        assert!(Pattern::new(8, 8).uniform_border(2).is_match_at(&black, 0, 0));
        assert!(!Pattern::new(8, 8).uniform_border(4).is_match_at(&black, 0, 0));
    }

    #[test]
    fn test_black_ratio_bounds() {
        let img = target();
        // 8 of 16 pixels black
        let half = Pattern::new(4, 4).black_ratio(0.5, 0.5);
        assert!(half.is_match_at(&img, 6, 0));
        assert!(!half.is_match_at(&img, 4, 2));
        assert!(!Pattern::new(4, 4).black_ratio(0.6, 1.0).is_match_at(&img, 6, 0));
        assert!(Pattern::new(4, 4).black_ratio(0.0, 0.0).is_match_at(&img, 0, 0));
    }

    #[test]
    fn test_black_ratio_bounds_are_inclusive() {
        let mut img = Bitmap::new(16, 10);
        for i in 0..29 {
            img.set_black(i % 10, i / 10);
        }
        assert_eq!(img.black_count(), 29);
        assert!(Pattern::new(10, 10).black_ratio(0.0, 0.29).is_match_at(&img, 0, 0));
        assert!(Pattern::new(10, 10).black_ratio(0.29, 1.0).is_match_at(&img, 0, 0));
        assert!(!Pattern::new(10, 10).black_ratio(0.0, 0.28).is_match_at(&img, 0, 0));
        assert!(!Pattern::new(10, 10).black_ratio(0.3, 1.0).is_match_at(&img, 0, 0));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(!Pattern::new(0, 4).is_match_at(&target(), 0, 0));
    }
}
