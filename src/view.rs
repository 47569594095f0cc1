//! Rectangular windows onto a bitmap.
//!
//! A [`View`] borrows its owner and never copies pixels; local coordinates
//! are translated to the owner by the view's origin. [`ViewMut`] is the
//! writable form and holds the owner's unique borrow for as long as it
//! lives, so a view can neither outlive its bitmap nor race a mutation.

use crate::bitmap::{resolve_index, Bitmap};
use crate::rect::{Point, Rect};

/// Read access to a monochrome raster.
///
/// Pattern matching, segmentation and glyph recognition work against this
/// trait so they can run on a whole bitmap or on any window of one.
pub trait Raster {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// `1` for black, `0` for white. Negative coordinates count from the far
    /// edge; anything outside reads as white.
    fn pixel(&self, x: i32, y: i32) -> u8;

    fn black_count(&self) -> usize {
        let mut count = 0;
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                count += self.pixel(x, y) as usize;
            }
        }
        count
    }

    /// Fraction of black pixels, `0.0` when there are no pixels.
    fn black_ratio(&self) -> f64 {
        let total = self.width() as usize * self.height() as usize;
        if total == 0 {
            return 0.0;
        }
        self.black_count() as f64 / total as f64
    }

    /// Materialize the pixels into a standalone bitmap.
    fn to_bitmap(&self) -> Bitmap {
        let mut out = Bitmap::new(self.width(), self.height());
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                if self.pixel(x, y) != 0 {
                    out.set_black(x, y);
                }
            }
        }
        out
    }
}

impl Raster for Bitmap {
    fn width(&self) -> u32 {
        Bitmap::width(self)
    }

    fn height(&self) -> u32 {
        Bitmap::height(self)
    }

    fn pixel(&self, x: i32, y: i32) -> u8 {
        Bitmap::pixel(self, x, y)
    }

    fn black_count(&self) -> usize {
        Bitmap::black_count(self)
    }

    fn black_ratio(&self) -> f64 {
        Bitmap::black_ratio(self)
    }

    fn to_bitmap(&self) -> Bitmap {
        self.clone()
    }
}

fn bounds_of(owner: &Bitmap) -> Rect {
    Rect::new(0, 0, owner.width() as i32, owner.height() as i32)
}

fn local_pixel(owner: &Bitmap, area: &Rect, x: i32, y: i32) -> u8 {
    let x = resolve_index(x, area.width() as u32);
    let y = resolve_index(y, area.height() as u32);
    if x < 0 || y < 0 || x >= area.width() || y >= area.height() {
        return 0;
    }
    owner.pixel(area.x0 + x, area.y0 + y)
}

fn copy_area(owner: &Bitmap, area: &Rect) -> Bitmap {
    match owner.with_crop(area.x0, area.y0, area.width(), area.height()) {
        Some(mut img) => {
            img.set_align(owner.align());
            img
        }
        None => Bitmap::new(0, 0),
    }
}

/// Read-only window onto a bitmap.
#[derive(Clone, Copy)]
pub struct View<'a> {
    owner: &'a Bitmap,
    area: Rect,
}

impl<'a> View<'a> {
    /// Window onto `area` of `owner`, clipped to the owner. `None` if the
    /// clipped area is empty.
    pub fn new(owner: &'a Bitmap, area: Rect) -> Option<Self> {
        let area = area.intersect(&bounds_of(owner));
        if area.is_empty() {
            return None;
        }
        Some(View { owner, area })
    }

    pub fn owner(&self) -> &'a Bitmap {
        self.owner
    }

    /// Area covered, in owner coordinates.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Sub-window. `area` is in this view's local coordinates and is clipped
    /// to this view.
    pub fn select(&self, area: Rect) -> Option<View<'a>> {
        let area = area.translate(self.area.x0, self.area.y0).intersect(&self.area);
        if area.is_empty() {
            return None;
        }
        Some(View {
            owner: self.owner,
            area,
        })
    }

    pub fn global_x(&self, x: i32) -> i32 {
        x + self.area.x0
    }

    pub fn global_y(&self, y: i32) -> i32 {
        y + self.area.y0
    }

    pub fn global_point(&self, x: i32, y: i32) -> Point {
        Point::new(self.global_x(x), self.global_y(y))
    }
}

impl Raster for View<'_> {
    fn width(&self) -> u32 {
        self.area.width() as u32
    }

    fn height(&self) -> u32 {
        self.area.height() as u32
    }

    fn pixel(&self, x: i32, y: i32) -> u8 {
        local_pixel(self.owner, &self.area, x, y)
    }

    fn to_bitmap(&self) -> Bitmap {
        copy_area(self.owner, &self.area)
    }
}

impl std::fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "View{}", self.area)
    }
}

/// Writable window onto a bitmap.
pub struct ViewMut<'a> {
    owner: &'a mut Bitmap,
    area: Rect,
}

impl<'a> ViewMut<'a> {
    pub fn new(owner: &'a mut Bitmap, area: Rect) -> Option<Self> {
        let area = area.intersect(&bounds_of(owner));
        if area.is_empty() {
            return None;
        }
        Some(ViewMut { owner, area })
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Read-only view of the same area.
    pub fn as_view(&self) -> View<'_> {
        View {
            owner: &*self.owner,
            area: self.area,
        }
    }

    /// Writable sub-window, reborrowing this one.
    pub fn select(&mut self, area: Rect) -> Option<ViewMut<'_>> {
        let area = area.translate(self.area.x0, self.area.y0).intersect(&self.area);
        if area.is_empty() {
            return None;
        }
        Some(ViewMut {
            owner: &mut *self.owner,
            area,
        })
    }

    /// Set a pixel in local coordinates. Pixels outside the view are left
    /// alone, even if they exist in the owner.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        let x = resolve_index(x, self.area.width() as u32);
        let y = resolve_index(y, self.area.height() as u32);
        if x < 0 || y < 0 || x >= self.area.width() || y >= self.area.height() {
            return;
        }
        self.owner.set_pixel(self.area.x0 + x, self.area.y0 + y, value);
    }

    pub fn fill_black(&mut self) {
        self.owner.fill_rect(self.area, 1);
    }

    pub fn fill_white(&mut self) {
        self.owner.fill_rect(self.area, 0);
    }

    /// Swap black and white inside the view.
    pub fn invert(&mut self) {
        for y in self.area.y0..self.area.y1 {
            for x in self.area.x0..self.area.x1 {
                let value = self.owner.pixel(x, y);
                self.owner.set_pixel(x, y, value ^ 1);
            }
        }
    }

    /// Draw a 1-pixel black outline along the view's edges.
    pub fn set_border(&mut self) {
        self.owner.draw_outline(self.area);
    }

    /// Copy the view's pixels out, then clear the view to white.
    pub fn cut(&mut self) -> Bitmap {
        let img = copy_area(&*self.owner, &self.area);
        self.fill_white();
        img
    }

    pub fn global_point(&self, x: i32, y: i32) -> Point {
        Point::new(x + self.area.x0, y + self.area.y0)
    }
}

impl Raster for ViewMut<'_> {
    fn width(&self) -> u32 {
        self.area.width() as u32
    }

    fn height(&self) -> u32 {
        self.area.height() as u32
    }

    fn pixel(&self, x: i32, y: i32) -> u8 {
        local_pixel(&*self.owner, &self.area, x, y)
    }

    fn to_bitmap(&self) -> Bitmap {
        copy_area(&*self.owner, &self.area)
    }
}

impl Bitmap {
    /// Read-only view of `area`, clipped to the bitmap.
    pub fn select(&self, area: Rect) -> Option<View<'_>> {
        View::new(self, area)
    }

    /// View of the whole bitmap.
    pub fn select_all(&self) -> View<'_> {
        View {
            owner: self,
            area: bounds_of(self),
        }
    }

    /// Rows `y0..y1`, full width. Negative indices count from the bottom.
    pub fn select_rows(&self, y0: i32, y1: i32) -> Option<View<'_>> {
        let y0 = resolve_index(y0, self.height());
        let y1 = resolve_index(y1, self.height());
        self.select(Rect::new(0, y0, self.width() as i32, y1))
    }

    /// Columns `x0..x1`, full height. Negative indices count from the right.
    pub fn select_cols(&self, x0: i32, x1: i32) -> Option<View<'_>> {
        let x0 = resolve_index(x0, self.width());
        let x1 = resolve_index(x1, self.width());
        self.select(Rect::new(x0, 0, x1, self.height() as i32))
    }

    pub fn select_mut(&mut self, area: Rect) -> Option<ViewMut<'_>> {
        ViewMut::new(self, area)
    }

    pub fn select_rows_mut(&mut self, y0: i32, y1: i32) -> Option<ViewMut<'_>> {
        let y0 = resolve_index(y0, self.height());
        let y1 = resolve_index(y1, self.height());
        let width = self.width() as i32;
        self.select_mut(Rect::new(0, y0, width, y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bitmap {
        let mut img = Bitmap::new(16, 8);
        img.set_black(5, 3);
        img.set_black(6, 3);
        img.set_black(12, 7);
        img
    }

    #[test]
    fn test_view_reads_through() {
        let img = sample();
        let view = img.select(Rect::new(4, 2, 10, 6)).unwrap();
        assert_eq!((Raster::width(&view), Raster::height(&view)), (6, 4));
        assert_eq!(view.pixel(1, 1), 1);
        assert_eq!(view.pixel(2, 1), 1);
        assert_eq!(view.pixel(0, 0), 0);
        // Outside the view, even though the owner has ink there
        assert_eq!(view.pixel(8, 5), 0);
        assert_eq!(view.global_point(1, 1), Point::new(5, 3));
    }

    #[test]
    fn test_select_is_clipped_to_parent() {
        let img = sample();
        let view = img.select(Rect::new(4, 2, 10, 6)).unwrap();
        let sub = view.select(Rect::new(4, 2, 100, 100)).unwrap();
        assert_eq!(sub.area(), Rect::new(8, 4, 10, 6));
        assert!(view.select(Rect::new(6, 0, 8, 2)).is_none());
        assert!(img.select(Rect::new(16, 0, 20, 8)).is_none());
    }

    #[test]
    fn test_copy_matches_view() {
        let img = sample();
        let view = img.select(Rect::new(3, 1, 9, 6)).unwrap();
        let copy = view.to_bitmap();
        assert_eq!(copy.width(), 8);
        for y in 0..5 {
            for x in 0..6 {
                assert_eq!(copy.pixel(x, y), view.pixel(x, y));
            }
        }
        assert!((view.black_ratio() - 2.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_cut_clears_owner() {
        let mut img = sample();
        let cut = img.select_mut(Rect::new(4, 2, 10, 6)).unwrap().cut();
        assert_eq!(cut.pixel(1, 1), 1);
        assert_eq!(img.pixel(5, 3), 0);
        assert_eq!(img.pixel(12, 7), 1);
    }

    #[test]
    fn test_fill_and_invert() {
        let mut img = Bitmap::new(16, 4);
        {
            let mut view = img.select_mut(Rect::new(2, 1, 6, 3)).unwrap();
            view.fill_black();
            view.invert();
            view.set_pixel(0, 0, 1);
            // Outside the view: ignored
            view.set_pixel(10, 0, 1);
        }
        assert_eq!(img.black_count(), 1);
        assert_eq!(img.pixel(2, 1), 1);

        img.select_rows_mut(0, 1).unwrap().fill_black();
        assert!(!img.is_white_line(0));
        assert!(img.is_white_line(3));
    }

    #[test]
    fn test_nested_mut_select() {
        let mut img = Bitmap::new(16, 8);
        let mut outer = img.select_mut(Rect::new(8, 0, 16, 8)).unwrap();
        outer.select(Rect::new(0, 0, 2, 2)).unwrap().fill_black();
        assert_eq!(outer.as_view().black_count(), 4);
        drop(outer);
        assert_eq!(img.pixel(8, 0), 1);
        assert_eq!(img.pixel(7, 0), 0);
    }
}
