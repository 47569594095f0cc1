//! Geometric edits that return a new, independent bitmap.
//!
//! Every `with_*` method leaves `self` untouched. Invalid geometry never
//! errors: the crop family returns `None`, everything else returns an
//! unchanged copy of the input.

use crate::bitmap::{resolve_index, Bitmap};
use crate::rect::Rect;

impl Bitmap {
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    /// Copy of the rectangle at `(x, y)` with the given size.
    ///
    /// Negative `x`/`y` count from the right and bottom edges. Returns `None`
    /// if the size is not positive or the rectangle is not fully inside the
    /// bitmap. A width that is not a multiple of 8 is padded with white.
    pub fn with_crop(&self, x: i32, y: i32, width: i32, height: i32) -> Option<Bitmap> {
        if self.is_empty() {
            return None;
        }
        let x = resolve_index(x, self.width());
        let y = resolve_index(y, self.height());
        if x < 0
            || y < 0
            || width <= 0
            || height <= 0
            || x as i64 + width as i64 > self.width() as i64
            || y as i64 + height as i64 > self.height() as i64
        {
            return None;
        }

        let mut out = Bitmap::new(width as u32, height as u32);
        out.set_align(self.align());
        let src_wb = self.width_bytes();
        let dst_wb = out.width_bytes();

        if x % 8 == 0 && width % 8 == 0 {
            let first = x as usize / 8;
            for row in 0..height as usize {
                let src = (y as usize + row) * src_wb + first;
                out.as_bytes_mut()[row * dst_wb..(row + 1) * dst_wb]
                    .copy_from_slice(&self.as_bytes()[src..src + dst_wb]);
            }
        } else {
            for row in 0..height {
                for col in 0..width {
                    if self.pixel(x + col, y + row) != 0 {
                        out.set_black(col, row);
                    }
                }
            }
        }
        Some(out)
    }

    /// Copy of rows `start..=end`. Negative indices count from the bottom.
    pub fn with_crop_rows(&self, start: i32, end: i32) -> Option<Bitmap> {
        if self.is_empty() {
            return None;
        }
        let start = resolve_index(start, self.height());
        let end = resolve_index(end, self.height());
        if start < 0 || end < start || end >= self.height() as i32 {
            return None;
        }
        let wb = self.width_bytes();
        let content = self.as_bytes()[start as usize * wb..(end as usize + 1) * wb].to_vec();
        Some(Bitmap::from_parts(
            self.width(),
            (end - start + 1) as u32,
            self.align(),
            content,
        ))
    }

    /// Remove rows `start..=end`.
    ///
    /// The range is clamped to the bitmap. An inverted or fully outside range
    /// returns an unchanged copy; deleting every row returns `None`.
    pub fn with_delete_rows(&self, start: i32, end: i32) -> Option<Bitmap> {
        let height = self.height() as i32;
        let start = resolve_index(start, self.height()).max(0);
        let end = resolve_index(end, self.height()).min(height - 1);
        if start > end || start >= height || end < 0 {
            return Some(self.clone());
        }
        let new_height = height - (end - start + 1);
        if new_height <= 0 {
            return None;
        }
        let wb = self.width_bytes();
        let mut content = Vec::with_capacity(new_height as usize * wb);
        content.extend_from_slice(&self.as_bytes()[..start as usize * wb]);
        content.extend_from_slice(&self.as_bytes()[(end as usize + 1) * wb..]);
        Some(Bitmap::from_parts(
            self.width(),
            new_height as u32,
            self.align(),
            content,
        ))
    }

    /// Stack `other` below `self`. Returns `None` if the widths differ.
    pub fn with_append(&self, other: &Bitmap) -> Option<Bitmap> {
        if other.width() != self.width() {
            log::debug!(
                "append rejected: width {} != {}",
                other.width(),
                self.width()
            );
            return None;
        }
        let mut content = Vec::with_capacity(self.as_bytes().len() + other.as_bytes().len());
        content.extend_from_slice(self.as_bytes());
        content.extend_from_slice(other.as_bytes());
        Some(Bitmap::from_parts(
            self.width(),
            self.height() + other.height(),
            self.align(),
            content,
        ))
    }

    /// Draw the black pixels of `other` into a copy of `self` with its
    /// top-left corner at `(x, y)`. White source pixels leave the destination
    /// as it was, so padding columns of an unaligned crop never clear ink.
    ///
    /// The pasted area is clipped to `self`. A start point outside `self`
    /// (after resolving negative indices) leaves the copy unchanged.
    pub fn with_paste(&self, other: &Bitmap, x: i32, y: i32) -> Bitmap {
        let mut out = self.clone();
        let x = resolve_index(x, self.width());
        let y = resolve_index(y, self.height());
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return out;
        }
        let paste_w = (other.width() as i32).min(self.width() as i32 - x);
        let paste_h = (other.height() as i32).min(self.height() as i32 - y);

        if x % 8 == 0 {
            // paste_w is a multiple of 8 here: both widths are byte aligned
            let n = paste_w as usize / 8;
            let dst_wb = self.width_bytes();
            let src_wb = other.width_bytes();
            for row in 0..paste_h as usize {
                let dst = (y as usize + row) * dst_wb + x as usize / 8;
                let src = &other.as_bytes()[row * src_wb..row * src_wb + n];
                for (d, s) in out.as_bytes_mut()[dst..dst + n].iter_mut().zip(src) {
                    *d |= *s;
                }
            }
        } else {
            for row in 0..paste_h {
                for col in 0..paste_w {
                    if other.pixel(col, row) != 0 {
                        out.set_black(x + col, y + row);
                    }
                }
            }
        }
        out
    }

    /// Set every pixel of `area`, clipped to the bitmap, to `value`.
    pub(crate) fn fill_rect(&mut self, area: Rect, value: u8) {
        let area = area.intersect(&self.bounds());
        for y in area.y0..area.y1 {
            for x in area.x0..area.x1 {
                self.set_pixel(x, y, value);
            }
        }
    }

    /// Copy with the `width x height` rectangle at `(x, y)` cleared to white.
    ///
    /// Negative `x`/`y` count from the far edges; the rectangle is clipped to
    /// the bitmap.
    pub fn with_erase(&self, x: i32, y: i32, width: i32, height: i32) -> Bitmap {
        let mut out = self.clone();
        let x = resolve_index(x, self.width());
        let y = resolve_index(y, self.height());
        if width <= 0 || height <= 0 {
            return out;
        }
        out.fill_rect(Rect::from_size(x, y, width, height), 0);
        out
    }

    /// Copy with a solid black frame `border_width` pixels thick painted
    /// inside the edges.
    pub fn with_border(&self, border_width: u32) -> Bitmap {
        let mut out = self.clone();
        if border_width == 0 || self.is_empty() {
            return out;
        }
        let (w, h, b) = (self.width() as i32, self.height() as i32, border_width as i32);
        out.fill_rect(Rect::new(0, 0, w, b), 1);
        out.fill_rect(Rect::new(0, h - b, w, h), 1);
        out.fill_rect(Rect::new(0, 0, b, h), 1);
        out.fill_rect(Rect::new(w - b, 0, w, h), 1);
        out
    }

    /// Draw a 1-pixel black outline of `area` in place, clipped to the bitmap.
    pub(crate) fn draw_outline(&mut self, area: Rect) {
        if area.is_empty() {
            return;
        }
        let visible = area.intersect(&self.bounds());
        for y in visible.y0..visible.y1 {
            for x in visible.x0..visible.x1 {
                if x == area.x0 || x == area.x1 - 1 || y == area.y0 || y == area.y1 - 1 {
                    self.set_black(x, y);
                }
            }
        }
    }

    /// Copy with a 1-pixel black rectangle outline around `area`.
    pub fn with_border_rect(&self, area: Rect) -> Bitmap {
        let mut out = self.clone();
        out.draw_outline(area);
        out
    }

    fn shifted(&self, shift_bytes: isize) -> Bitmap {
        let wb = self.width_bytes();
        let mut out = Bitmap::from_parts(
            self.width(),
            self.height(),
            self.align(),
            vec![0x00; self.as_bytes().len()],
        );
        let n = shift_bytes.unsigned_abs().min(wb);
        for (row, src) in self.rows().enumerate() {
            let dst = &mut out.as_bytes_mut()[row * wb..(row + 1) * wb];
            if shift_bytes > 0 {
                dst[n..].copy_from_slice(&src[..wb - n]);
            } else {
                dst[..wb - n].copy_from_slice(&src[n..]);
            }
        }
        out
    }

    /// Copy with content moved `shift` pixels to the left, rounded down to
    /// whole bytes. Columns shifted in from the right are white.
    pub fn with_shift_left(&self, shift: u32) -> Bitmap {
        if shift < 8 || self.is_empty() {
            return self.clone();
        }
        self.shifted(-((shift / 8) as isize))
    }

    /// Copy with content moved `shift` pixels to the right, rounded down to
    /// whole bytes. Columns shifted in from the left are white.
    pub fn with_shift_right(&self, shift: u32) -> Bitmap {
        if shift < 8 || self.is_empty() {
            return self.clone();
        }
        self.shifted((shift / 8) as isize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Bitmap {
        let mut img = Bitmap::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if (x + y) % 3 == 0 {
                    img.set_black(x, y);
                }
            }
        }
        img
    }

    #[test]
    fn test_crop_unaligned() {
        let img = checker(32, 10);
        let crop = img.with_crop(3, 2, 10, 4).unwrap();
        assert_eq!(crop.width(), 16);
        assert_eq!(crop.height(), 4);
        for y in 0..4 {
            for x in 0..10 {
                assert_eq!(crop.pixel(x, y), img.pixel(x + 3, y + 2));
            }
            // Padding columns stay white
            for x in 10..16 {
                assert_eq!(crop.pixel(x, y), 0);
            }
        }
    }

    #[test]
    fn test_crop_aligned_fast_path() {
        let img = checker(32, 10);
        let crop = img.with_crop(8, 1, 16, 3).unwrap();
        for y in 0..3 {
            for x in 0..16 {
                assert_eq!(crop.pixel(x, y), img.pixel(x + 8, y + 1));
            }
        }
    }

    #[test]
    fn test_crop_rejects_invalid() {
        let img = checker(16, 8);
        assert!(img.with_crop(0, 0, 0, 4).is_none());
        assert!(img.with_crop(10, 0, 8, 4).is_none());
        assert!(img.with_crop(0, 6, 8, 4).is_none());
        // -8 resolves to column 8
        assert!(img.with_crop(-8, -4, 8, 4).is_some());
    }

    #[test]
    fn test_delete_rows() {
        let img = checker(8, 6);
        let out = img.with_delete_rows(1, 2).unwrap();
        assert_eq!(out.height(), 4);
        assert_eq!(out.row(0), img.row(0));
        assert_eq!(out.row(1), img.row(3));

        // Inverted range is a no-op
        assert_eq!(img.with_delete_rows(4, 2).unwrap(), img);
        // Everything removed
        assert!(img.with_delete_rows(0, 100).is_none());
        // Last row by negative index
        assert_eq!(img.with_delete_rows(-1, -1).unwrap().height(), 5);
    }

    #[test]
    fn test_append_requires_same_width() {
        let a = checker(16, 3);
        let b = checker(16, 2);
        let joined = a.with_append(&b).unwrap();
        assert_eq!(joined.height(), 5);
        assert_eq!(joined.row(3), b.row(0));
        assert!(a.with_append(&checker(8, 2)).is_none());
    }

    #[test]
    fn test_paste_only_adds_ink_and_clips() {
        let mut base = Bitmap::new(16, 4);
        base.fill_rect(Rect::new(0, 0, 16, 4), 1);
        let white = Bitmap::new(8, 8);
        assert_eq!(base.with_paste(&white, 12, 2), base);
        assert_eq!(base.with_paste(&white, 8, 0), base);

        let mut dot = Bitmap::new(8, 8);
        dot.set_black(0, 0);
        dot.set_black(7, 7);
        let out = Bitmap::new(16, 4).with_paste(&dot, 13, 1);
        assert_eq!(out.pixel(13, 1), 1);
        assert_eq!(out.black_count(), 1);
        let out = Bitmap::new(16, 4).with_paste(&dot, 8, 0);
        assert_eq!(out.pixel(8, 0), 1);
        assert_eq!(out.black_count(), 1);

        // Start outside bounds
        assert_eq!(Bitmap::new(16, 4).with_paste(&dot, 16, 0), Bitmap::new(16, 4));
    }

    #[test]
    fn test_unaligned_crop_pastes_back_onto_ink() {
        let mut img = Bitmap::new(32, 4);
        img.fill_rect(Rect::new(0, 0, 32, 4), 1);
        let crop = img.with_crop(3, 0, 13, 4).unwrap();
        assert_eq!(crop.width(), 16);
        assert_eq!(img.with_paste(&crop, 3, 0), img);
    }

    #[test]
    fn test_huge_sizes_do_not_overflow() {
        let img = checker(16, 4);
        assert!(img.with_crop(1, 0, i32::MAX, 1).is_none());
        assert!(img.with_crop(0, 1, 8, i32::MAX).is_none());

        let mut black = Bitmap::new(16, 4);
        black.fill_rect(Rect::new(0, 0, 16, 4), 1);
        let out = black.with_erase(4, 0, i32::MAX, 1);
        assert_eq!(out.pixel(3, 0), 1);
        assert_eq!(out.pixel(4, 0), 0);
        assert_eq!(out.pixel(15, 0), 0);
        assert_eq!(out.pixel(4, 1), 1);

        let out = Bitmap::new(8, 4).with_border_rect(Rect::new(2, 1, i32::MAX, i32::MAX));
        assert_eq!(out.pixel(2, 3), 1);
        assert_eq!(out.pixel(7, 1), 1);
        assert_eq!(out.pixel(7, 3), 0);
    }

    #[test]
    fn test_erase_is_clipped() {
        let mut base = Bitmap::new(16, 4);
        base.fill_rect(Rect::new(0, 0, 16, 4), 1);
        let out = base.with_erase(10, 2, 100, 100);
        assert_eq!(out.pixel(10, 2), 0);
        assert_eq!(out.pixel(15, 3), 0);
        assert_eq!(out.pixel(9, 2), 1);
        assert_eq!(base.with_erase(0, 0, 0, 2), base);
    }

    #[test]
    fn test_border() {
        let img = Bitmap::new(16, 8).with_border(2);
        assert_eq!(img.pixel(0, 0), 1);
        assert_eq!(img.pixel(1, 4), 1);
        assert_eq!(img.pixel(2, 4), 0);
        assert_eq!(img.pixel(14, 4), 1);
        assert_eq!(img.pixel(8, 6), 1);
        assert_eq!(img.pixel(8, 5), 0);
    }

    #[test]
    fn test_border_rect_clipped() {
        let img = Bitmap::new(8, 8).with_border_rect(Rect::new(-2, 2, 4, 6));
        assert_eq!(img.pixel(3, 3), 1);
        assert_eq!(img.pixel(0, 2), 1);
        assert_eq!(img.pixel(1, 3), 0);
        // Negative outline columns must not wrap to the right edge
        assert_eq!(img.pixel(7, 3), 0);
    }

    #[test]
    fn test_shift() {
        let img = Bitmap::from_bytes(24, 1, vec![0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(img.with_shift_right(8).as_bytes(), &[0x00, 0xAA, 0xBB]);
        assert_eq!(img.with_shift_left(16).as_bytes(), &[0xCC, 0x00, 0x00]);
        assert_eq!(img.with_shift_left(100).as_bytes(), &[0x00, 0x00, 0x00]);
        assert_eq!(img.with_shift_right(7), img);
    }
}
