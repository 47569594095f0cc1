//! White padding around a bitmap, applied in place before printing.
//!
//! Left and right margins are whole bytes: the requested pixel count is
//! rounded down to a multiple of 8 so rows can be shifted by byte copies.
//! Top and bottom margins add whole rows and need no rounding.

use crate::bitmap::{Alignment, Bitmap};

impl Bitmap {
    fn with_row_padding(&self, left_bytes: usize, right_bytes: usize) -> Vec<u8> {
        let old_wb = self.width_bytes();
        let new_wb = old_wb + left_bytes + right_bytes;
        let mut content = vec![0x00; new_wb * self.height() as usize];
        for (row, src) in self.rows().enumerate() {
            let start = row * new_wb + left_bytes;
            content[start..start + old_wb].copy_from_slice(src);
        }
        content
    }

    /// Grow the bitmap by `margin` white columns on the left.
    pub fn add_margin_left(&mut self, margin: u32) {
        let bytes = (margin / 8) as usize;
        if bytes == 0 {
            return;
        }
        let content = self.with_row_padding(bytes, 0);
        *self = Bitmap::from_parts(self.width() + bytes as u32 * 8, self.height(), self.align(), content);
    }

    /// Grow the bitmap by `margin` white columns on the right.
    pub fn add_margin_right(&mut self, margin: u32) {
        let bytes = (margin / 8) as usize;
        if bytes == 0 {
            return;
        }
        let content = self.with_row_padding(0, bytes);
        *self = Bitmap::from_parts(self.width() + bytes as u32 * 8, self.height(), self.align(), content);
    }

    /// Grow the bitmap by `margin` white rows on top.
    pub fn add_margin_top(&mut self, margin: u32) {
        if margin == 0 {
            return;
        }
        let mut content = vec![0x00; margin as usize * self.width_bytes()];
        content.extend_from_slice(self.as_bytes());
        *self = Bitmap::from_parts(self.width(), self.height() + margin, self.align(), content);
    }

    /// Grow the bitmap by `margin` white rows at the bottom.
    pub fn add_margin_bottom(&mut self, margin: u32) {
        if margin == 0 {
            return;
        }
        let mut content = self.as_bytes().to_vec();
        content.resize(content.len() + margin as usize * self.width_bytes(), 0x00);
        *self = Bitmap::from_parts(self.width(), self.height() + margin, self.align(), content);
    }

    /// Left and bottom margins in one call.
    pub fn add_margin(&mut self, left: u32, bottom: u32) {
        self.add_margin_left(left);
        self.add_margin_bottom(bottom);
    }

    /// Left padding that places the bitmap on paper `paper_width` pixels wide
    /// according to its alignment, rounded down to a multiple of 8.
    ///
    /// Returns 0 when the bitmap is already at least as wide as the paper.
    pub fn auto_margin_left(&self, paper_width: u32) -> u32 {
        if self.width() >= paper_width {
            return 0;
        }
        let margin = match self.align() {
            Alignment::Left => 0,
            Alignment::Right => paper_width - self.width(),
            Alignment::Center => (paper_width - self.width()) / 2,
        };
        margin / 8 * 8
    }

    /// Apply [`Bitmap::auto_margin_left`] and return the margin added.
    pub fn apply_auto_margin_left(&mut self, paper_width: u32) -> u32 {
        let margin = self.auto_margin_left(paper_width);
        log::debug!(
            "auto margin {} for {}px on {}px paper ({})",
            margin,
            self.width(),
            paper_width,
            self.align()
        );
        self.add_margin_left(margin);
        margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_left_rounds_down() {
        let mut img = Bitmap::from_bytes(8, 2, vec![0xFF, 0x81]).unwrap();
        img.add_margin_left(13);
        assert_eq!(img.width(), 16);
        assert_eq!(img.as_bytes(), &[0x00, 0xFF, 0x00, 0x81]);

        img.add_margin_left(7);
        assert_eq!(img.width(), 16);
    }

    #[test]
    fn test_margin_right() {
        let mut img = Bitmap::from_bytes(8, 2, vec![0xFF, 0x81]).unwrap();
        img.add_margin_right(8);
        assert_eq!(img.as_bytes(), &[0xFF, 0x00, 0x81, 0x00]);
    }

    #[test]
    fn test_margin_top_bottom() {
        let mut img = Bitmap::from_bytes(8, 1, vec![0xF0]).unwrap();
        img.add_margin_top(2);
        img.add_margin_bottom(1);
        assert_eq!(img.height(), 4);
        assert_eq!(img.as_bytes(), &[0x00, 0x00, 0xF0, 0x00]);
    }

    #[test]
    fn test_auto_margin_left() {
        let mut img = Bitmap::new(100, 1);
        assert_eq!(img.width(), 104);
        // (576 - 104) / 2 = 236 -> 232
        assert_eq!(img.auto_margin_left(576), 232);
        img.set_align(Alignment::Right);
        assert_eq!(img.auto_margin_left(576), 472);
        img.set_align(Alignment::Left);
        assert_eq!(img.auto_margin_left(576), 0);
        img.set_align(Alignment::Center);
        assert_eq!(img.auto_margin_left(64), 0);

        assert_eq!(img.apply_auto_margin_left(576), 232);
        assert_eq!(img.width(), 336);
    }
}
