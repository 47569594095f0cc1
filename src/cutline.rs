//! Page separators embedded in a composite bitmap.
//!
//! Several receipts can be stacked into one tall bitmap with a marker row
//! between them. The marker is a fixed noisy pattern, every byte having
//! exactly one white bit, so it does not occur in ordinary receipt content.
//! [`Bitmap::cut_pages`] splits the stack again so that the printer can cut
//! after each receipt.

use crate::bitmap::Bitmap;

/// Marker row pattern. Rows wider than 128 bytes repeat it.
pub const CUTLINE: [u8; 128] = [
    0xDF, 0x7F, 0xFB, 0xF7, 0xBF, 0xEF, 0xFD, 0xFE, 0xF7, 0xDF, 0x7F, 0xFB, 0xEF, 0xBF, 0xFE, 0xFD,
    0xFB, 0xF7, 0xDF, 0x7F, 0xBF, 0xEF, 0xFD, 0xFE, 0xF7, 0xDF, 0x7F, 0xFB, 0xEF, 0xBF, 0xFE, 0xFD,
    0xFE, 0xBF, 0xDF, 0x7F, 0xF7, 0xFB, 0xEF, 0xFD, 0x7F, 0xDF, 0xFB, 0xF7, 0xBF, 0xEF, 0xFE, 0xFD,
    0xF7, 0xFB, 0xDF, 0x7F, 0xBF, 0xEF, 0xFD, 0xFE, 0xFB, 0xF7, 0xDF, 0x7F, 0xEF, 0xBF, 0xFE, 0xFD,
    0xFD, 0xEF, 0xBF, 0x7F, 0xF7, 0xDF, 0xFB, 0xFE, 0xBF, 0xEF, 0x7F, 0xDF, 0xFB, 0xF7, 0xFE, 0xFD,
    0xEF, 0xBF, 0xDF, 0x7F, 0xF7, 0xFB, 0xFE, 0xFD, 0x7F, 0xDF, 0xFB, 0xF7, 0xBF, 0xEF, 0xFD, 0xFE,
    0xF7, 0xFB, 0xDF, 0x7F, 0xBF, 0xEF, 0xFE, 0xFD, 0xFB, 0xF7, 0xDF, 0x7F, 0xEF, 0xBF, 0xFE, 0xFD,
    0xFE, 0xBF, 0xDF, 0x7F, 0xF7, 0xFB, 0xEF, 0xFD, 0x7F, 0xDF, 0xFB, 0xF7, 0xBF, 0xEF, 0xFD, 0xFE,
];

/// Marker row for rows of `width_bytes` bytes.
pub fn cutline_row(width_bytes: usize) -> Vec<u8> {
    CUTLINE.iter().copied().cycle().take(width_bytes).collect()
}

/// `true` if `row` is a marker row.
pub fn is_cutline(row: &[u8]) -> bool {
    !row.is_empty() && row.iter().zip(CUTLINE.iter().cycle()).all(|(a, b)| a == b)
}

impl Bitmap {
    /// Copy with a marker row appended at the bottom.
    pub fn with_cutline(&self) -> Bitmap {
        if self.width_bytes() == 0 {
            return self.clone();
        }
        let mut content = self.as_bytes().to_vec();
        content.extend(cutline_row(self.width_bytes()));
        Bitmap::from_parts(self.width(), self.height() + 1, self.align(), content)
    }

    /// Split at marker rows.
    ///
    /// Marker rows are dropped, as are pages left empty by adjacent markers.
    /// A marker on the last row does not open a trailing page. Without any
    /// marker the result is a single copy of `self`; an empty bitmap yields
    /// no pages.
    pub fn cut_pages(&self) -> Vec<Bitmap> {
        if self.is_empty() {
            return Vec::new();
        }
        let wb = self.width_bytes();
        let rows: Vec<&[u8]> = self.rows().collect();
        let mut limit = rows.len();
        if is_cutline(rows[limit - 1]) {
            limit -= 1;
        }

        let mut pages = Vec::new();
        let mut found = limit < rows.len();
        let mut current: Vec<u8> = Vec::new();
        for row in &rows[..limit] {
            if is_cutline(row) {
                found = true;
                if !current.is_empty() {
                    let content = std::mem::take(&mut current);
                    let height = (content.len() / wb) as u32;
                    pages.push(Bitmap::from_parts(self.width(), height, self.align(), content));
                }
            } else {
                current.extend_from_slice(row);
            }
        }
        if !found {
            return vec![self.clone()];
        }
        if !current.is_empty() {
            let height = (current.len() / wb) as u32;
            pages.push(Bitmap::from_parts(self.width(), height, self.align(), current));
        }
        log::debug!("{} cut into {} pages", self, pages.len());
        pages
    }
}
