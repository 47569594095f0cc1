//! Packed 1-bit monochrome bitmap.
//!
//! Pixels are stored row-major, eight per byte, most significant bit first.
//! Pixel `(x, y)` lives at byte `y * (width / 8) + x / 8`, bit `7 - x % 8`.
//! A set bit is ink (black), a cleared bit is paper (white).
//!
//! The width is always a multiple of 8. Constructors round a requested width
//! up and pad the extra columns with white, so every row is a whole number of
//! bytes and can be sent to the printer as is.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

/// Horizontal placement of a bitmap on paper wider than the bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    /// Parse an alignment attribute. Unknown values mean centered.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        };
        f.write_str(s)
    }
}

/// Round a pixel width up to the next multiple of 8.
pub(crate) fn round_up_to_byte(width: u32) -> u32 {
    width.div_ceil(8) * 8
}

/// Resolve a possibly negative index against an extent.
///
/// `-1` is the last row or column. The result may still be out of range.
pub(crate) fn resolve_index(index: i32, extent: u32) -> i32 {
    if index < 0 {
        extent as i32 + index
    } else {
        index
    }
}

/// Monochrome raster image with byte-aligned rows.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    align: Alignment,
    content: Vec<u8>,
}

impl Bitmap {
    /// All-white bitmap. `width` is rounded up to a multiple of 8.
    pub fn new(width: u32, height: u32) -> Self {
        let width = round_up_to_byte(width);
        Bitmap {
            width,
            height,
            align: Alignment::default(),
            content: vec![0x00; (width / 8) as usize * height as usize],
        }
    }

    /// Wrap already packed pixel data.
    ///
    /// The buffer must hold `height` rows of `ceil(width / 8)` bytes.
    pub fn from_bytes(width: u32, height: u32, content: Vec<u8>) -> Result<Self> {
        let width = round_up_to_byte(width);
        let expected = (width / 8) as usize * height as usize;
        if content.len() != expected {
            return Err(Error::InvalidContentLength {
                expected,
                actual: content.len(),
            });
        }
        Ok(Bitmap {
            width,
            height,
            align: Alignment::default(),
            content,
        })
    }

    /// Decode the base64 payload of an ePOS `<image width=.. height=..>`
    /// element.
    pub fn from_base64(width: u32, height: u32, data: &str) -> Result<Self> {
        // ePOS clients wrap the payload across lines
        let compact: String = data.split_whitespace().collect();
        let content = STANDARD.decode(compact)?;
        Self::from_bytes(width, height, content)
    }

    pub(crate) fn from_parts(width: u32, height: u32, align: Alignment, content: Vec<u8>) -> Self {
        debug_assert_eq!(width % 8, 0);
        debug_assert_eq!(content.len(), (width / 8) as usize * height as usize);
        Bitmap {
            width,
            height,
            align,
            content,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn width_bytes(&self) -> usize {
        (self.width / 8) as usize
    }

    pub fn align(&self) -> Alignment {
        self.align
    }

    pub fn set_align(&mut self, align: Alignment) {
        self.align = align;
    }

    /// `true` when the bitmap holds no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.content
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content
    }

    /// Packed bytes of row `y`. Panics if `y` is out of range.
    pub fn row(&self, y: u32) -> &[u8] {
        let wb = self.width_bytes();
        let start = y as usize * wb;
        &self.content[start..start + wb]
    }

    /// Iterate over packed rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on 0
        self.content.chunks_exact(self.width_bytes().max(1))
    }

    fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        let x = resolve_index(x, self.width);
        let y = resolve_index(y, self.height);
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let index = y as usize * self.width_bytes() + x as usize / 8;
        let mask = 1u8 << (7 - (x % 8));
        Some((index, mask))
    }

    /// Pixel value at `(x, y)`: `1` for black, `0` for white.
    ///
    /// Negative coordinates count from the right and bottom edges. Anything
    /// outside the bitmap reads as white.
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        match self.locate(x, y) {
            Some((index, mask)) => u8::from(self.content[index] & mask != 0),
            None => 0,
        }
    }

    /// Set `(x, y)` to black when `value` is non-zero, white otherwise.
    /// Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if let Some((index, mask)) = self.locate(x, y) {
            if value != 0 {
                self.content[index] |= mask;
            } else {
                self.content[index] &= !mask;
            }
        }
    }

    pub fn set_black(&mut self, x: i32, y: i32) {
        self.set_pixel(x, y, 1);
    }

    pub fn set_white(&mut self, x: i32, y: i32) {
        self.set_pixel(x, y, 0);
    }

    pub fn black_count(&self) -> usize {
        self.content.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Fraction of black pixels, `0.0` for an empty bitmap.
    pub fn black_ratio(&self) -> f64 {
        let total = self.width as usize * self.height as usize;
        if total == 0 {
            return 0.0;
        }
        self.black_count() as f64 / total as f64
    }

    pub fn is_all_black(&self) -> bool {
        !self.content.is_empty() && self.content.iter().all(|&b| b == 0xFF)
    }

    pub fn is_all_white(&self) -> bool {
        !self.content.is_empty() && self.content.iter().all(|&b| b == 0x00)
    }

    /// `true` if row `y` has no ink. Out-of-range rows are `false`.
    pub fn is_white_line(&self, y: i32) -> bool {
        if y < 0 || y >= self.height as i32 {
            return false;
        }
        self.row(y as u32).iter().all(|&b| b == 0)
    }

    /// `true` if column `x` has no ink. Out-of-range columns are `false`.
    pub fn is_white_column(&self, x: i32) -> bool {
        if x < 0 || x >= self.width as i32 {
            return false;
        }
        (0..self.height as i32).all(|y| self.pixel(x, y) == 0)
    }

    /// `true` if the outermost rows and columns are all white.
    pub fn is_white_border(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.is_white_line(0)
            && self.is_white_line(self.height as i32 - 1)
            && self.is_white_column(0)
            && self.is_white_column(self.width as i32 - 1)
    }

    /// `true` if the ink forms one horizontal band: every row between the
    /// first and the last inked row carries ink.
    pub fn is_single_text_line(&self) -> bool {
        let inked: Vec<bool> = (0..self.height as i32)
            .map(|y| !self.is_white_line(y))
            .collect();
        let top = match inked.iter().position(|&b| b) {
            Some(top) => top,
            None => return false,
        };
        let bottom = inked.iter().rposition(|&b| b).unwrap_or(top);
        inked[top..=bottom].iter().all(|&b| b)
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bitmap(width: {}, height: {}, align: {}, bytes: {})",
            self.width,
            self.height,
            self.align,
            self.content.len()
        )
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
