//! Per-printer rewriting of receipts before they are encoded.
//!
//! A printer entry may name a [`Transformer`] in its `transformer` field.
//! The printer runs every bitmap through it first; a transformer returning
//! `None` drops the job without printing anything.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use crate::bitmap::Bitmap;
use crate::ocr::UNKNOWN_GLYPH;
use crate::pattern::Pattern;
use crate::rect::Rect;
use crate::view::Raster;

/// Rewrites a receipt before printing.
pub trait Transformer: fmt::Debug + Send + Sync {
    /// Name used in the printer configuration.
    fn name(&self) -> &str;

    /// Transformed receipt, or `None` to skip printing it.
    fn transform(&self, img: Bitmap) -> Option<Bitmap>;
}

/// Prints receipts unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transformer for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform(&self, img: Bitmap) -> Option<Bitmap> {
        Some(img)
    }
}

/// Transformer configured under `name`. An empty name is [`Identity`].
///
/// ```
/// use epos_raster::transformer_by_name;
///
/// assert_eq!(transformer_by_name("").unwrap().name(), "identity");
/// assert_eq!(transformer_by_name("reprint").unwrap().name(), "reprint");
/// assert!(transformer_by_name("kitchen-v9").is_none());
/// ```
pub fn transformer_by_name(name: &str) -> Option<Arc<dyn Transformer>> {
    match name.trim() {
        "" | "identity" => Some(Arc::new(Identity)),
        "reprint" => Some(Arc::new(Reprint::new())),
        _ => None,
    }
}

const BANNER_HEIGHT: i32 = 40;
const DIGIT_PITCH: i32 = 30;
const DIGIT_MARGIN: i32 = 8;
const NUMBER_WIDTH: i32 = 100;

const SIGN_WHITE: &[(i32, i32)] = &[
    (5, 10), (7, 10), (5, 8), (7, 8), (14, 7), (14, 8), (14, 9), (19, 9),
    (6, 16), (6, 17), (6, 18), (12, 16), (12, 17), (12, 18),
    (10, 24), (10, 25), (10, 26), (10, 27), (10, 28), (18, 16), (18, 17), (18, 18),
];

const SIGN_BLACK: &[(i32, i32)] = &[
    (10, 7), (10, 8), (10, 9), (10, 10), (10, 11), (10, 12), (10, 13), (10, 14),
    (16, 8), (16, 9), (16, 10), (16, 11), (16, 12), (16, 13), (16, 14), (16, 15),
    (6, 13), (7, 13), (8, 13), (9, 13), (11, 13), (12, 13), (13, 13), (14, 13), (15, 13),
    (17, 13), (18, 13), (19, 13), (8, 17), (8, 18), (8, 19), (8, 20), (8, 21), (8, 22), (8, 23),
    (14, 18), (14, 19), (14, 20), (14, 21), (14, 22), (14, 23), (14, 24), (14, 25), (14, 26),
];

/// The 24x36 `#` printed in front of the order number.
fn number_sign() -> Pattern {
    Pattern::new(24, 36)
        .white_rows(&[0, 1, 2, 3, 4, 5, 30, 31, 32, 33, 34, 35])
        .white_columns(&[0, 1, 2, 21, 22, 23])
        .white_points(SIGN_WHITE)
        .black_points(SIGN_BLACK)
}

/// Digit shapes of the receipt font, `0` to `9`.
fn digit_patterns() -> Vec<(&'static str, Pattern)> {
    vec![
        (
            "0",
            Pattern::new(14, 23)
                .white_area(Rect::new(4, 5, 9, 18))
                .black_area(Rect::new(0, 5, 2, 18))
                .black_area(Rect::new(11, 4, 13, 19)),
        ),
        (
            "1",
            Pattern::new(9, 23)
                .white_area(Rect::new(0, 7, 6, 23))
                .black_area(Rect::new(6, 1, 9, 23))
                .black_points(&[(2, 3), (3, 3), (4, 3), (5, 3)])
                .white_points(&[(0, 0), (1, 0), (0, 1)]),
        ),
        (
            "2",
            Pattern::new(14, 23)
                .white_area(Rect::new(0, 8, 3, 17))
                .white_area(Rect::new(0, 8, 6, 14))
                .white_area(Rect::new(5, 4, 9, 10))
                .white_area(Rect::new(10, 15, 14, 19))
                .black_area(Rect::new(2, 21, 13, 23)),
        ),
        (
            "3",
            Pattern::new(14, 23)
                .white_area(Rect::new(0, 7, 9, 8))
                .white_area(Rect::new(0, 7, 3, 16))
                .white_area(Rect::new(0, 14, 9, 16))
                .white_area(Rect::new(5, 14, 9, 19))
                .white_area(Rect::new(5, 4, 9, 8))
                .black_area(Rect::new(6, 10, 10, 12))
                .black_area(Rect::new(11, 3, 13, 9)),
        ),
        (
            "4",
            Pattern::new(15, 23)
                .white_area(Rect::new(0, 0, 7, 3))
                .white_area(Rect::new(0, 0, 3, 9))
                .white_area(Rect::new(6, 11, 9, 14))
                .black_area(Rect::new(10, 2, 13, 23))
                .black_area(Rect::new(4, 16, 13, 18)),
        ),
        (
            "5",
            Pattern::new(13, 23)
                .white_area(Rect::new(4, 4, 13, 7))
                .white_area(Rect::new(0, 13, 8, 16))
                .white_area(Rect::new(4, 12, 7, 19)),
        ),
        (
            "6",
            Pattern::new(14, 23)
                .white_area(Rect::new(4, 13, 9, 17))
                .white_area(Rect::new(6, 5, 14, 7))
                .white_area(Rect::new(0, 0, 3, 2)),
        ),
        (
            "7",
            Pattern::new(15, 23)
                .white_area(Rect::new(0, 4, 3, 23))
                .white_area(Rect::new(0, 4, 7, 11)),
        ),
        (
            "8",
            Pattern::new(13, 23)
                .white_area(Rect::new(5, 4, 8, 8))
                .white_area(Rect::new(4, 5, 9, 8))
                .white_area(Rect::new(4, 15, 9, 19))
                .black_area(Rect::new(4, 10, 10, 12)),
        ),
        (
            "9",
            Pattern::new(13, 23)
                .white_area(Rect::new(4, 5, 9, 11))
                .white_area(Rect::new(0, 17, 8, 18))
                .white_area(Rect::new(0, 15, 1, 23))
                .black_area(Rect::new(12, 5, 13, 16))
                .black_area(Rect::new(0, 13, 2, 21)),
        ),
    ]
}

/// Marks reprinted receipts.
///
/// The top 40 rows become a solid black banner. When the receipt carries
/// an order number after a `#` sign, its digits are repeated in white on
/// the banner, 30 pixels apart.
#[derive(Debug, Clone)]
pub struct Reprint {
    sign: Pattern,
    digits: Vec<(&'static str, Pattern)>,
}

impl Default for Reprint {
    fn default() -> Self {
        Reprint::new()
    }
}

impl Reprint {
    pub fn new() -> Self {
        Reprint {
            sign: number_sign(),
            digits: digit_patterns(),
        }
    }

    /// Digits of the order number, left to right. Empty if no `#` sign is
    /// found.
    pub fn order_number_glyphs(&self, img: &Bitmap) -> Vec<Bitmap> {
        let sign = match self.sign.first_match(&img.select_all()) {
            Some(sign) => sign.area(),
            None => return Vec::new(),
        };
        let area = Rect::new(sign.x1, sign.y0, sign.x1.saturating_add(NUMBER_WIDTH), sign.y1);
        let mut glyphs = match img.select(area) {
            Some(number) => number.characters(),
            None => return Vec::new(),
        };
        glyphs.sort_by_key(|glyph| glyph.area().x0);
        debug!("order number sign at {}, {} glyphs", sign, glyphs.len());
        glyphs.iter().map(|glyph| glyph.to_bitmap()).collect()
    }

    /// Label of a digit glyph, or [`UNKNOWN_GLYPH`].
    pub fn read_digit(&self, glyph: &Bitmap) -> &'static str {
        self.digits
            .iter()
            .find(|(_, pattern)| pattern.search_first(glyph).is_some())
            .map_or(UNKNOWN_GLYPH, |(label, _)| *label)
    }

    /// The order number as text, `None` if the receipt has none.
    pub fn order_number(&self, img: &Bitmap) -> Option<String> {
        let glyphs = self.order_number_glyphs(img);
        if glyphs.is_empty() {
            return None;
        }
        Some(glyphs.iter().map(|glyph| self.read_digit(glyph)).collect())
    }
}

/// Clear the pixels of `target` under the black pixels of `glyph` placed at
/// `(x, y)`.
fn stamp_white(target: &mut Bitmap, glyph: &Bitmap, x: i32, y: i32) {
    for gy in 0..glyph.height() as i32 {
        for gx in 0..glyph.width() as i32 {
            if glyph.pixel(gx, gy) != 0 {
                target.set_white(x + gx, y + gy);
            }
        }
    }
}

impl Transformer for Reprint {
    fn name(&self) -> &str {
        "reprint"
    }

    fn transform(&self, img: Bitmap) -> Option<Bitmap> {
        let glyphs = self.order_number_glyphs(&img);
        let mut out = img;
        if let Some(mut banner) = out.select_rows_mut(0, BANNER_HEIGHT) {
            banner.fill_black();
        }
        if !glyphs.is_empty() {
            let number: String = glyphs.iter().map(|glyph| self.read_digit(glyph)).collect();
            info!("reprint of order {}", number);
        }
        for (i, glyph) in glyphs.iter().enumerate() {
            stamp_white(&mut out, glyph, DIGIT_MARGIN + i as i32 * DIGIT_PITCH, DIGIT_MARGIN);
        }
        Some(out)
    }
}
