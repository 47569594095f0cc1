//! Closed-set glyph recognition.
//!
//! A [`GlyphCatalog`] holds one reference bitmap and a table naming the
//! rectangle of each glyph inside it. An unknown region is compared
//! pixel-for-pixel with every template of the same size. The best template
//! wins if more than [`MATCH_THRESHOLD`] of its pixels agree; otherwise the
//! region is [`UNKNOWN_GLYPH`].

use std::collections::BTreeMap;

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use crate::rect::Rect;
use crate::view::{Raster, View};

/// Label returned when no template is close enough.
pub const UNKNOWN_GLYPH: &str = "?";

/// Minimum similarity, exclusive, for a template to be accepted.
pub const MATCH_THRESHOLD: f64 = 0.9;

/// Fraction of pixels that agree between two rasters of identical size.
///
/// `None` if the sizes differ or the rasters are empty.
pub fn similarity<A, B>(a: &A, b: &B) -> Option<f64>
where
    A: Raster + ?Sized,
    B: Raster + ?Sized,
{
    let (w, h) = (a.width(), a.height());
    if w != b.width() || h != b.height() || w == 0 || h == 0 {
        return None;
    }
    let mut same = 0usize;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            if a.pixel(x, y) == b.pixel(x, y) {
                same += 1;
            }
        }
    }
    Some(same as f64 / (w as usize * h as usize) as f64)
}

/// Labelled glyph templates cut from one reference image.
#[derive(Debug, Clone)]
pub struct GlyphCatalog {
    reference: Bitmap,
    areas: BTreeMap<String, Rect>,
}

impl GlyphCatalog {
    /// Build a catalog. Every rectangle must be non-empty and lie inside
    /// `reference`.
    pub fn new<I, S>(reference: Bitmap, table: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Rect)>,
        S: Into<String>,
    {
        let bounds = Rect::new(0, 0, reference.width() as i32, reference.height() as i32);
        let mut areas = BTreeMap::new();
        for (label, area) in table {
            let label = label.into();
            if area.is_empty() || area.intersect(&bounds) != area {
                return Err(Error::InvalidGlyphArea(format!("{} {}", label, area)));
            }
            areas.insert(label, area);
        }
        log::debug!("glyph catalog with {} templates on {}", areas.len(), reference);
        Ok(GlyphCatalog { reference, areas })
    }

    /// Catalog from a base64 PNG reference image.
    pub fn from_base64_png<I, S>(png_base64: &str, table: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Rect)>,
        S: Into<String>,
    {
        let reference = Bitmap::from_base64_png(png_base64)?;
        GlyphCatalog::new(reference, table)
    }

    /// Catalog from a base64 PNG and a JSON table such as
    /// `{"0": [2, 0, 15, 23], "1": [18, 0, 27, 23]}`, each entry being
    /// `[x0, y0, x1, y1]`.
    pub fn from_json_table(png_base64: &str, json: &str) -> Result<Self> {
        let table: BTreeMap<String, [i32; 4]> = serde_json::from_str(json)?;
        GlyphCatalog::from_base64_png(
            png_base64,
            table.into_iter().map(|(label, area)| (label, Rect::from(area))),
        )
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn reference(&self) -> &Bitmap {
        &self.reference
    }

    /// Labels in lexicographic order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.areas.keys().map(String::as_str)
    }

    pub fn template(&self, label: &str) -> Option<View<'_>> {
        let area = self.areas.get(label)?;
        self.reference.select(*area)
    }

    /// Best label for `glyph`, or [`UNKNOWN_GLYPH`].
    ///
    /// Equal scores resolve to the label that sorts first.
    pub fn recognize<R: Raster + ?Sized>(&self, glyph: &R) -> &str {
        let mut best: Option<(&str, f64)> = None;
        for (label, area) in &self.areas {
            let template = match self.reference.select(*area) {
                Some(view) => view,
                None => continue,
            };
            if let Some(score) = similarity(&template, glyph) {
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((label.as_str(), score));
                }
            }
        }
        match best {
            Some((label, score)) if score > MATCH_THRESHOLD => label,
            _ => UNKNOWN_GLYPH,
        }
    }

    /// Segment `view` and recognize each component, left to right.
    pub fn recognize_text(&self, view: &View<'_>) -> String {
        let mut glyphs = view.characters();
        glyphs.sort_by_key(|g| g.area().x0);
        glyphs.iter().map(|g| self.recognize(g)).collect()
    }
}
