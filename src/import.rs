//! Conversion between bitmaps and continuous-tone images.
//!
//! Import reduces every pixel to its luma (`0.299 R + 0.587 G + 0.114 B`)
//! and decides black or white from that. Pixels with alpha below 128 are
//! paper. Export writes 8-bit grayscale, black as 0 and white as 255.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba};

use crate::bitmap::Bitmap;
use crate::error::Result;

/// Luma below this is black when importing without dithering.
pub const THRESHOLD_CUTOFF: i32 = 187;

/// Luma below this is black when importing with error diffusion.
pub const DITHER_CUTOFF: i32 = 230;

const WHITE: i32 = 255;

fn luma(pixel: &Rgba<u8>) -> i32 {
    let [r, g, b, a] = pixel.0;
    if a < 128 {
        return WHITE;
    }
    (299 * r as i32 + 587 * g as i32 + 114 * b as i32) / 1000
}

impl Bitmap {
    /// Threshold `img` at [`THRESHOLD_CUTOFF`].
    pub fn from_image(img: &DynamicImage) -> Bitmap {
        let rgba = img.to_rgba8();
        let mut out = Bitmap::new(rgba.width(), rgba.height());
        for (x, y, pixel) in rgba.enumerate_pixels() {
            if luma(pixel) < THRESHOLD_CUTOFF {
                out.set_black(x as i32, y as i32);
            }
        }
        log::debug!(
            "imported {}x{} image as {}",
            rgba.width(),
            rgba.height(),
            out
        );
        out
    }

    /// Floyd-Steinberg error diffusion at [`DITHER_CUTOFF`].
    ///
    /// Each pixel's quantization error goes 7/16 right, 3/16 below left,
    /// 5/16 below and 1/16 below right. Error falling outside the image is
    /// dropped.
    pub fn from_image_dithered(img: &DynamicImage) -> Bitmap {
        let rgba = img.to_rgba8();
        let (w, h) = (rgba.width() as usize, rgba.height() as usize);
        let mut levels: Vec<i32> = rgba.pixels().map(luma).collect();
        let mut out = Bitmap::new(w as u32, h as u32);

        for y in 0..h {
            for x in 0..w {
                let old = levels[y * w + x];
                let new = if old < DITHER_CUTOFF { 0 } else { WHITE };
                if new == 0 {
                    out.set_black(x as i32, y as i32);
                }
                let err = old - new;
                let mut spread = |dx: isize, dy: usize, weight: i32| {
                    let nx = x as isize + dx;
                    let ny = y + dy;
                    if nx >= 0 && (nx as usize) < w && ny < h {
                        levels[ny * w + nx as usize] += err * weight / 16;
                    }
                };
                spread(1, 0, 7);
                spread(-1, 1, 3);
                spread(0, 1, 5);
                spread(1, 1, 1);
            }
        }
        out
    }

    /// Decode a PNG file held in memory.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Bitmap> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        Ok(Bitmap::from_image(&img))
    }

    /// Decode a base64-encoded PNG. Whitespace in the payload is ignored.
    pub fn from_base64_png(data: &str) -> Result<Bitmap> {
        let compact: String = data.split_whitespace().collect();
        let bytes = STANDARD.decode(compact)?;
        Bitmap::from_png_bytes(&bytes)
    }

    pub fn open_png<P: AsRef<Path>>(path: P) -> Result<Bitmap> {
        let bytes = std::fs::read(path)?;
        Bitmap::from_png_bytes(&bytes)
    }

    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            if self.pixel(x as i32, y as i32) != 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    /// Encode as an 8-bit grayscale PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(self.to_gray_image())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_gray_image()
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}
