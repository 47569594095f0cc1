//! ESC/POS raster encoding.
//!
//! Bitmaps travel to the printer as `GS v 0` blocks: an 8-byte header
//! followed by the packed rows.
//!
//! ```text
//! 1D 76 30 m xL xH yL yH d1 .. dk      k = (xL + 256 xH) * (yL + 256 yH)
//! ```
//!
//! `x` is the row width in bytes and `y` the number of rows, both little
//! endian. Tall bitmaps are sent as several bands, each with its own header.

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};

pub const ESC: u8 = 0x1B;
pub const GS: u8 = 0x1D;

/// `ESC @`: reset the printer.
pub const INIT: [u8; 2] = [ESC, 0x40];

/// `GS V 1`: partial cut.
pub const DEFAULT_CUT: [u8; 3] = [GS, 0x56, 0x01];

/// `ESC p 0 25 250`: pulse drawer pin 2 for 50 ms on, 500 ms off.
pub const DEFAULT_CASH_DRAWER: [u8; 5] = [ESC, 0x70, 0x00, 0x19, 0xFA];

const RASTER_PREFIX: [u8; 3] = [GS, b'v', b'0'];

pub const RASTER_HEADER_LEN: usize = 8;

/// Split a value into its low and high bytes.
pub fn low_high(value: u32) -> (u8, u8) {
    ((value & 0xFF) as u8, ((value >> 8) & 0xFF) as u8)
}

/// Header of one `GS v 0` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterHeader {
    /// Density mode, `0` for normal.
    pub mode: u8,
    pub width_bytes: u16,
    pub height: u16,
}

impl RasterHeader {
    pub fn new(width_bytes: u16, height: u16) -> Self {
        RasterHeader {
            mode: 0,
            width_bytes,
            height,
        }
    }

    pub fn to_bytes(&self) -> [u8; RASTER_HEADER_LEN] {
        let (xl, xh) = low_high(self.width_bytes as u32);
        let (yl, yh) = low_high(self.height as u32);
        [GS, b'v', b'0', self.mode, xl, xh, yl, yh]
    }

    /// Read a header from the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RASTER_HEADER_LEN || bytes[..3] != RASTER_PREFIX {
            return None;
        }
        Some(RasterHeader {
            mode: bytes[3],
            width_bytes: u16::from_le_bytes([bytes[4], bytes[5]]),
            height: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }

    /// Number of pixel bytes following the header.
    pub fn payload_len(&self) -> usize {
        self.width_bytes as usize * self.height as usize
    }
}

/// One `GS v 0` block for the whole bitmap. Empty for an empty bitmap.
pub fn raster_command(img: &Bitmap) -> Vec<u8> {
    img.to_raster_commands(0)
}

impl Bitmap {
    /// Encode as `GS v 0` blocks of at most `max_height` rows each.
    ///
    /// `0` means a single block. Bands never exceed 65535 rows, the most a
    /// header can describe. A bitmap with rows wider than 65535 bytes cannot
    /// be described at all and encodes to nothing.
    pub fn to_raster_commands(&self, max_height: u32) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }
        if self.width_bytes() > u16::MAX as usize {
            log::warn!("{} is too wide for a raster command", self);
            return Vec::new();
        }
        let band = match max_height {
            0 => self.height(),
            n => n.min(self.height()),
        }
        .min(u16::MAX as u32);
        let wb = self.width_bytes();
        let mut out = Vec::with_capacity(self.as_bytes().len() + RASTER_HEADER_LEN);
        let mut count = 0;
        for chunk in self.as_bytes().chunks(wb * band as usize) {
            let rows = (chunk.len() / wb) as u16;
            out.extend_from_slice(&RasterHeader::new(wb as u16, rows).to_bytes());
            out.extend_from_slice(chunk);
            count += 1;
        }
        log::debug!("{} encoded as {} raster bands", self, count);
        out
    }
}

/// Decode a stream of back-to-back `GS v 0` blocks, one bitmap per block.
pub fn decode_raster_commands(data: &[u8]) -> Result<Vec<Bitmap>> {
    let mut images = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let header = RasterHeader::parse(&data[offset..])
            .ok_or(Error::InvalidRasterCommand { offset })?;
        let start = offset + RASTER_HEADER_LEN;
        let end = start + header.payload_len();
        if end > data.len() {
            return Err(Error::InvalidContentLength {
                expected: header.payload_len(),
                actual: data.len() - start,
            });
        }
        images.push(Bitmap::from_bytes(
            header.width_bytes as u32 * 8,
            header.height as u32,
            data[start..end].to_vec(),
        )?);
        offset = end;
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_high() {
        assert_eq!(low_high(0x0102), (0x02, 0x01));
        assert_eq!(low_high(72), (72, 0));
        assert_eq!(low_high(0x1_0203), (0x03, 0x02));
    }

    #[test]
    fn test_single_block() {
        let img = Bitmap::from_bytes(16, 2, vec![0x80, 0x01, 0xFF, 0x00]).unwrap();
        assert_eq!(
            raster_command(&img),
            vec![0x1D, 0x76, 0x30, 0x00, 2, 0, 2, 0, 0x80, 0x01, 0xFF, 0x00]
        );
        assert!(raster_command(&Bitmap::new(0, 0)).is_empty());
    }

    #[test]
    fn test_bands_cover_all_rows() {
        let mut img = Bitmap::new(24, 10);
        img.set_black(0, 9);
        let data = img.to_raster_commands(4);
        // 4 + 4 + 2 rows
        assert_eq!(data.len(), 3 * RASTER_HEADER_LEN + 30);
        let bands = decode_raster_commands(&data).unwrap();
        let heights: Vec<u32> = bands.iter().map(|b| b.height()).collect();
        assert_eq!(heights, vec![4, 4, 2]);
        assert_eq!(bands[2].pixel(0, 1), 1);

        // A limit taller than the bitmap is a single block
        assert_eq!(img.to_raster_commands(100), raster_command(&img));
    }

    #[test]
    fn test_header_parse() {
        let header = RasterHeader::new(300, 1024);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[4..], &[0x2C, 0x01, 0x00, 0x04]);
        assert_eq!(RasterHeader::parse(&bytes), Some(header));
        assert_eq!(RasterHeader::parse(&INIT), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        match decode_raster_commands(&[0x1B, 0x40]) {
            Err(Error::InvalidRasterCommand { offset }) => assert_eq!(offset, 0),
            other => panic!("unexpected {:?}", other),
        }
        let truncated = [0x1D, 0x76, 0x30, 0x00, 1, 0, 4, 0, 0xFF];
        assert!(matches!(
            decode_raster_commands(&truncated),
            Err(Error::InvalidContentLength { expected: 4, actual: 1 })
        ));
    }

    #[test]
    fn test_rows_wider_than_header_limit() {
        let widest = Bitmap::new(u16::MAX as u32 * 8, 2);
        let data = widest.to_raster_commands(0);
        assert_eq!(&data[4..8], &[0xFF, 0xFF, 0x02, 0x00]);
        assert_eq!(data.len(), RASTER_HEADER_LEN + 2 * u16::MAX as usize);

        let too_wide = Bitmap::new((u16::MAX as u32 + 1) * 8, 1);
        assert!(too_wide.to_raster_commands(0).is_empty());
    }
}
