//! ePOS Raster Engine
//!
//! This crate provides the monochrome raster core of an ePOS print server:
//! a packed 1-bit [`Bitmap`] with editing, margin and view operations,
//! template [`Pattern`] search, connected-component segmentation and glyph
//! recognition, and the ESC/POS `GS v 0` encoding that receipt printers
//! consume. The [`printer`](Printer) backends run each receipt through an
//! optional [`Transformer`] and deliver the encoded jobs to USB devices,
//! serial ports, network printers or a directory of PNG files.
//!
//! # Example
//!
//! ```rust,no_run
//! use epos_raster::{Bitmap, Printer, PrinterRegistry};
//!
//! let img = Bitmap::open_png("receipt.png").unwrap();
//! let mut printers = PrinterRegistry::load("config.json").unwrap();
//! printers.get_mut("front").unwrap().print_bitmap(img).unwrap();
//! ```

mod bitmap;
mod cutline;
mod edit;
mod error;
mod escpos;
mod import;
mod margin;
mod ocr;
mod pattern;
mod printer;
mod rect;
mod search;
mod segment;
mod serial;
mod transform;
mod view;

pub use crate::{
    bitmap::{Alignment, Bitmap},
    cutline::{cutline_row, is_cutline, CUTLINE},
    error::{Error, Result},
    escpos::{
        decode_raster_commands, low_high, raster_command, RasterHeader, DEFAULT_CASH_DRAWER,
        DEFAULT_CUT, INIT, RASTER_HEADER_LEN,
    },
    import::{DITHER_CUTOFF, THRESHOLD_CUTOFF},
    ocr::{similarity, GlyphCatalog, MATCH_THRESHOLD, UNKNOWN_GLYPH},
    pattern::{Color, Pattern},
    printer::{
        open_printer, parse_command, render_job, DevicePrinter, FilePrinter, NetworkPrinter,
        Printer, PrinterConfig, PrinterKind, PrinterRegistry, PrinterSettings, DEFAULT_FILE_DIR,
        DEFAULT_TCP_PORT, DEFAULT_TIMEOUT,
    },
    rect::{Point, Rect},
    segment::components,
    serial::{SerialPrinter, SerialSettings, DEFAULT_BAUD_RATE},
    transform::{transformer_by_name, Identity, Reprint, Transformer},
    view::{Raster, View, ViewMut},
};

/// Printable width in pixels of an 80 mm receipt printer at 203 dpi.
///
/// Used when a printer entry does not give its own paper width.
pub const DEFAULT_PAPER_WIDTH: u32 = 576;

/// White rows fed after each page so the cut falls below the content.
pub const DEFAULT_MARGIN_BOTTOM: u32 = 120;

/// Rows per `GS v 0` band sent to a printer.
///
/// Many printers buffer a limited number of raster rows, so tall receipts
/// are split into bands of at most this height.
pub const DEFAULT_MAX_BAND_HEIGHT: u32 = 1024;
