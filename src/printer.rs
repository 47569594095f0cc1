//! Printer backends and the named printer registry.
//!
//! Every backend runs a [`Bitmap`] through its [`Transformer`], turns it
//! into the same ESC/POS job with [`render_job`] and differs only in where
//! the bytes go: a device file, a serial port, a TCP socket or a directory
//! of PNG files.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use crate::escpos::{DEFAULT_CASH_DRAWER, DEFAULT_CUT, INIT};
use crate::serial::{SerialPrinter, SerialSettings};
use crate::transform::{transformer_by_name, Identity, Transformer};
use crate::{DEFAULT_MARGIN_BOTTOM, DEFAULT_MAX_BAND_HEIGHT, DEFAULT_PAPER_WIDTH};

/// Raw TCP printing port.
pub const DEFAULT_TCP_PORT: u16 = 9100;

/// Connect and write timeout of [`NetworkPrinter`] and [`SerialPrinter`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Directory used by [`FilePrinter`] when the address is empty.
pub const DEFAULT_FILE_DIR: &str = "./png-receipts";

/// A receipt printer.
pub trait Printer: fmt::Display {
    /// Pulse the cash drawer connected to the printer.
    fn open_cash_drawer(&mut self) -> Result<()>;

    /// Print a bitmap, cutting after every page it contains.
    fn print_bitmap(&mut self, img: Bitmap) -> Result<()>;

    /// Send bytes to the printer unchanged.
    fn print_raw(&mut self, data: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterKind {
    /// USB printer-class device such as `/dev/usb/lp0`.
    Usb,
    /// Serial port device, `address` being `port[,options]`.
    Serial,
    /// Network printer listening on raw TCP.
    Tcp,
    /// Directory receiving PNG renderings instead of a printer.
    File,
}

impl PrinterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterKind::Usb => "usb",
            PrinterKind::Serial => "serial",
            PrinterKind::Tcp => "tcp",
            PrinterKind::File => "file",
        }
    }
}

impl FromStr for PrinterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "usb" => Ok(PrinterKind::Usb),
            "serial" => Ok(PrinterKind::Serial),
            "tcp" => Ok(PrinterKind::Tcp),
            "file" => Ok(PrinterKind::File),
            _ => Err(Error::UnknownPrinterType(s.to_string())),
        }
    }
}

impl fmt::Display for PrinterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One printer entry of the configuration file.
///
/// ```json
/// {
///     "kitchen": { "type": "tcp", "address": "192.168.1.50", "paper_width": 384 },
///     "front": { "type": "usb", "address": "/dev/usb/lp0", "cut_command": "1D5600" }
/// }
/// ```
///
/// Missing or zero numbers and missing or malformed hex commands fall back
/// to the defaults when the entry is [resolved](PrinterConfig::settings).
/// `transformer` names the [`Transformer`] applied to every receipt; empty
/// or unknown names print receipts unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub paper_width: u32,
    pub margin_bottom: u32,
    pub cut_command: String,
    pub cash_drawer_command: String,
    pub max_band_height: u32,
    pub transformer: String,
}

impl PrinterConfig {
    /// Entry with every optional field left at its default.
    ///
    /// # Example
    ///
    /// ```
    /// use epos_raster::{PrinterConfig, PrinterKind};
    ///
    /// let config = PrinterConfig::new(PrinterKind::Tcp, "192.168.1.50")
    ///     .paper_width(384)
    ///     .margin_bottom(64);
    /// assert_eq!(config.settings().paper_width, 384);
    /// ```
    pub fn new(kind: PrinterKind, address: &str) -> PrinterConfig {
        PrinterConfig {
            kind: kind.as_str().to_string(),
            address: address.to_string(),
            ..PrinterConfig::default()
        }
    }

    pub fn paper_width(self, paper_width: u32) -> Self {
        PrinterConfig {
            paper_width,
            ..self
        }
    }

    pub fn margin_bottom(self, margin_bottom: u32) -> Self {
        PrinterConfig {
            margin_bottom,
            ..self
        }
    }

    pub fn cut_command(self, command: &[u8]) -> Self {
        PrinterConfig {
            cut_command: hex::encode_upper(command),
            ..self
        }
    }

    pub fn cash_drawer_command(self, command: &[u8]) -> Self {
        PrinterConfig {
            cash_drawer_command: hex::encode_upper(command),
            ..self
        }
    }

    pub fn max_band_height(self, max_band_height: u32) -> Self {
        PrinterConfig {
            max_band_height,
            ..self
        }
    }

    pub fn transformer(self, name: &str) -> Self {
        PrinterConfig {
            transformer: name.to_string(),
            ..self
        }
    }

    pub fn printer_kind(&self) -> Result<PrinterKind> {
        self.kind.parse()
    }

    /// Values a backend works with, defaults filled in.
    pub fn settings(&self) -> PrinterSettings {
        PrinterSettings {
            paper_width: or_default(self.paper_width, DEFAULT_PAPER_WIDTH),
            margin_bottom: or_default(self.margin_bottom, DEFAULT_MARGIN_BOTTOM),
            max_band_height: or_default(self.max_band_height, DEFAULT_MAX_BAND_HEIGHT),
            cut_command: command_or_default("cut_command", &self.cut_command, &DEFAULT_CUT),
            cash_drawer_command: command_or_default(
                "cash_drawer_command",
                &self.cash_drawer_command,
                &DEFAULT_CASH_DRAWER,
            ),
        }
    }
}

fn or_default(value: u32, default: u32) -> u32 {
    if value == 0 {
        default
    } else {
        value
    }
}

/// Decode a hex command such as `"1D 56 01"`. Spaces are ignored.
pub fn parse_command(s: &str) -> Result<Vec<u8>> {
    let compact: String = s.split_whitespace().collect();
    Ok(hex::decode(compact)?)
}

fn command_or_default(name: &str, s: &str, default: &[u8]) -> Vec<u8> {
    if s.trim().is_empty() {
        return default.to_vec();
    }
    match parse_command(s) {
        Ok(command) if !command.is_empty() => command,
        Ok(_) => default.to_vec(),
        Err(err) => {
            warn!("{} {:?} is not valid hex ({}), using default", name, s, err);
            default.to_vec()
        }
    }
}

/// Resolved printer parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterSettings {
    /// Printable width in pixels.
    pub paper_width: u32,
    /// White rows fed after each page before cutting.
    pub margin_bottom: u32,
    /// Rows per `GS v 0` band.
    pub max_band_height: u32,
    pub cut_command: Vec<u8>,
    pub cash_drawer_command: Vec<u8>,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        PrinterSettings {
            paper_width: DEFAULT_PAPER_WIDTH,
            margin_bottom: DEFAULT_MARGIN_BOTTOM,
            max_band_height: DEFAULT_MAX_BAND_HEIGHT,
            cut_command: DEFAULT_CUT.to_vec(),
            cash_drawer_command: DEFAULT_CASH_DRAWER.to_vec(),
        }
    }
}

/// Build the complete job for `img`.
///
/// The job resets the printer, then sends each page placed on the paper by
/// its alignment and followed by the bottom margin and the cut command.
pub fn render_job(settings: &PrinterSettings, img: Bitmap) -> Vec<u8> {
    let mut buf = INIT.to_vec();
    let pages = img.cut_pages();
    for mut page in pages.into_iter() {
        page.apply_auto_margin_left(settings.paper_width);
        page.add_margin_bottom(settings.margin_bottom);
        buf.extend(page.to_raster_commands(settings.max_band_height));
        buf.extend_from_slice(&settings.cut_command);
    }
    debug!("rendered job of {} bytes", buf.len());
    buf
}

pub(crate) fn drawer_job(settings: &PrinterSettings) -> Vec<u8> {
    let mut buf = INIT.to_vec();
    buf.extend_from_slice(&settings.cash_drawer_command);
    buf
}

/// Run `img` through `transformer` before rendering.
///
/// Empty input is [`Error::EmptyData`]. `None` means the transformer
/// dropped the job, or left nothing to print, and nothing is sent.
pub(crate) fn transform_job(transformer: &dyn Transformer, img: Bitmap) -> Result<Option<Bitmap>> {
    if img.is_empty() {
        return Err(Error::EmptyData);
    }
    match transformer.transform(img) {
        Some(img) if !img.is_empty() => Ok(Some(img)),
        _ => {
            info!("job skipped by transformer {}", transformer.name());
            Ok(None)
        }
    }
}

/// Printer reached through a device file, opened for every job.
///
/// This covers USB printer-class devices such as `/dev/usb/lp0`.
#[derive(Debug, Clone)]
pub struct DevicePrinter {
    path: PathBuf,
    settings: PrinterSettings,
    transformer: Arc<dyn Transformer>,
}

impl DevicePrinter {
    pub fn new<P: AsRef<Path>>(path: P, settings: PrinterSettings) -> Self {
        DevicePrinter {
            path: path.as_ref().to_path_buf(),
            settings,
            transformer: Arc::new(Identity),
        }
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &PrinterSettings {
        &self.settings
    }

    fn send(&self, data: &[u8]) -> Result<()> {
        let mut device = OpenOptions::new().append(true).open(&self.path)?;
        device.write_all(data)?;
        device.flush()?;
        info!("wrote {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }
}

impl fmt::Display for DevicePrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DevicePrinter(path: {}, paper_width: {}, margin_bottom: {}, transformer: {})",
            self.path.display(),
            self.settings.paper_width,
            self.settings.margin_bottom,
            self.transformer.name()
        )
    }
}

impl Printer for DevicePrinter {
    fn open_cash_drawer(&mut self) -> Result<()> {
        self.send(&drawer_job(&self.settings))
    }

    fn print_bitmap(&mut self, img: Bitmap) -> Result<()> {
        let img = match transform_job(self.transformer.as_ref(), img)? {
            Some(img) => img,
            None => return Ok(()),
        };
        let job = render_job(&self.settings, img);
        self.send(&job)
    }

    fn print_raw(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyData);
        }
        self.send(data)
    }
}

/// Add the raw printing port when `address` has none.
fn with_default_port(address: &str) -> String {
    let address = address.trim();
    if address.parse::<SocketAddr>().is_ok() {
        return address.to_string();
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_TCP_PORT).to_string();
    }
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, DEFAULT_TCP_PORT)
    }
}

/// Printer listening on a raw TCP port.
///
/// The connection is opened on first use and kept. A write that fails on a
/// kept connection is retried once on a fresh one.
#[derive(Debug)]
pub struct NetworkPrinter {
    address: String,
    timeout: Duration,
    settings: PrinterSettings,
    transformer: Arc<dyn Transformer>,
    stream: Option<TcpStream>,
}

impl NetworkPrinter {
    /// `address` is `host` or `host:port`.
    pub fn new(address: &str, settings: PrinterSettings) -> Result<Self> {
        if address.trim().is_empty() {
            return Err(Error::InvalidConfig("tcp printer without address".into()));
        }
        Ok(NetworkPrinter {
            address: with_default_port(address),
            timeout: DEFAULT_TIMEOUT,
            settings,
            transformer: Arc::new(Identity),
            stream: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Drop the kept connection.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("closed connection to {}", self.address);
        }
    }

    fn connect(&self) -> Result<TcpStream> {
        let addr = self
            .address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::InvalidConfig(format!("cannot resolve {}", self.address)))?;
        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;
        stream.write_all(&INIT)?;
        info!("connected to {}", self.address);
        Ok(stream)
    }

    fn write_once(&mut self, data: &[u8]) -> Result<()> {
        if self.stream.is_none() {
            self.stream = Some(self.connect()?);
        }
        if let Some(stream) = self.stream.as_mut() {
            stream.write_all(data)?;
            stream.flush()?;
        }
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let reused = self.stream.is_some();
        match self.write_once(data) {
            Err(Error::Io(err)) if reused => {
                warn!("write to {} failed ({}), reconnecting", self.address, err);
                self.stream = None;
                self.write_once(data)
            }
            other => other,
        }
        .map_err(|err| {
            self.stream = None;
            err
        })?;
        info!("sent {} bytes to {}", data.len(), self.address);
        Ok(())
    }
}

impl fmt::Display for NetworkPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NetworkPrinter(address: {}, paper_width: {}, margin_bottom: {}, transformer: {})",
            self.address,
            self.settings.paper_width,
            self.settings.margin_bottom,
            self.transformer.name()
        )
    }
}

impl Printer for NetworkPrinter {
    fn open_cash_drawer(&mut self) -> Result<()> {
        let command = self.settings.cash_drawer_command.clone();
        self.send(&command)
    }

    fn print_bitmap(&mut self, img: Bitmap) -> Result<()> {
        let img = match transform_job(self.transformer.as_ref(), img)? {
            Some(img) => img,
            None => return Ok(()),
        };
        let job = render_job(&self.settings, img);
        self.send(&job)
    }

    fn print_raw(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyData);
        }
        self.send(data)
    }
}

/// Writes pages as PNG files, for development without a printer.
#[derive(Debug, Clone)]
pub struct FilePrinter {
    dir: PathBuf,
    sequence: u32,
    transformer: Arc<dyn Transformer>,
}

impl FilePrinter {
    /// Create `dir` if needed. An empty path means [`DEFAULT_FILE_DIR`].
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = match dir.as_ref() {
            p if p.as_os_str().is_empty() => PathBuf::from(DEFAULT_FILE_DIR),
            p => p.to_path_buf(),
        };
        fs::create_dir_all(&dir)?;
        Ok(FilePrinter {
            dir,
            sequence: 0,
            transformer: Arc::new(Identity),
        })
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&mut self, extension: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.sequence += 1;
        self.dir
            .join(format!("{}-{:04}.{}", stamp, self.sequence, extension))
    }
}

impl fmt::Display for FilePrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FilePrinter(dir: {}, transformer: {})",
            self.dir.display(),
            self.transformer.name()
        )
    }
}

impl Printer for FilePrinter {
    fn open_cash_drawer(&mut self) -> Result<()> {
        debug!("{} has no cash drawer", self);
        Ok(())
    }

    fn print_bitmap(&mut self, img: Bitmap) -> Result<()> {
        let img = match transform_job(self.transformer.as_ref(), img)? {
            Some(img) => img,
            None => return Ok(()),
        };
        for page in img.cut_pages() {
            let path = self.next_path("png");
            page.save_png(&path)?;
            info!("saved {} to {}", page, path.display());
        }
        Ok(())
    }

    fn print_raw(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyData);
        }
        let path = self.next_path("bin");
        fs::write(&path, data)?;
        info!("saved {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

fn configured_transformer(name: &str) -> Arc<dyn Transformer> {
    transformer_by_name(name).unwrap_or_else(|| {
        warn!("unknown transformer {:?}, printing receipts unchanged", name);
        Arc::new(Identity)
    })
}

/// Open the backend described by `config`.
pub fn open_printer(config: &PrinterConfig) -> Result<Box<dyn Printer>> {
    let kind = config.printer_kind()?;
    let settings = config.settings();
    let address = config.address.trim();
    let transformer = configured_transformer(&config.transformer);
    let printer: Box<dyn Printer> = match kind {
        PrinterKind::Usb => {
            if address.is_empty() {
                return Err(Error::InvalidConfig("usb printer without address".into()));
            }
            Box::new(DevicePrinter::new(address, settings).with_transformer(transformer))
        }
        PrinterKind::Serial => Box::new(
            SerialPrinter::new(SerialSettings::parse(address)?, settings)
                .with_transformer(transformer),
        ),
        PrinterKind::Tcp => {
            Box::new(NetworkPrinter::new(address, settings)?.with_transformer(transformer))
        }
        PrinterKind::File => Box::new(FilePrinter::new(address)?.with_transformer(transformer)),
    };
    Ok(printer)
}

/// Printers by name.
#[derive(Default)]
pub struct PrinterRegistry {
    printers: BTreeMap<String, Box<dyn Printer>>,
}

impl PrinterRegistry {
    pub fn new() -> Self {
        PrinterRegistry::default()
    }

    /// Open every configured printer.
    ///
    /// Entries that cannot be opened, such as those of an unknown type, are
    /// skipped with a warning. Fails with [`Error::NoPrinters`] when nothing
    /// is left.
    pub fn from_configs(configs: BTreeMap<String, PrinterConfig>) -> Result<Self> {
        let mut registry = PrinterRegistry::new();
        for (name, config) in configs {
            match open_printer(&config) {
                Ok(printer) => {
                    info!("printer {}: {}", name, printer);
                    registry.insert(&name, printer);
                }
                Err(err) => warn!("skipping printer {}: {}", name, err),
            }
        }
        if registry.is_empty() {
            return Err(Error::NoPrinters);
        }
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let configs: BTreeMap<String, PrinterConfig> = serde_json::from_str(json)?;
        PrinterRegistry::from_configs(configs)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        debug!("loading printers from {}", path.as_ref().display());
        PrinterRegistry::from_json_str(&json)
    }

    /// Add or replace a printer.
    pub fn insert(&mut self, name: &str, printer: Box<dyn Printer>) {
        self.printers.insert(name.to_string(), printer);
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut (dyn Printer + 'static)> {
        match self.printers.get_mut(name) {
            Some(printer) => Ok(printer.as_mut()),
            None => Err(Error::UnknownPrinter(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.printers.contains_key(name)
    }

    /// Names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.printers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }
}

impl fmt::Debug for PrinterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
