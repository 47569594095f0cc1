//! Serial port printers, including USB printers exposed as virtual COM
//! ports.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serialport::{DataBits, Parity, StopBits};

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use crate::printer::{
    drawer_job, render_job, transform_job, Printer, PrinterSettings, DEFAULT_TIMEOUT,
};
use crate::transform::{Identity, Transformer};

/// Line speed used when the address does not name one.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Port name and line settings, parsed from an address such as
/// `/dev/ttyUSB0,baud=9600,databits=8,parity=N,stopbits=1`.
///
/// Options left out default to 115200 baud, 8 data bits, no parity and one
/// stop bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl SerialSettings {
    pub fn new(port: &str) -> Self {
        SerialSettings {
            port: port.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    /// Parse `port[,key=value...]`.
    ///
    /// Keys are case insensitive: `baud`, `databits` (5 to 8), `parity`
    /// (`N`, `O` or `E`) and `stopbits` (1 or 2). A value the port cannot
    /// use is an error; unknown keys are logged and ignored.
    ///
    /// ```
    /// use epos_raster::SerialSettings;
    ///
    /// let serial = SerialSettings::parse("COM3,baud=9600,parity=E").unwrap();
    /// assert_eq!(serial.port, "COM3");
    /// assert_eq!(serial.baud_rate, 9600);
    /// assert_eq!(serial.to_string(), "COM3,9600,8E1");
    /// ```
    pub fn parse(address: &str) -> Result<Self> {
        let mut parts = address.split(',');
        let port = parts.next().unwrap_or("").trim();
        if port.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "serial address {:?} has no port",
                address
            )));
        }
        let mut serial = SerialSettings::new(port);
        for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
            let invalid = || Error::InvalidConfig(format!("serial option {:?} in {:?}", part, address));
            let (key, value) = part.split_once('=').ok_or_else(invalid)?;
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "baud" => {
                    serial.baud_rate = value
                        .parse::<u32>()
                        .ok()
                        .filter(|&baud| baud > 0)
                        .ok_or_else(invalid)?
                }
                "databits" => {
                    serial.data_bits = match value {
                        "5" => DataBits::Five,
                        "6" => DataBits::Six,
                        "7" => DataBits::Seven,
                        "8" => DataBits::Eight,
                        _ => return Err(invalid()),
                    }
                }
                "parity" => {
                    serial.parity = match value.to_uppercase().as_str() {
                        "N" | "NONE" => Parity::None,
                        "O" | "ODD" => Parity::Odd,
                        "E" | "EVEN" => Parity::Even,
                        _ => return Err(invalid()),
                    }
                }
                "stopbits" => {
                    serial.stop_bits = match value {
                        "1" => StopBits::One,
                        "2" => StopBits::Two,
                        _ => return Err(invalid()),
                    }
                }
                other => warn!("ignoring serial option {:?} in {:?}", other, address),
            }
        }
        Ok(serial)
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data_bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(
            f,
            "{},{},{}{}{}",
            self.port, self.baud_rate, data_bits, parity, stop_bits
        )
    }
}

/// Printer on a serial port, opened with its line settings for every job.
#[derive(Debug, Clone)]
pub struct SerialPrinter {
    serial: SerialSettings,
    settings: PrinterSettings,
    timeout: Duration,
    transformer: Arc<dyn Transformer>,
}

impl SerialPrinter {
    pub fn new(serial: SerialSettings, settings: PrinterSettings) -> Self {
        SerialPrinter {
            serial,
            settings,
            timeout: DEFAULT_TIMEOUT,
            transformer: Arc::new(Identity),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn serial_settings(&self) -> &SerialSettings {
        &self.serial
    }

    pub fn settings(&self) -> &PrinterSettings {
        &self.settings
    }

    fn send(&self, data: &[u8]) -> Result<()> {
        let mut port = serialport::new(self.serial.port.as_str(), self.serial.baud_rate)
            .data_bits(self.serial.data_bits)
            .parity(self.serial.parity)
            .stop_bits(self.serial.stop_bits)
            .timeout(self.timeout)
            .open()?;
        port.write_all(data)?;
        port.flush()?;
        info!("wrote {} bytes to {}", data.len(), self.serial);
        Ok(())
    }
}

impl fmt::Display for SerialPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerialPrinter(port: {}, paper_width: {}, margin_bottom: {}, transformer: {})",
            self.serial,
            self.settings.paper_width,
            self.settings.margin_bottom,
            self.transformer.name()
        )
    }
}

impl Printer for SerialPrinter {
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
