//! COM1 serial logger.
//!
//! Backs the `log` facade with the first legacy UART so driver messages
//! are visible before any console exists. Output is one line per record:
//!
//! ```text
//! [tg3] INFO  Tigon3 [partno(BCM95704A7) rev 2003 PHY(serdes)] (PCI:33MHz:64-bit)
//! ```
//!
//! # Reference
//! 16550 UART datasheet (LSR bit 5, THRE)

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

use crate::arch::pio::{inb, outb};

/// COM1 base port.
const SERIAL_PORT: u16 = 0x3F8;
/// Line status register offset.
const LSR: u16 = 5;
/// Transmit holding register empty.
const LSR_THRE: u8 = 0x20;
/// LSR polls before a byte is dropped.
const TX_RETRIES: u32 = 100;

/// Raw COM1 writer.
pub struct SerialPort {
    base: u16,
}

impl SerialPort {
    pub const fn com1() -> Self {
        Self { base: SERIAL_PORT }
    }

    /// Write one byte, dropping it if the UART never drains.
    pub fn write_byte(&mut self, byte: u8) {
        for _ in 0..TX_RETRIES {
            // SAFETY: COM1 is a fixed legacy port; reading LSR has no side effects.
            if unsafe { inb(self.base + LSR) } & LSR_THRE != 0 {
                // SAFETY: THR write on the port probed above.
                unsafe { outb(self.base, byte) };
                return;
            }
            core::hint::spin_loop();
        }
    }
}

impl Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(b);
        }
        Ok(())
    }
}

/// `log::Log` implementation writing to COM1.
pub struct SerialLogger {
    port: Mutex<SerialPort>,
}

static LOGGER: SerialLogger = SerialLogger {
    port: Mutex::new(SerialPort::com1()),
};

/// Render one record the way the logger prints it.
pub fn format_record<W: Write>(out: &mut W, record: &Record<'_>) -> fmt::Result {
    writeln!(out, "[tg3] {:<5} {}", record.level(), record.args())
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut port = self.port.lock();
        // The UART drops bytes rather than failing, so this never errors.
        let _ = format_record(&mut *port, record);
    }

    fn flush(&self) {}
}

/// Install the COM1 logger.
///
/// Fails if another logger was already installed.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
