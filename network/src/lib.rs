//! Polled Broadcom Tigon3 Ethernet driver for network boot firmware.
//!
//! Bare-metal, single-threaded, no interrupts. The caller hands over a
//! mapped register BAR and a PCI configuration handle; the driver owns
//! the chip from reset to halt and exposes it through
//! [`NetworkDriver`](driver::traits::NetworkDriver), which
//! [`SmoltcpAdapter`](stack::SmoltcpAdapter) bridges to an IP stack.
//!
//! # Layout
//! - [`arch`]: port I/O, MMIO, TSC and fences
//! - [`pci`]: configuration space access
//! - [`time`]: delays and the bounded poll helper
//! - [`types`]: Ethernet and `#[repr(C)]` boot types
//! - [`driver`]: the generic driver traits and the Tigon3 driver
//! - [`stack`]: smoltcp glue
//! - [`logger`]: COM1 `log` backend

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod driver;
pub mod logger;
pub mod pci;
pub mod stack;
pub mod time;
pub mod types;

pub use driver::tg3::{Tg3Config, Tg3Device, Tg3Driver, Tg3Error};
pub use driver::traits::{DriverInit, NetworkDriver, RxError, TxError};
pub use logger::init_logger;
