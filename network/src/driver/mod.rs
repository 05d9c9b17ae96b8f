//! Driver abstraction module.
//!
//! # Preconditions (platform guarantees before driver init)
//! - Bus mastering enabled
//! - MMIO BAR mapped uncached
//! - DMA legal (addresses valid, no IOMMU blocking)
//!
//! Drivers perform a full chip reset at attach and make no assumptions
//! about the state firmware left the device in. If reset fails, attach
//! fails.

pub mod tg3;
pub mod traits;

pub use tg3::{Tg3Config, Tg3Driver, Tg3Error};
pub use traits::{DriverInit, NetworkDriver, RxError, TxError};
