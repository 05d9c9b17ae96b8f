//! PCI Legacy (CF8/CFC) configuration space access.
//!
//! Uses I/O ports 0xCF8 (address) and 0xCFC (data) for PCI config access.

use super::PciConfig;
use crate::arch::pio::{inl, inw, outl, outw};

const CONFIG_ADDRESS: u16 = 0xCF8;
const CONFIG_DATA: u16 = 0xCFC;

/// Bus/device/function handle using configuration mechanism #1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyPci {
    bus: u8,
    device: u8,
    function: u8,
}

impl LegacyPci {
    /// Create a handle for `bus:device.function`.
    ///
    /// # Safety
    /// Caller must have I/O privilege and the function must exist.
    pub unsafe fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device: device & 0x1F,
            function: function & 0x07,
        }
    }

    #[inline]
    fn address(&self, offset: u8) -> u32 {
        0x8000_0000
            | (self.bus as u32) << 16
            | (self.device as u32) << 11
            | (self.function as u32) << 8
            | (offset as u32 & 0xFC)
    }
}

impl PciConfig for LegacyPci {
    fn read_config32(&mut self, offset: u8) -> u32 {
        // SAFETY: port access granted at construction.
        unsafe {
            outl(CONFIG_ADDRESS, self.address(offset));
            inl(CONFIG_DATA)
        }
    }

    fn write_config32(&mut self, offset: u8, value: u32) {
        // SAFETY: port access granted at construction.
        unsafe {
            outl(CONFIG_ADDRESS, self.address(offset));
            outl(CONFIG_DATA, value);
        }
    }

    fn read_config16(&mut self, offset: u8) -> u16 {
        // SAFETY: port access granted at construction.
        unsafe {
            outl(CONFIG_ADDRESS, self.address(offset));
            inw(CONFIG_DATA + (offset as u16 & 2))
        }
    }

    fn write_config16(&mut self, offset: u8, value: u16) {
        // SAFETY: port access granted at construction.
        unsafe {
            outl(CONFIG_ADDRESS, self.address(offset));
            outw(CONFIG_DATA + (offset as u16 & 2), value);
        }
    }

    fn function(&self) -> u8 {
        self.function
    }
}
