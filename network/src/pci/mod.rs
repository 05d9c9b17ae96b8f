//! PCI configuration-space access.
//!
//! The driver never enumerates the bus. It is handed something that
//! implements [`PciConfig`] for its own function and uses it for the
//! indirect register window, the SRAM window, power management and the
//! config-space save/restore around a core clock reset.
//!
//! # Reference
//! PCI Local Bus Specification 3.0, §6.1 (header), §6.7 (capabilities)

pub mod legacy;

pub use legacy::LegacyPci;

/// Command register.
pub const PCI_COMMAND: u8 = 0x04;
/// Memory Write and Invalidate enable.
pub const PCI_COMMAND_INVALIDATE: u16 = 0x0010;
/// Parity error response.
pub const PCI_COMMAND_PARITY: u16 = 0x0040;
/// SERR# enable.
pub const PCI_COMMAND_SERR: u16 = 0x0100;
/// Status register.
pub const PCI_STATUS: u8 = 0x06;
/// Capabilities list present.
pub const PCI_STATUS_CAP_LIST: u16 = 0x0010;
/// Cache line size (dwords).
pub const PCI_CACHE_LINE_SIZE: u8 = 0x0c;
/// Latency timer.
pub const PCI_LATENCY_TIMER: u8 = 0x0d;
/// Subsystem vendor id.
pub const PCI_SUBSYSTEM_VENDOR_ID: u8 = 0x2c;
/// Subsystem id.
pub const PCI_SUBSYSTEM_ID: u8 = 0x2e;
/// First capability pointer.
pub const PCI_CAPABILITY_LIST: u8 = 0x34;

/// Power management capability id.
pub const PCI_CAP_ID_PM: u8 = 0x01;
/// PM control/status register, relative to the capability.
pub const PCI_PM_CTRL: u8 = 4;
/// PME status (write one to clear).
pub const PCI_PM_CTRL_PME_STATUS: u16 = 0x8000;
/// Power state field (D0..D3hot).
pub const PCI_PM_CTRL_STATE_MASK: u16 = 0x0003;

/// Configuration-space accessor for one PCI function.
///
/// Offsets are byte offsets into the 256-byte header. Implementations
/// must tolerate unaligned sub-dword accesses within a dword.
pub trait PciConfig {
    /// Read a dword.
    fn read_config32(&mut self, offset: u8) -> u32;
    /// Write a dword.
    fn write_config32(&mut self, offset: u8, value: u32);

    /// Read a word.
    fn read_config16(&mut self, offset: u8) -> u16 {
        let dword = self.read_config32(offset & !3);
        (dword >> ((offset & 2) * 8)) as u16
    }

    /// Write a word (read-modify-write of the containing dword).
    fn write_config16(&mut self, offset: u8, value: u16) {
        let shift = (offset & 2) * 8;
        let dword = self.read_config32(offset & !3);
        let merged = (dword & !(0xFFFF << shift)) | ((value as u32) << shift);
        self.write_config32(offset & !3, merged);
    }

    /// Read a byte.
    fn read_config8(&mut self, offset: u8) -> u8 {
        let dword = self.read_config32(offset & !3);
        (dword >> ((offset & 3) * 8)) as u8
    }

    /// Write a byte (read-modify-write of the containing dword).
    fn write_config8(&mut self, offset: u8, value: u8) {
        let shift = (offset & 3) * 8;
        let dword = self.read_config32(offset & !3);
        let merged = (dword & !(0xFF << shift)) | ((value as u32) << shift);
        self.write_config32(offset & !3, merged);
    }

    /// PCI function number of this device (0-7).
    fn function(&self) -> u8;

    /// Walk the capability list looking for `cap_id`.
    ///
    /// Returns the config offset of the capability header. The walk is
    /// bounded to 48 entries so a looped list cannot hang the caller.
    fn find_capability(&mut self, cap_id: u8) -> Option<u8> {
        if self.read_config16(PCI_STATUS) & PCI_STATUS_CAP_LIST == 0 {
            return None;
        }
        let mut pos = self.read_config8(PCI_CAPABILITY_LIST) & !3;
        for _ in 0..48 {
            if pos < 0x40 {
                return None;
            }
            if self.read_config8(pos) == cap_id {
                return Some(pos);
            }
            pos = self.read_config8(pos + 1) & !3;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Space {
        bytes: [u8; 256],
    }

    impl PciConfig for Space {
        fn read_config32(&mut self, offset: u8) -> u32 {
            let o = offset as usize & !3;
            u32::from_le_bytes([
                self.bytes[o],
                self.bytes[o + 1],
                self.bytes[o + 2],
                self.bytes[o + 3],
            ])
        }
        fn write_config32(&mut self, offset: u8, value: u32) {
            let o = offset as usize & !3;
            self.bytes[o..o + 4].copy_from_slice(&value.to_le_bytes());
        }
        fn function(&self) -> u8 {
            0
        }
    }

    fn space_with_caps() -> Space {
        let mut s = Space { bytes: [0; 256] };
        s.bytes[PCI_STATUS as usize] = PCI_STATUS_CAP_LIST as u8;
        s.bytes[PCI_CAPABILITY_LIST as usize] = 0x40;
        // PCI-X at 0x40 -> PM at 0x48 -> end
        s.bytes[0x40] = 0x07;
        s.bytes[0x41] = 0x48;
        s.bytes[0x48] = PCI_CAP_ID_PM;
        s.bytes[0x49] = 0x00;
        s
    }

    #[test]
    fn finds_chained_capability() {
        let mut s = space_with_caps();
        assert_eq!(s.find_capability(PCI_CAP_ID_PM), Some(0x48));
        assert_eq!(s.find_capability(0x05), None);
    }

    #[test]
    fn looped_list_terminates() {
        let mut s = space_with_caps();
        s.bytes[0x49] = 0x40;
        assert_eq!(s.find_capability(0x05), None);
    }

    #[test]
    fn sub_dword_writes_preserve_neighbours() {
        let mut s = Space { bytes: [0; 256] };
        s.write_config32(0x04, 0xAABB_CCDD);
        s.write_config16(0x06, 0x1234);
        assert_eq!(s.read_config32(0x04), 0x1234_CCDD);
        s.write_config8(0x05, 0x00);
        assert_eq!(s.read_config16(0x04), 0x00DD);
        assert_eq!(s.read_config8(0x07), 0x12);
    }
}
