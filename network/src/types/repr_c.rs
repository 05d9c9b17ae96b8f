//! #[repr(C)] structures handed to boot-time protocol code.
//!
//! CRITICAL: these mirror real-mode firmware layouts. Field order and
//! packing must not change.

/// Real-mode segment:offset pointer.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegOff16 {
    pub offset: u16,
    pub segment: u16,
}

impl SegOff16 {
    /// Linear address this pointer refers to.
    pub fn linear(&self) -> u32 {
        let seg = self.segment;
        let off = self.offset;
        ((seg as u32) << 4) + off as u32
    }
}

/// Real-mode segment descriptor.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegDesc {
    pub segment_address: u16,
    pub physical_address: u32,
    pub seg_size: u16,
}

/// Bus the NIC sits on.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Isa = 0,
    Eisa = 1,
    Mca = 2,
    Pci = 3,
}

/// Identity of the adapter the driver is bound to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NicIdentity {
    pub bus_type: BusType,
    pub vendor_id: u16,
    pub device_id: u16,
    /// Bus/device/function packed as `bus << 8 | dev << 3 | func`.
    pub bus_dev_fn: u16,
}

impl NicIdentity {
    /// Identity for a PCI function.
    pub fn pci(vendor_id: u16, device_id: u16, bus: u8, dev: u8, func: u8) -> Self {
        Self {
            bus_type: BusType::Pci,
            vendor_id,
            device_id,
            bus_dev_fn: (bus as u16) << 8 | ((dev as u16) & 0x1F) << 3 | (func as u16 & 7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    #[test]
    fn packed_sizes() {
        assert_eq!(size_of::<SegOff16>(), 4);
        assert_eq!(size_of::<SegDesc>(), 8);
    }

    #[test]
    fn segoff_linear() {
        let p = SegOff16 { offset: 0x0010, segment: 0x07C0 };
        assert_eq!(p.linear(), 0x7C10);
    }

    #[test]
    fn pci_bdf_packing() {
        let id = NicIdentity::pci(0x14e4, 0x1648, 3, 4, 1);
        assert_eq!(id.bus_dev_fn, 0x0321);
    }
}
