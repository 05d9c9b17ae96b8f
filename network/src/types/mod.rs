//! Shared data types module.
//!
//! Ethernet framing constants, the MAC address type and the
//! `#[repr(C)]` structures shared with boot-time protocol code.

pub mod repr_c;

pub use repr_c::{BusType, NicIdentity, SegDesc, SegOff16};

// ═══════════════════════════════════════════════════════════════════════════
// ETHERNET
// ═══════════════════════════════════════════════════════════════════════════

/// Six-byte station address.
pub type MacAddress = [u8; 6];

/// Address length.
pub const ETH_ALEN: usize = 6;
/// Header length (dst + src + type).
pub const ETH_HLEN: usize = 14;
/// Maximum payload.
pub const ETH_MTU: usize = 1500;
/// Maximum frame without FCS.
pub const ETH_FRAME_MAX: usize = ETH_HLEN + ETH_MTU;
/// Minimum frame without FCS.
pub const ETH_ZLEN: usize = 60;

/// Ethernet II header as it appears on the wire.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dest: MacAddress,
    pub src: MacAddress,
    /// Big-endian ethertype.
    pub ethertype: [u8; 2],
}

impl EthernetHeader {
    /// Build a header, converting `ethertype` to network order.
    pub fn new(dest: MacAddress, src: MacAddress, ethertype: u16) -> Self {
        Self {
            dest,
            src,
            ethertype: ethertype.to_be_bytes(),
        }
    }

    /// Serialise into the first [`ETH_HLEN`] bytes of `out`.
    ///
    /// Returns `None` if `out` is too short.
    pub fn write_to(&self, out: &mut [u8]) -> Option<()> {
        let out = out.get_mut(..ETH_HLEN)?;
        out[..6].copy_from_slice(&self.dest);
        out[6..12].copy_from_slice(&self.src);
        out[12..14].copy_from_slice(&self.ethertype);
        Some(())
    }

    /// Parse the first [`ETH_HLEN`] bytes of `frame`.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let h = frame.get(..ETH_HLEN)?;
        let mut dest = [0u8; 6];
        let mut src = [0u8; 6];
        dest.copy_from_slice(&h[..6]);
        src.copy_from_slice(&h[6..12]);
        Some(Self {
            dest,
            src,
            ethertype: [h[12], h[13]],
        })
    }

    /// Ethertype in host order.
    pub fn ethertype(&self) -> u16 {
        u16::from_be_bytes(self.ethertype)
    }
}
