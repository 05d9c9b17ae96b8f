//! Tigon3 error types.

use core::fmt;

use crate::time::PollTimeout;

/// Which bounded wait ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitSite {
    /// NVRAM software arbitration grant.
    NvramArbitration,
    /// NVRAM command DONE bit.
    NvramCommand,
    /// Legacy EEPROM COMPLETE bit.
    EepromComplete,
    /// Bootcode acknowledgement of the firmware mailbox magic.
    FirmwareHandshake,
    /// RX CPU event clear after a firmware pause command.
    FirmwarePause,
    /// A hardware block did not drop its enable bit (register offset).
    StopBlock(u32),
    /// TX MAC did not drop its enable bit.
    TxModeDisable,
    /// Buffer manager did not come up.
    BufferManager,
    /// Flow-through queues did not leave reset.
    FtqReset,
    /// Host coalescing engine did not stop.
    HostCoalescing,
    /// BMCR reset bit did not self-clear.
    PhyReset,
    /// DMA test descriptor never completed.
    DmaTest,
}

/// Tigon3 driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tg3Error {
    /// A bounded hardware wait expired.
    Timeout(WaitSite),
    /// Caller passed an out-of-range or misaligned argument.
    InvalidArgument,
    /// Required PCI capability or resource missing.
    NoDevice,
    /// Device stopped responding to register access.
    DeviceNotResponding,
    /// MII management interface stayed busy.
    PhyBusy,
    /// PHY id is not one this driver knows how to drive.
    UnsupportedPhy,
    /// Chip revision needs a firmware patch this driver does not carry.
    UnsupportedChip,
    /// DMA self-test read back corrupted data.
    DmaTestFailed,
    /// Resolved MAC address is not a unicast address.
    InvalidMac,
    /// Transmit did not complete and the chip was reinitialised.
    TxTimeout,
    /// Carrier never came up during attach.
    NoLink,
    /// Chip is not attached, or was halted.
    NotReady,
    /// Send ring has no room for another header/payload pair.
    TxQueueFull,
    /// Payload larger than the transmit bounce buffer.
    FrameTooLarge(usize),
    /// Caller's receive buffer is shorter than the frame.
    BufferTooSmall(usize),
    /// Ring arena already claimed by another device.
    RingsInUse,
}

impl Tg3Error {
    /// Attach a wait site to a [`PollTimeout`].
    #[inline]
    pub fn timeout(site: WaitSite) -> impl FnOnce(PollTimeout) -> Self {
        move |_| Tg3Error::Timeout(site)
    }
}

impl fmt::Display for WaitSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitSite::NvramArbitration => f.write_str("NVRAM arbitration"),
            WaitSite::NvramCommand => f.write_str("NVRAM command"),
            WaitSite::EepromComplete => f.write_str("EEPROM read"),
            WaitSite::FirmwareHandshake => f.write_str("firmware handshake"),
            WaitSite::FirmwarePause => f.write_str("firmware pause"),
            WaitSite::StopBlock(ofs) => write!(f, "block stop at {:#06x}", ofs),
            WaitSite::TxModeDisable => f.write_str("TX MAC disable"),
            WaitSite::BufferManager => f.write_str("buffer manager enable"),
            WaitSite::FtqReset => f.write_str("FTQ reset"),
            WaitSite::HostCoalescing => f.write_str("host coalescing stop"),
            WaitSite::PhyReset => f.write_str("PHY reset"),
            WaitSite::DmaTest => f.write_str("DMA test completion"),
        }
    }
}

impl fmt::Display for Tg3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tg3Error::Timeout(site) => write!(f, "timeout waiting for {}", site),
            Tg3Error::InvalidArgument => f.write_str("invalid argument"),
            Tg3Error::NoDevice => f.write_str("no such device"),
            Tg3Error::DeviceNotResponding => f.write_str("device not responding"),
            Tg3Error::PhyBusy => f.write_str("PHY busy"),
            Tg3Error::UnsupportedPhy => f.write_str("unsupported PHY"),
            Tg3Error::UnsupportedChip => f.write_str("unsupported chip revision"),
            Tg3Error::DmaTestFailed => f.write_str("DMA self-test failed"),
            Tg3Error::InvalidMac => f.write_str("invalid MAC address"),
            Tg3Error::TxTimeout => f.write_str("transmit timed out"),
            Tg3Error::NoLink => f.write_str("no valid link"),
            Tg3Error::NotReady => f.write_str("device not ready"),
            Tg3Error::TxQueueFull => f.write_str("send ring full"),
            Tg3Error::FrameTooLarge(len) => write!(f, "{} byte payload too large", len),
            Tg3Error::BufferTooSmall(len) => write!(f, "need {} byte receive buffer", len),
            Tg3Error::RingsInUse => f.write_str("ring memory already claimed"),
        }
    }
}

/// Driver result alias.
pub type Result<T> = core::result::Result<T, Tg3Error>;
