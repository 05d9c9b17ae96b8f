//! Generic network driver interface.
//!
//! Upper layers (the smoltcp adapter, boot-time protocol code) only see
//! this trait; the concrete NIC driver behind it is chosen at probe time.

use core::fmt;

use crate::types::MacAddress;

/// Transmit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxError {
    /// No descriptors available.
    QueueFull,
    /// Device not initialised or link down.
    DeviceNotReady,
    /// Frame exceeds the driver's bounce buffer.
    FrameTooLarge { provided: usize, max: usize },
    /// Frame shorter than an Ethernet header.
    FrameTooShort,
    /// Hardware never consumed the frame; the device was reset.
    Timeout,
}

/// Receive failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxError {
    /// Caller's buffer cannot hold the frame.
    BufferTooSmall { needed: usize },
    /// Hardware reported an error for the frame.
    DeviceError,
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxError::QueueFull => f.write_str("transmit queue full"),
            TxError::DeviceNotReady => f.write_str("device not ready"),
            TxError::FrameTooLarge { provided, max } => {
                write!(f, "frame of {} bytes exceeds {}", provided, max)
            }
            TxError::FrameTooShort => f.write_str("frame shorter than Ethernet header"),
            TxError::Timeout => f.write_str("transmit timed out"),
        }
    }
}

impl fmt::Display for RxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RxError::BufferTooSmall { needed } => write!(f, "buffer too small, need {}", needed),
            RxError::DeviceError => f.write_str("device receive error"),
        }
    }
}

/// Polled Ethernet driver.
pub trait NetworkDriver {
    /// Station address.
    fn mac_address(&self) -> MacAddress;

    /// True if a frame can be queued right now.
    fn can_transmit(&self) -> bool;

    /// True if a received frame may be waiting.
    fn can_receive(&self) -> bool;

    /// Send one complete Ethernet frame (header included).
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TxError>;

    /// Copy one received frame into `buffer`.
    ///
    /// `Ok(None)` means nothing was pending.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, RxError>;

    /// Return consumed receive buffers to the hardware.
    fn refill_rx_queue(&mut self);

    /// Reclaim finished transmit descriptors.
    fn collect_tx_completions(&mut self);

    /// Link state as last observed.
    fn link_up(&self) -> bool;
}

/// Static identification a driver exposes before probing.
pub trait DriverInit {
    /// PCI vendor ids this driver claims.
    fn supported_vendors() -> &'static [u16];

    /// PCI (vendor, device) pairs this driver claims.
    fn supported_devices() -> &'static [(u16, u16)];

    /// True if `vendor:device` is handled by this driver.
    fn supports_device(vendor: u16, device: u16) -> bool {
        Self::supported_devices()
            .iter()
            .any(|&(v, d)| v == vendor && d == device)
    }
}
