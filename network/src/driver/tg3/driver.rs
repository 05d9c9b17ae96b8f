//! Tigon3 [`NetworkDriver`] façade.
//!
//! Wraps a probed [`Tg3Device`] and translates whole Ethernet frames to
//! the device's header-synthesising transmit path and its one-frame
//! receive poll.
//!
//! # Reference
//! driver/traits.rs

use super::error::{Result, Tg3Error};
use super::hw::{MmioBus, Tg3Bus};
use super::probe::TG3_PCI_IDS;
use super::regs::{PCI_VENDOR_ID_ALTIMA, PCI_VENDOR_ID_BROADCOM, PCI_VENDOR_ID_SYSKONNECT};
use super::rings::{RingMemory, TX_PAYLOAD_MAX};
use super::{ChipState, Tg3Config, Tg3Device};
use crate::driver::traits::{DriverInit, NetworkDriver, RxError, TxError};
use crate::pci::PciConfig;
use crate::time::{Delay, TscDelay};
use crate::types::{EthernetHeader, MacAddress, ETH_HLEN};

/// Largest frame `transmit` accepts (header included).
pub const TX_FRAME_MAX: usize = ETH_HLEN + TX_PAYLOAD_MAX;

/// Probed Tigon3 adapter.
pub struct Tg3Driver<B: Tg3Bus, D: Delay> {
    dev: Tg3Device<B, D>,
}

impl<C: PciConfig> Tg3Driver<MmioBus<C>, TscDelay> {
    /// Attach to a Tigon3 behind a mapped BAR using the static ring arena.
    ///
    /// # Safety
    /// - `mmio_base..mmio_base+mmio_len` must be BAR0, mapped uncached
    /// - `pci` must address the same function
    /// - bus mastering must be enabled and the arena DMA-reachable through
    ///   `config.dma`
    pub unsafe fn new(mmio_base: u64, mmio_len: u64, pci: C, config: Tg3Config) -> Result<Self> {
        let memory = RingMemory::claim_static()?;
        let bus = MmioBus::new(mmio_base, mmio_len, pci);
        Self::attach(bus, TscDelay::new(config.tsc_freq), memory, config)
    }
}

impl<B: Tg3Bus, D: Delay> Tg3Driver<B, D> {
    /// Probe the chip and wait for link.
    pub fn attach(bus: B, delay: D, memory: &'static mut RingMemory, config: Tg3Config) -> Result<Self> {
        let mut dev = Tg3Device::new(bus, delay, memory, config);
        dev.probe()?;
        Ok(Self { dev })
    }

    /// Underlying device.
    #[inline]
    pub fn device(&self) -> &Tg3Device<B, D> {
        &self.dev
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut Tg3Device<B, D> {
        &mut self.dev
    }

    /// Halt the chip. The driver stays usable only after a new attach.
    pub fn disable(&mut self) {
        self.dev.disable();
    }
}

impl<B: Tg3Bus, D: Delay> NetworkDriver for Tg3Driver<B, D> {
    fn mac_address(&self) -> MacAddress {
        self.dev.mac_address()
    }

    fn can_transmit(&self) -> bool {
        self.dev.tx_ready()
    }

    fn can_receive(&self) -> bool {
        self.dev.rx_ready()
    }

    fn transmit(&mut self, frame: &[u8]) -> core::result::Result<(), TxError> {
        if self.dev.state() != ChipState::Ready {
            return Err(TxError::DeviceNotReady);
        }
        let header = EthernetHeader::parse(frame).ok_or(TxError::FrameTooShort)?;
        if frame.len() > TX_FRAME_MAX {
            return Err(TxError::FrameTooLarge {
                provided: frame.len(),
                max: TX_FRAME_MAX,
            });
        }
        let dest = header.dest;
        self.dev
            .post_transmit(&dest, header.ethertype(), &frame[ETH_HLEN..])
            .map_err(TxError::from)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> core::result::Result<Option<usize>, RxError> {
        if self.dev.state() != ChipState::Ready {
            return Ok(None);
        }
        self.dev.poll_receive(buffer).map_err(RxError::from)
    }

    // Posting slots are handed back inside `receive`.
    fn refill_rx_queue(&mut self) {}

    // `transmit` waits for the consumer, so nothing is ever outstanding.
    fn collect_tx_completions(&mut self) {}

    fn link_up(&self) -> bool {
        self.dev.carrier_ok()
    }
}

impl<B: Tg3Bus, D: Delay> DriverInit for Tg3Driver<B, D> {
    fn supported_vendors() -> &'static [u16] {
        &[
            PCI_VENDOR_ID_BROADCOM,
            PCI_VENDOR_ID_SYSKONNECT,
            PCI_VENDOR_ID_ALTIMA,
        ]
    }

    fn supported_devices() -> &'static [(u16, u16)] {
        TG3_PCI_IDS
    }
}

impl From<Tg3Error> for TxError {
    fn from(e: Tg3Error) -> Self {
        match e {
            Tg3Error::TxQueueFull => TxError::QueueFull,
            Tg3Error::FrameTooLarge(payload) => TxError::FrameTooLarge {
                provided: payload + ETH_HLEN,
                max: TX_FRAME_MAX,
            },
            Tg3Error::TxTimeout => TxError::Timeout,
            _ => TxError::DeviceNotReady,
        }
    }
}

impl From<Tg3Error> for RxError {
    fn from(e: Tg3Error) -> Self {
        match e {
            Tg3Error::BufferTooSmall(needed) => RxError::BufferTooSmall { needed },
            _ => RxError::DeviceError,
        }
    }
}
