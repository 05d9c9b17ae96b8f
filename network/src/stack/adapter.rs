//! smoltcp Device adapter for NetworkDriver trait.
//!
//! Received frames are copied into a fixed buffer owned by the adapter;
//! transmit tokens render into a stack buffer and hand the finished frame
//! to the driver. No heap allocation in the packet path.

use log::debug;
use smoltcp::phy::{Device, DeviceCapabilities, Medium};
use smoltcp::time::Instant;

use crate::driver::traits::NetworkDriver;
use crate::types::ETH_FRAME_MAX;

/// Size of the adapter's frame buffers.
const FRAME_BUF: usize = 2048;

/// Frame counters kept by the adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterStats {
    pub rx_frames: u32,
    pub tx_frames: u32,
    pub tx_errors: u32,
}

/// Adapter bridging NetworkDriver to smoltcp Device trait.
pub struct SmoltcpAdapter<'a, D: NetworkDriver> {
    driver: &'a mut D,
    rx_buffer: [u8; FRAME_BUF],
    rx_len: usize,
    stats: AdapterStats,
}

impl<'a, D: NetworkDriver> SmoltcpAdapter<'a, D> {
    pub fn new(driver: &'a mut D) -> Self {
        Self {
            driver,
            rx_buffer: [0u8; FRAME_BUF],
            rx_len: 0,
            stats: AdapterStats::default(),
        }
    }

    /// Pull one frame from the driver if the buffer is free.
    pub fn poll_receive(&mut self) {
        if self.rx_len != 0 {
            return;
        }
        match self.driver.receive(&mut self.rx_buffer) {
            Ok(Some(len)) => {
                self.rx_len = len;
                self.stats.rx_frames += 1;
            }
            Ok(None) => {}
            Err(e) => debug!("adapter rx: {}", e),
        }
    }

    pub fn mac_address(&self) -> [u8; 6] {
        self.driver.mac_address()
    }

    pub fn stats(&self) -> AdapterStats {
        self.stats
    }

    /// Check if PHY link is up.
    pub fn driver_link_up(&self) -> bool {
        self.driver.link_up()
    }
}

/// RX token: owns a copy of the frame.
pub struct RxToken {
    buffer: [u8; FRAME_BUF],
    len: usize,
}

impl smoltcp::phy::RxToken for RxToken {
    fn consume<R, F>(mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        f(&mut self.buffer[..self.len])
    }
}

/// TX token: renders into a stack buffer, then transmits via the driver.
pub struct TxToken<'a, D: NetworkDriver> {
    driver: &'a mut D,
    stats: &'a mut AdapterStats,
}

impl<'a, D: NetworkDriver> smoltcp::phy::TxToken for TxToken<'a, D> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let mut buffer = [0u8; FRAME_BUF];
        let len = len.min(FRAME_BUF);
        let result = f(&mut buffer[..len]);

        match self.driver.transmit(&buffer[..len]) {
            Ok(()) => self.stats.tx_frames += 1,
            Err(e) => {
                self.stats.tx_errors += 1;
                debug!("adapter tx: {}", e);
            }
        }
        result
    }
}

impl<'a, D: NetworkDriver> Device for SmoltcpAdapter<'a, D> {
    type RxToken<'b> = RxToken where Self: 'b;
    type TxToken<'b> = TxToken<'b, D> where Self: 'b;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        self.poll_receive();
        if self.rx_len == 0 {
            return None;
        }

        let mut buffer = [0u8; FRAME_BUF];
        let len = self.rx_len;
        buffer[..len].copy_from_slice(&self.rx_buffer[..len]);
        self.rx_len = 0;

        Some((
            RxToken { buffer, len },
            TxToken {
                driver: &mut *self.driver,
                stats: &mut self.stats,
            },
        ))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if !self.driver.can_transmit() {
            return None;
        }
        Some(TxToken {
            driver: &mut *self.driver,
            stats: &mut self.stats,
        })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.medium = Medium::Ethernet;
        caps.max_transmission_unit = ETH_FRAME_MAX;
        // One frame in flight: the driver waits for each send.
        caps.max_burst_size = Some(1);
        caps
    }
}
