//! Transmit path.
//!
//! Each frame goes out as two descriptors: a synthesized Ethernet
//! header and the payload, both copied into bounce buffers in the ring
//! arena. The caller blocks until the chip reports the frame consumed.
//!
//! # Reference
//! Broadcom BCM570X PRG §6.3 (Send Rings)

use log::warn;

use super::error::{Result, Tg3Error};
use super::hw::Tg3Bus;
use super::regs::*;
use super::rings::TX_PAYLOAD_MAX;
use super::{ChipState, Tg3Device};
use crate::arch::barriers::sfence;
use crate::time::{poll_until, Delay};
use crate::types::{EthernetHeader, MacAddress, ETH_HLEN};

/// Consumer polls before a send is declared lost (10µs apart).
pub const TX_WAIT_LOOPS: u32 = 500_000;

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    /// True if a header/payload pair fits in the send ring.
    #[inline]
    pub fn tx_ready(&self) -> bool {
        self.state == ChipState::Ready && self.rings.tx_has_room()
    }

    /// Send `payload` to `dest` under `ethertype` and wait for the chip
    /// to consume it.
    ///
    /// Refused with `NotReady` unless the chip is up. On timeout the
    /// chip is halted, the rings rebuilt and the chip reprogrammed once;
    /// the frame is not resent.
    pub fn post_transmit(&mut self, dest: &MacAddress, ethertype: u16, payload: &[u8]) -> Result<()> {
        if self.state != ChipState::Ready {
            return Err(Tg3Error::NotReady);
        }
        if payload.len() > TX_PAYLOAD_MAX {
            return Err(Tg3Error::FrameTooLarge(payload.len()));
        }
        if !self.rings.tx_has_room() {
            return Err(Tg3Error::TxQueueFull);
        }

        let mut header = [0u8; ETH_HLEN];
        EthernetHeader::new(*dest, self.mac, ethertype)
            .write_to(&mut header)
            .ok_or(Tg3Error::InvalidArgument)?;

        let entry = self.rings.queue_tx(&header, payload);
        sfence();

        // Some revisions drop the first producer update.
        let mbox = MAILBOX_SNDHOST_PROD_IDX_0 + TG3_64BIT_REG_LOW;
        self.regs.tw32_mailbox(mbox, entry);
        self.regs.tw32_mailbox_flush(mbox, entry);

        match poll_until(&mut *self, TX_WAIT_LOOPS, 10, |dev| dev.rings.tx_consumer() == entry) {
            Ok(_) => {
                self.stats.tx_packets += 1;
                Ok(())
            }
            Err(_) => {
                warn!("transmit timed out");
                self.stats.tx_timeouts += 1;
                if let Err(e) = self.recover() {
                    warn!("recovery after transmit timeout failed: {}", e);
                }
                Err(Tg3Error::TxTimeout)
            }
        }
    }
}
