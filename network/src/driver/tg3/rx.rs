//! Receive path.
//!
//! One frame per call. The chip raises `UPDATED` in the status block
//! whenever it advances the return ring; software clears it, takes the
//! next completion, gives the posting slot back and acknowledges both
//! rings through their mailboxes.
//!
//! # Reference
//! Broadcom BCM570X PRG §6.4 (Receive Return Ring)

use log::{debug, warn};

use super::error::{Result, Tg3Error};
use super::hw::Tg3Bus;
use super::regs::*;
use super::rings::*;
use super::Tg3Device;
use crate::arch::barriers::lfence;
use crate::time::Delay;

/// Trailing FCS the chip leaves on every frame.
const FCS_LEN: u32 = 4;

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    /// True if the chip has posted a status update since the last poll.
    #[inline]
    pub fn rx_ready(&self) -> bool {
        self.rings.status().contains(StatusFlags::UPDATED)
    }

    /// Copy out at most one received frame.
    ///
    /// Returns `Ok(None)` when the status block has not been updated or
    /// the return ring is empty; neither case touches a mailbox. Frames
    /// the chip flagged as bad are dropped and counted. A frame longer
    /// than `buf` is dropped and reported as
    /// [`Tg3Error::BufferTooSmall`].
    pub fn poll_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut status = self.rings.status();
        if !status.contains(StatusFlags::UPDATED) {
            return Ok(None);
        }
        status.remove(StatusFlags::UPDATED);

        if status.contains(StatusFlags::LINK_CHG) {
            status.remove(StatusFlags::LINK_CHG);
            self.rings.set_status(status);
            if let Err(e) = self.setup_phy() {
                warn!("link change: {}", e);
            }
        } else {
            self.rings.set_status(status);
        }

        if self.rings.rx_producer() == self.rings.rx_rcb_ptr {
            return Ok(None);
        }

        self.regs
            .tw32_mailbox(MAILBOX_INTERRUPT_0 + TG3_64BIT_REG_LOW, 1);

        // Descriptor must not be read ahead of the producer index.
        lfence();
        let desc = self.rings.rcb(self.rings.rx_rcb_ptr);
        let mut result = Ok(None);

        if desc.opaque & RXD_OPAQUE_RING_MASK == RXD_OPAQUE_RING_STD {
            result = self.take_frame(&desc, buf);

            self.rings.rx_std_ptr = (self.rings.rx_std_ptr + 1) % RX_RING_SIZE;
            let std_prod = self.rings.rx_std_ptr;
            self.regs
                .tw32_mailbox_flush(MAILBOX_RCV_STD_PROD_IDX + TG3_64BIT_REG_LOW, std_prod);
        }

        self.rings.rx_rcb_ptr = (self.rings.rx_rcb_ptr + 1) % RX_RCB_RING_SIZE;
        let rcb_ptr = self.rings.rx_rcb_ptr;
        self.regs
            .tw32_mailbox_flush(MAILBOX_RCVRET_CON_IDX_0 + TG3_64BIT_REG_LOW, rcb_ptr);

        self.regs
            .tw32_mailbox_flush(MAILBOX_INTERRUPT_0 + TG3_64BIT_REG_LOW, 0);

        // More completions queued behind this one: keep the next poll live.
        if self.rings.rx_producer() != self.rings.rx_rcb_ptr {
            let status = self.rings.status() | StatusFlags::UPDATED;
            self.rings.set_status(status);
        }

        result
    }

    fn take_frame(&mut self, desc: &RxBufferDesc, buf: &mut [u8]) -> Result<Option<usize>> {
        let err = desc.err_vlan & RXD_ERR_MASK;
        if err != 0 && err != RXD_ERR_ODD_NIBBLE_RCVD_MII {
            self.stats.rx_errors += 1;
            debug!("dropped rx frame, error bits {:#010x}", err);
            return Ok(None);
        }

        let len = ((desc.idx_len & RXD_LEN_MASK) >> RXD_LEN_SHIFT).saturating_sub(FCS_LEN) as usize;
        let slot = (desc.opaque & RXD_OPAQUE_INDEX_MASK) >> RXD_OPAQUE_INDEX_SHIFT;
        let frame = match self.rings.rx_buffer(slot).get(..len) {
            Some(frame) => frame,
            None => {
                self.stats.rx_errors += 1;
                debug!("dropped rx frame, length {} overruns buffer", len);
                return Ok(None);
            }
        };

        let dst = buf.get_mut(..len).ok_or(Tg3Error::BufferTooSmall(len))?;
        dst.copy_from_slice(frame);
        self.stats.rx_packets += 1;
        Ok(Some(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tg3::sim::{Access, Sim, SimBus, SimDelay};
    use crate::driver::tg3::testutil;
    use std::vec::Vec;

    fn device() -> (Sim, Tg3Device<SimBus, SimDelay>) {
        let (sim, mut dev) = testutil::device();
        dev.init_rings();
        dev.rings.reset_indices();
        sim.state_mut().log.clear();
        (sim, dev)
    }

    /// Play the chip: complete posting slot `slot` into return entry
    /// `entry` with a frame of `len` bytes (FCS excluded).
    fn complete(dev: &mut Tg3Device<SimBus, SimDelay>, entry: usize, slot: u32, len: u32, err: u32) {
        let mem = dev.rings.mem_mut();
        for (i, b) in mem.rx_buffers[slot as usize].0[..len as usize].iter_mut().enumerate() {
            *b = (i as u8) ^ 0x5a;
        }
        mem.rx_rcb[entry] = RxBufferDesc {
            idx_len: len + FCS_LEN,
            type_flags: RXD_FLAG_END,
            err_vlan: err,
            opaque: RXD_OPAQUE_RING_STD | slot,
            ..RxBufferDesc::default()
        };
        mem.status.idx[0].rx_producer = (entry + 1) as u16;
        let status = dev.rings.status() | StatusFlags::UPDATED;
        dev.rings.set_status(status);
    }

    fn mailbox_writes(sim: &Sim) -> Vec<(u32, u32)> {
        sim.state()
            .log
            .iter()
            .filter_map(|a| match *a {
                Access::Mmio { off, val } => Some((off, val)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn nothing_updated_is_a_no_op() {
        let (sim, mut dev) = device();
        let mut buf = [0u8; 1600];
        assert_eq!(dev.poll_receive(&mut buf), Ok(None));
        assert!(sim.state().log.is_empty());
    }

    #[test]
    fn empty_return_ring_writes_no_mailbox() {
        let (sim, mut dev) = device();
        dev.rings.set_status(StatusFlags::UPDATED);
        let mut buf = [0u8; 1600];

        for _ in 0..3 {
            assert_eq!(dev.poll_receive(&mut buf), Ok(None));
        }
        assert!(sim.state().log.is_empty());
        assert_eq!(dev.rings.rx_rcb_ptr, 0);
        assert_eq!(dev.rings.rx_std_ptr, dev.rings.rx_pending());
        assert!(!dev.rx_ready());
    }

    #[test]
    fn one_frame_is_copied_and_both_rings_acked() {
        let (sim, mut dev) = device();
        complete(&mut dev, 0, 3, 60, 0);
        let mut buf = [0u8; 1600];

        assert_eq!(dev.poll_receive(&mut buf), Ok(Some(60)));
        assert_eq!(buf[0], 0x5a);
        assert_eq!(buf[59], 59 ^ 0x5a);
        assert_eq!(buf[60], 0);
        assert_eq!(dev.stats().rx_packets, 1);

        let pending = dev.rings.rx_pending();
        assert_eq!(
            mailbox_writes(&sim),
            vec![
                (MAILBOX_INTERRUPT_0 + TG3_64BIT_REG_LOW, 1),
                (MAILBOX_RCV_STD_PROD_IDX + TG3_64BIT_REG_LOW, pending + 1),
                (MAILBOX_RCVRET_CON_IDX_0 + TG3_64BIT_REG_LOW, 1),
                (MAILBOX_INTERRUPT_0 + TG3_64BIT_REG_LOW, 0),
            ]
        );
        assert!(!dev.rx_ready());
        assert_eq!(dev.poll_receive(&mut buf), Ok(None));
    }

    #[test]
    fn backlog_is_drained_one_frame_per_call() {
        let (_sim, mut dev) = device();
        complete(&mut dev, 0, 0, 100, 0);
        complete(&mut dev, 1, 1, 200, 0);
        let mut buf = [0u8; 1600];

        assert_eq!(dev.poll_receive(&mut buf), Ok(Some(100)));
        assert!(dev.rx_ready());
        assert_eq!(dev.poll_receive(&mut buf), Ok(Some(200)));
        assert!(!dev.rx_ready());
        assert_eq!(dev.rings.rx_rcb_ptr, 2);
    }

    #[test]
    fn bad_frames_are_dropped_but_odd_nibble_is_kept() {
        let (_sim, mut dev) = device();
        let mut buf = [0u8; 1600];

        complete(&mut dev, 0, 0, 64, 0x0004_0000);
        assert_eq!(dev.poll_receive(&mut buf), Ok(None));
        assert_eq!(dev.stats().rx_errors, 1);
        assert_eq!(dev.rings.rx_rcb_ptr, 1);

        complete(&mut dev, 1, 1, 64, RXD_ERR_ODD_NIBBLE_RCVD_MII);
        assert_eq!(dev.poll_receive(&mut buf), Ok(Some(64)));
        assert_eq!(dev.stats().rx_errors, 1);
    }

    #[test]
    fn short_buffer_reports_needed_length() {
        let (_sim, mut dev) = device();
        complete(&mut dev, 0, 0, 300, 0);
        let mut buf = [0u8; 64];
        assert_eq!(dev.poll_receive(&mut buf), Err(Tg3Error::BufferTooSmall(300)));
        assert_eq!(dev.rings.rx_rcb_ptr, 1);
    }

    #[test]
    fn non_standard_ring_completion_is_skipped() {
        let (sim, mut dev) = device();
        complete(&mut dev, 0, 0, 64, 0);
        dev.rings.mem_mut().rx_rcb[0].opaque = RXD_OPAQUE_RING_JUMBO;
        let mut buf = [0u8; 1600];

        assert_eq!(dev.poll_receive(&mut buf), Ok(None));
        assert_eq!(dev.rings.rx_rcb_ptr, 1);
        assert!(sim.state().reg_writes(MAILBOX_RCV_STD_PROD_IDX + TG3_64BIT_REG_LOW).is_empty());
    }

    #[test]
    fn link_change_reruns_phy_setup() {
        let (sim, mut dev) = device();
        dev.chip.phy_id = PHY_ID_SERDES;
        sim.state_mut().pin(MAC_STATUS, 0);
        dev.rings.set_status(StatusFlags::UPDATED | StatusFlags::LINK_CHG);
        let mut buf = [0u8; 1600];

        assert_eq!(dev.poll_receive(&mut buf), Ok(None));
        assert_eq!(dev.rings.status(), StatusFlags::empty());
        assert!(!sim.state().reg_writes(MAC_TX_LENGTHS).is_empty());
    }
}
