//! Chip lifecycle: power-up, core reset, abort, halt and the full
//! programming sequence that takes a freshly reset chip to a running
//! MAC with live rings.
//!
//! ```text
//! Cold ──► PowerOn ──► ClockSwitched ──► Reset ──► FirmwareHandshake ──► Ready
//!                                          ▲                              │
//!                                          └────────── Halted ◄───────────┘
//! ```
//!
//! Every wait is bounded; an exhausted wait returns
//! [`Tg3Error::Timeout`] naming the site and init stops there.
//!
//! # Reference
//! Broadcom BCM570X PRG §8 (Device Initialization), §8.3 (Shutdown)

use log::{debug, info, warn};

use super::error::{Result, Tg3Error, WaitSite};
use super::hw::Tg3Bus;
use super::regs::*;
use super::rings::{HW_STATUS_SIZE, RX_RCB_RING_SIZE, TX_RING_SIZE};
use super::{ChipState, Tg3Device, Tg3Flags};
use crate::pci::{PCI_COMMAND, PCI_PM_CTRL, PCI_PM_CTRL_PME_STATUS, PCI_PM_CTRL_STATE_MASK};
use crate::time::{poll_until, Delay};
use crate::types::{ETH_HLEN, ETH_MTU};

/// Block stop polls (100µs apart).
pub const STOP_BLOCK_LOOPS: u32 = 1000;
/// Bootcode handshake polls (10µs apart).
pub const FIRMWARE_LOOPS: u32 = 100_000;
/// NVRAM arbitration polls before a core reset (10µs apart).
pub const RESET_ARB_LOOPS: u32 = 100_000;
/// Buffer manager / FTQ / host coalescing polls (10µs apart).
pub const ENGINE_LOOPS: u32 = 2000;
/// RX CPU event acknowledgement polls (1µs apart).
pub const FW_PAUSE_LOOPS: u32 = 100;

/// Largest frame the MAC accepts: MTU, header, FCS and one VLAN tag.
const RX_MTU: u32 = (ETH_MTU + ETH_HLEN + 8) as u32;

/// Receive path blocks, stopped first on abort.
const RX_BLOCKS: [u32; 6] = [
    RCVBDI_MODE,
    RCVLPC_MODE,
    RCVLSC_MODE,
    RCVDBDI_MODE,
    RCVDCC_MODE,
    RCVCC_MODE,
];

/// Send path blocks, stopped after the receive path.
const TX_BLOCKS: [u32; 6] = [
    SNDBDS_MODE,
    SNDBDI_MODE,
    SNDDATAI_MODE,
    RDMAC_MODE,
    SNDDATAC_MODE,
    SNDBDC_MODE,
];

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    // ═══════════════════════════════════════════════════════════════════════
    // POWER AND CLOCKS
    // ═══════════════════════════════════════════════════════════════════════

    /// Force the function into D0 and restore register access.
    pub(crate) fn set_power_state_0(&mut self) {
        self.regs
            .write_config32(TG3PCI_MISC_HOST_CTRL, self.modes.misc_host_ctrl);

        let pm_ctrl = self.chip.pm_cap + PCI_PM_CTRL;
        let mut power = self.regs.read_config16(pm_ctrl);
        power |= PCI_PM_CTRL_PME_STATUS;
        power &= !PCI_PM_CTRL_STATE_MASK;
        self.regs.write_config16(pm_ctrl, power);

        self.regs
            .tw32_carefully(GRC_LOCAL_CTRL, self.modes.grc_local_ctrl, 100);
        self.state = ChipState::PowerOn;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ABORT
    // ═══════════════════════════════════════════════════════════════════════

    /// Clear a block's enable bit and wait for the block to drop it.
    fn stop_block(&mut self, ofs: u32, enable: u32) -> Result<()> {
        let val = self.regs.tr32(ofs) & !enable;
        self.regs.tw32_flush(ofs, val);

        poll_until(&mut self.regs, STOP_BLOCK_LOOPS, 100, |r| r.tr32(ofs) & enable == 0)
            .map(|_| ())
            .map_err(|_| {
                warn!("block {:#06x} did not stop", ofs);
                Tg3Error::Timeout(WaitSite::StopBlock(ofs))
            })
    }

    /// Stop every block in `blocks`, reporting the first that hung.
    fn stop_blocks(&mut self, blocks: &[u32]) -> Result<()> {
        let mut first = Ok(());
        for &ofs in blocks {
            let r = self.stop_block(ofs, BLOCK_ENABLE);
            if first.is_ok() {
                first = r;
            }
        }
        first
    }

    /// Quiesce the data path. Blocks are stopped in dependency order;
    /// a hung block fails the abort only after the rest of its group
    /// has been told to stop.
    pub(crate) fn abort_hw(&mut self) -> Result<()> {
        self.regs.disable_ints(self.modes.misc_host_ctrl);

        self.modes.rx_mode &= !RX_MODE_ENABLE;
        self.regs.tw32_carefully(MAC_RX_MODE, self.modes.rx_mode, 10);

        let rx = self.stop_blocks(&RX_BLOCKS);
        let tx = self.stop_blocks(&TX_BLOCKS);
        rx.and(tx)?;

        self.modes.mac_mode &= !MAC_MODE_TDE_ENABLE;
        self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);

        self.modes.tx_mode &= !TX_MODE_ENABLE;
        self.regs.tw32_flush(MAC_TX_MODE, self.modes.tx_mode);
        poll_until(&mut self.regs, STOP_BLOCK_LOOPS, 100, |r| {
            r.tr32(MAC_TX_MODE) & TX_MODE_ENABLE == 0
        })
        .map_err(Tg3Error::timeout(WaitSite::TxModeDisable))?;

        let engines = self.stop_blocks(&[HOSTCC_MODE, WDMAC_MODE, MBFREE_MODE]);

        self.regs.tw32(FTQ_RESET, 0xffff_ffff);
        self.regs.tw32(FTQ_RESET, 0);

        let memory = self.stop_blocks(&[BUFMGR_MODE, MEMARB_MODE]);
        engines.and(memory)?;

        self.rings.clear_status();
        self.rings.clear_stats();
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CORE RESET
    // ═══════════════════════════════════════════════════════════════════════

    /// Core clock reset, then put back everything the reset clobbers in
    /// config space.
    pub(crate) fn chip_reset(&mut self) -> Result<()> {
        // Hold the NVRAM arbiter so a reset mid-access cannot corrupt it.
        if self.flags.contains(Tg3Flags::NVRAM) {
            self.regs.tw32(NVRAM_SWARB, SWARB_REQ_SET1);
            poll_until(&mut self.regs, RESET_ARB_LOOPS, 10, |r| {
                r.tr32(NVRAM_SWARB) & SWARB_GNT1 != 0
            })
            .map_err(Tg3Error::timeout(WaitSite::NvramArbitration))?;
        }

        self.regs.tw32(GRC_MISC_CFG, GRC_MISC_CFG_CORECLK_RESET);
        // MMIO is dead until the core is back; flush through config space.
        self.regs.read_config32(PCI_COMMAND);
        self.regs.udelay(120);

        self.regs
            .write_config32(TG3PCI_MISC_HOST_CTRL, self.modes.misc_host_ctrl);

        let mut pcistate = PCISTATE_ROM_ENABLE | PCISTATE_ROM_RETRY_ENABLE;
        if self.needs_retry_same_dma() {
            pcistate |= PCISTATE_RETRY_SAME_DMA;
        }
        self.regs.write_config32(TG3PCI_PCISTATE, pcistate);

        let saved = self.chip.pci_cfg_state;
        self.regs.restore_config(&saved);

        let xcaps = self.regs.read_config32(TG3PCI_X_CAPS) & !PCIX_CAPS_RELAXED_ORDERING;
        self.regs.write_config32(TG3PCI_X_CAPS, xcaps);

        self.regs.tw32(MEMARB_MODE, BLOCK_ENABLE);
        self.regs
            .tw32(TG3PCI_MISC_HOST_CTRL as u32, self.modes.misc_host_ctrl);

        self.modes.mac_mode = if self.chip.is_serdes() {
            MAC_MODE_PORT_MODE_TBI
        } else {
            0
        };
        self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);

        self.state = ChipState::Reset;
        Ok(())
    }

    fn needs_retry_same_dma(&self) -> bool {
        self.chip.chip_rev_id == CHIPREV_ID_5704_A0 && self.flags.contains(Tg3Flags::PCIX_MODE)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // FIRMWARE
    // ═══════════════════════════════════════════════════════════════════════

    /// Ask management firmware to pause before the chip is touched.
    fn stop_fw(&mut self) -> Result<()> {
        if !self.flags.contains(Tg3Flags::ENABLE_ASF) {
            return Ok(());
        }
        self.regs.write_mem(NIC_SRAM_FW_CMD_MBOX, FWCMD_NICDRV_PAUSE_FW);
        let event = self.regs.tr32(GRC_RX_CPU_EVENT) | GRC_RX_CPU_DRIVER_EVENT;
        self.regs.tw32(GRC_RX_CPU_EVENT, event);

        poll_until(&mut self.regs, FW_PAUSE_LOOPS, 1, |r| {
            r.tr32(GRC_RX_CPU_EVENT) & GRC_RX_CPU_DRIVER_EVENT == 0
        })
        .map(|_| ())
        .map_err(Tg3Error::timeout(WaitSite::FirmwarePause))
    }

    /// Post the mailbox magic and wait for the bootcode to invert it.
    fn firmware_handshake(&mut self) -> Result<u32> {
        let polls = poll_until(&mut self.regs, FIRMWARE_LOOPS, 10, |r| {
            r.read_mem(NIC_SRAM_FIRMWARE_MBOX) == !NIC_SRAM_FIRMWARE_MBOX_MAGIC1
        })
        .map_err(|_| {
            warn!("bootcode did not acknowledge mailbox magic");
            Tg3Error::Timeout(WaitSite::FirmwareHandshake)
        })?;
        self.state = ChipState::FirmwareHandshake;
        debug!("firmware handshake after {} polls", polls);
        Ok(polls)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // HALT
    // ═══════════════════════════════════════════════════════════════════════

    /// Stop the chip and hand it back to the bootcode.
    ///
    /// A firmware pause or block stop that hangs is logged and the core
    /// reset goes ahead anyway; only the reset and handshake can fail.
    pub fn halt(&mut self) -> Result<()> {
        if let Err(e) = self.stop_fw() {
            warn!("halt: {}", e);
        }
        if let Err(e) = self.abort_hw() {
            warn!("halt: {}", e);
        }
        self.chip_reset()?;

        self.regs
            .write_mem(NIC_SRAM_FIRMWARE_MBOX, NIC_SRAM_FIRMWARE_MBOX_MAGIC1);
        self.firmware_handshake()?;

        let drv_state = if self.flags.contains(Tg3Flags::ENABLE_ASF) {
            DRV_STATE_UNLOAD
        } else {
            DRV_STATE_SUSPEND
        };
        self.regs.write_mem(NIC_SRAM_FW_DRV_STATE_MBOX, drv_state);

        self.carrier_ok = false;
        self.state = ChipState::Halted;
        debug!("halted");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PROGRAMMING HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    /// Load the station address into all four slots and seed backoff.
    fn set_mac_addr(&mut self) {
        let m = self.mac;
        let high = (m[0] as u32) << 8 | m[1] as u32;
        let low = u32::from_be_bytes([m[2], m[3], m[4], m[5]]);
        for slot in 0..MAC_ADDR_SLOTS {
            self.regs.tw32(MAC_ADDR_0_HIGH + slot * MAC_ADDR_STRIDE, high);
            self.regs.tw32(MAC_ADDR_0_LOW + slot * MAC_ADDR_STRIDE, low);
        }
        let seed = m.iter().map(|&b| b as u32).sum::<u32>() & TX_BACKOFF_SEED_MASK;
        self.regs.tw32(MAC_TX_BACKOFF_SEED, seed);
    }

    /// Write a ring control block in NIC SRAM.
    fn set_bdinfo(&mut self, bdinfo: u32, mapping: u64, maxlen_flags: u32, nic_addr: u32) {
        let host = bdinfo + TG3_BDINFO_HOST_ADDR;
        self.regs
            .write_mem(host + TG3_64BIT_REG_HIGH, (mapping >> 32) as u32);
        self.regs.write_mem(host + TG3_64BIT_REG_LOW, mapping as u32);
        self.regs
            .write_mem(bdinfo + TG3_BDINFO_MAXLEN_FLAGS, maxlen_flags);
        self.regs.write_mem(bdinfo + TG3_BDINFO_NIC_ADDR, nic_addr);
    }

    /// Accept all multicast; never promiscuous.
    pub(crate) fn set_rx_mode(&mut self) {
        let rx_mode =
            self.modes.rx_mode & !(RX_MODE_PROMISC | RX_MODE_KEEP_VLAN_TAG) | RX_MODE_KEEP_VLAN_TAG;

        for hash in [MAC_HASH_REG_0, MAC_HASH_REG_1, MAC_HASH_REG_2, MAC_HASH_REG_3] {
            self.regs.tw32(hash, 0xffff_ffff);
        }

        if rx_mode != self.modes.rx_mode {
            self.modes.rx_mode = rx_mode;
            self.regs.tw32_carefully(MAC_RX_MODE, rx_mode, 10);
        }
    }

    /// Zero the rings and repopulate the posting ring.
    pub(crate) fn init_rings(&mut self) {
        self.rings.init();
        self.rings.reset_indices();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // RESET_HW
    // ═══════════════════════════════════════════════════════════════════════

    /// Reset the core and program every block from scratch.
    pub(crate) fn reset_hw(&mut self) -> Result<()> {
        self.regs.disable_ints(self.modes.misc_host_ctrl);
        self.stop_fw()?;
        if self.flags.contains(Tg3Flags::INIT_COMPLETE) {
            self.abort_hw()?;
        }
        self.chip_reset()?;

        self.regs.tw32(GRC_MODE, self.modes.grc_mode);
        self.regs
            .write_mem(NIC_SRAM_FIRMWARE_MBOX, NIC_SRAM_FIRMWARE_MBOX_MAGIC1);
        self.firmware_handshake()?;

        let drv_state = if self.flags.contains(Tg3Flags::ENABLE_ASF) {
            DRV_STATE_START
        } else {
            DRV_STATE_SUSPEND
        };
        self.regs.write_mem(NIC_SRAM_FW_DRV_STATE_MBOX, drv_state);

        // Athlon chipset workaround on B3 silicon; harmless elsewhere.
        let clock_ctrl = TG3PCI_CLOCK_CTRL as u32;
        let clk = self.regs.tr32(clock_ctrl) | CLOCK_CTRL_DELAY_PCI_GRANT;
        self.regs.tw32_flush(clock_ctrl, clk);

        if self.needs_retry_same_dma() {
            let pcistate = TG3PCI_PCISTATE as u32;
            let val = self.regs.tr32(pcistate) | PCISTATE_RETRY_SAME_DMA;
            self.regs.tw32(pcistate, val);
        }

        // Statistics and status blocks in NIC SRAM, then the host copy.
        for off in (NIC_SRAM_STATS_BLK..NIC_SRAM_STATUS_BLK + HW_STATUS_SIZE as u32).step_by(4) {
            self.regs.write_mem(off, 0);
            self.regs.udelay(40);
        }
        self.rings.clear_status();

        self.regs
            .tw32(TG3PCI_DMA_RW_CTRL as u32, self.chip.dma_rwctrl);

        self.modes.grc_mode &= !(GRC_MODE_HOST_SENDBDS
            | GRC_MODE_4X_NIC_SEND_RINGS
            | GRC_MODE_NO_TX_PHDR_CSUM
            | GRC_MODE_NO_RX_PHDR_CSUM);
        self.modes.grc_mode |=
            GRC_MODE_HOST_SENDBDS | GRC_MODE_NO_TX_PHDR_CSUM | GRC_MODE_NO_RX_PHDR_CSUM;
        self.regs.tw32(
            GRC_MODE,
            self.modes.grc_mode | GRC_MODE_IRQ_ON_MAC_ATTN | GRC_MODE_HOST_STACKUP,
        );

        // 66MHz core clock, 1µs timer tick.
        self.regs.tw32(GRC_MISC_CFG, 65 << GRC_MISC_CFG_PRESCALAR_SHIFT);

        self.program_buffer_manager()?;

        self.regs.tw32(FTQ_RESET, 0xffff_ffff);
        self.regs.tw32(FTQ_RESET, 0);
        poll_until(&mut self.regs, ENGINE_LOOPS, 10, |r| r.tr32(FTQ_RESET) == 0)
            .map_err(Tg3Error::timeout(WaitSite::FtqReset))?;

        self.program_rings();

        self.set_mac_addr();
        self.regs.tw32(MAC_RX_MTU_SIZE, RX_MTU);
        self.regs.tw32(
            MAC_TX_LENGTHS,
            2 << TX_LENGTHS_IPG_CRS_SHIFT | 6 << TX_LENGTHS_IPG_SHIFT | 32 << TX_LENGTHS_SLOT_TIME_SHIFT,
        );

        self.regs.tw32(MAC_RCV_RULE_CFG, RCV_RULE_CFG_DEFAULT_CLASS);
        self.regs.tw32(RCVLPC_CONFIG, 0x0181);

        self.regs.tw32(RCVLPC_STATS_ENABLE, 0x00ff_ffff);
        self.regs.tw32(RCVLPC_STATSCTRL, RCVLPC_STATSCTRL_ENABLE);
        self.regs.tw32(SNDDATAI_STATSENAB, 0x00ff_ffff);
        self.regs
            .tw32(SNDDATAI_STATSCTRL, SNDDATAI_SCTRL_ENABLE | SNDDATAI_SCTRL_FASTUPD);

        self.program_host_coalescing()?;

        self.regs.tw32(RCVCC_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE);
        self.regs.tw32(RCVLPC_MODE, BLOCK_ENABLE);
        self.regs.tw32(RCVLSC_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE);

        self.modes.mac_mode = MAC_MODE_TXSTAT_ENABLE
            | MAC_MODE_RXSTAT_ENABLE
            | MAC_MODE_TDE_ENABLE
            | MAC_MODE_RDE_ENABLE
            | MAC_MODE_FHDE_ENABLE;
        self.regs.tw32_carefully(
            MAC_MODE,
            self.modes.mac_mode | MAC_MODE_RXSTAT_CLEAR | MAC_MODE_TXSTAT_CLEAR,
            40,
        );

        self.modes.grc_local_ctrl = GRC_LCLCTRL_INT_ON_ATTN | GRC_LCLCTRL_AUTO_SEEPROM;
        if self.chip.asic_rev() == ASIC_REV_5700 {
            self.modes.grc_local_ctrl |= GRC_LCLCTRL_GPIO_OE1 | GRC_LCLCTRL_GPIO_OUTPUT1;
        }
        self.regs
            .tw32_carefully(GRC_LOCAL_CTRL, self.modes.grc_local_ctrl, 100);

        self.regs
            .tw32_mailbox_flush(MAILBOX_INTERRUPT_0 + TG3_64BIT_REG_LOW, 0);

        self.program_dma_engines();
        self.enable_data_path()?;
        self.enable_mac()?;

        self.set_rx_mode();

        // Rules 0 and 1 are loaded but left disabled; 2 and 3 belong to
        // management firmware.
        self.regs
            .tw32(MAC_RCV_RULE_0, 0xc200_0000 & RCV_RULE_DISABLE_MASK);
        self.regs
            .tw32(MAC_RCV_VALUE_0, 0xffff_ffff & RCV_RULE_DISABLE_MASK);
        self.regs.tw32(
            MAC_RCV_RULE_0 + MAC_RCV_RULE_STRIDE,
            0x8600_0004 & RCV_RULE_DISABLE_MASK,
        );
        self.regs.tw32(
            MAC_RCV_VALUE_0 + MAC_RCV_RULE_STRIDE,
            0xffff_ffff & RCV_RULE_DISABLE_MASK,
        );
        for rule in 4..16 {
            self.regs.tw32(MAC_RCV_RULE_0 + rule * MAC_RCV_RULE_STRIDE, 0);
            self.regs.tw32(MAC_RCV_VALUE_0 + rule * MAC_RCV_RULE_STRIDE, 0);
        }

        self.state = ChipState::Ready;
        Ok(())
    }

    fn program_buffer_manager(&mut self) -> Result<()> {
        self.regs.tw32(BUFMGR_MB_POOL_ADDR, NIC_SRAM_MBUF_POOL_BASE);
        let pool = if self.chip.asic_rev() == ASIC_REV_5704 {
            NIC_SRAM_MBUF_POOL_SIZE64
        } else {
            NIC_SRAM_MBUF_POOL_SIZE96
        };
        self.regs.tw32(BUFMGR_MB_POOL_SIZE, pool);
        self.regs
            .tw32(BUFMGR_DMA_DESC_POOL_ADDR, NIC_SRAM_DMA_DESC_POOL_BASE);
        self.regs
            .tw32(BUFMGR_DMA_DESC_POOL_SIZE, NIC_SRAM_DMA_DESC_POOL_SIZE);

        let wm = self.bufmgr;
        self.regs
            .tw32(BUFMGR_MB_RDMA_LOW_WATER, wm.mbuf_read_dma_low_water);
        self.regs
            .tw32(BUFMGR_MB_MACRX_LOW_WATER, wm.mbuf_mac_rx_low_water);
        self.regs.tw32(BUFMGR_MB_HIGH_WATER, wm.mbuf_high_water);
        self.regs.tw32(BUFMGR_DMA_LOW_WATER, wm.dma_low_water);
        self.regs.tw32(BUFMGR_DMA_HIGH_WATER, wm.dma_high_water);

        self.regs
            .tw32(BUFMGR_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE);
        poll_until(&mut self.regs, ENGINE_LOOPS, 10, |r| {
            r.tr32(BUFMGR_MODE) & BLOCK_ENABLE != 0
        })
        .map(|_| ())
        .map_err(Tg3Error::timeout(WaitSite::BufferManager))
    }

    /// Standard receive ring, send ring and return ring control blocks
    /// plus their mailboxes, in the order the chip expects.
    fn program_rings(&mut self) {
        let std_bus = self.rings.rx_std_bus();
        let std_bd = RCVDBDI_STD_BD + TG3_BDINFO_HOST_ADDR;
        self.regs
            .tw32(std_bd + TG3_64BIT_REG_HIGH, (std_bus >> 32) as u32);
        self.regs.tw32(std_bd + TG3_64BIT_REG_LOW, std_bus as u32);
        self.regs.tw32(
            RCVDBDI_STD_BD + TG3_BDINFO_MAXLEN_FLAGS,
            RX_STD_MAX_SIZE << BDINFO_FLAGS_MAXLEN_SHIFT,
        );
        self.regs
            .tw32(RCVDBDI_STD_BD + TG3_BDINFO_NIC_ADDR, NIC_SRAM_RX_BUFFER_DESC);

        self.regs
            .tw32(RCVDBDI_MINI_BD + TG3_BDINFO_MAXLEN_FLAGS, BDINFO_FLAGS_DISABLED);
        self.regs
            .tw32(RCVDBDI_JUMBO_BD + TG3_BDINFO_MAXLEN_FLAGS, BDINFO_FLAGS_DISABLED);

        self.regs
            .tw32(RCVBDI_STD_THRESH, self.rings.rx_pending() / 8);
        self.regs.tw32(RCVBDI_JUMBO_THRESH, 0);

        for rcb in (NIC_SRAM_SEND_RCB..NIC_SRAM_RCV_RET_RCB).step_by(TG3_BDINFO_SIZE as usize) {
            self.regs
                .write_mem(rcb + TG3_BDINFO_MAXLEN_FLAGS, BDINFO_FLAGS_DISABLED);
        }

        self.rings.reset_indices();
        self.regs
            .tw32_mailbox(MAILBOX_SNDHOST_PROD_IDX_0 + TG3_64BIT_REG_LOW, 0);
        self.regs
            .tw32_mailbox_flush(MAILBOX_SNDNIC_PROD_IDX_0 + TG3_64BIT_REG_LOW, 0);

        let tx_bus = self.rings.tx_bus();
        self.set_bdinfo(
            NIC_SRAM_SEND_RCB,
            tx_bus,
            TX_RING_SIZE << BDINFO_FLAGS_MAXLEN_SHIFT,
            NIC_SRAM_TX_BUFFER_DESC,
        );

        for rcb in (NIC_SRAM_RCV_RET_RCB..NIC_SRAM_STATS_BLK).step_by(TG3_BDINFO_SIZE as usize) {
            self.regs
                .write_mem(rcb + TG3_BDINFO_MAXLEN_FLAGS, BDINFO_FLAGS_DISABLED);
        }

        self.regs
            .tw32_mailbox_flush(MAILBOX_RCVRET_CON_IDX_0 + TG3_64BIT_REG_LOW, 0);

        let rcb_bus = self.rings.rx_rcb_bus();
        self.set_bdinfo(
            NIC_SRAM_RCV_RET_RCB,
            rcb_bus,
            RX_RCB_RING_SIZE << BDINFO_FLAGS_MAXLEN_SHIFT,
            0,
        );

        let std_prod = self.rings.rx_std_ptr;
        self.regs
            .tw32_mailbox_flush(MAILBOX_RCV_STD_PROD_IDX + TG3_64BIT_REG_LOW, std_prod);
        self.regs
            .tw32_mailbox_flush(MAILBOX_RCV_JUMBO_PROD_IDX + TG3_64BIT_REG_LOW, 0);
    }

    /// One frame per interrupt on receive, batched transmit completions,
    /// status and statistics block addresses.
    fn program_host_coalescing(&mut self) -> Result<()> {
        self.regs.tw32(HOSTCC_MODE, 0);
        poll_until(&mut self.regs, ENGINE_LOOPS, 10, |r| {
            r.tr32(HOSTCC_MODE) & HOSTCC_MODE_ENABLE == 0
        })
        .map_err(Tg3Error::timeout(WaitSite::HostCoalescing))?;

        for &(reg, val) in &[
            (HOSTCC_RXCOL_TICKS, LOW_RXCOL_TICKS),
            (HOSTCC_RXMAX_FRAMES, LOW_RXMAX_FRAMES),
            (HOSTCC_RXCOAL_TICK_INT, 0),
            (HOSTCC_RXCOAL_MAXF_INT, 1),
            (HOSTCC_TXCOL_TICKS, LOW_TXCOL_TICKS),
            (HOSTCC_TXMAX_FRAMES, LOW_RXMAX_FRAMES),
            (HOSTCC_TXCOAL_TICK_INT, 0),
            (HOSTCC_TXCOAL_MAXF_INT, 0),
            (HOSTCC_STAT_COAL_TICKS, DEFAULT_STAT_COAL_TICKS),
        ] {
            self.regs.tw32(reg, val);
        }

        let stats = self.rings.stats_bus();
        let status = self.rings.status_bus();
        self.regs
            .tw32(HOSTCC_STATS_BLK_HOST_ADDR + TG3_64BIT_REG_HIGH, (stats >> 32) as u32);
        self.regs
            .tw32(HOSTCC_STATS_BLK_HOST_ADDR + TG3_64BIT_REG_LOW, stats as u32);
        self.regs
            .tw32(HOSTCC_STATUS_BLK_HOST_ADDR + TG3_64BIT_REG_HIGH, (status >> 32) as u32);
        self.regs
            .tw32(HOSTCC_STATUS_BLK_HOST_ADDR + TG3_64BIT_REG_LOW, status as u32);
        self.regs.tw32(HOSTCC_STATS_BLK_NIC_ADDR, NIC_SRAM_STATS_BLK);
        self.regs.tw32(HOSTCC_STATUS_BLK_NIC_ADDR, NIC_SRAM_STATUS_BLK);

        self.regs
            .tw32(HOSTCC_MODE, HOSTCC_MODE_ENABLE | self.chip.coalesce_mode);
        Ok(())
    }

    fn program_dma_engines(&mut self) {
        self.regs.tw32_carefully(DMAC_MODE, DMAC_MODE_ENABLE, 40);

        let engine = DMAC_MODE_ENABLE
            | DMAC_MODE_TGTABRT_ENAB
            | DMAC_MODE_MSTABRT_ENAB
            | DMAC_MODE_PARITYERR_ENAB
            | DMAC_MODE_ADDROFLOW_ENAB
            | DMAC_MODE_FIFOOFLOW_ENAB
            | DMAC_MODE_FIFOURUN_ENAB
            | DMAC_MODE_FIFOOREAD_ENAB
            | DMAC_MODE_LNGREAD_ENAB;
        self.regs.tw32_carefully(WDMAC_MODE, engine, 40);

        if self.chip.asic_rev() == ASIC_REV_5704 && self.flags.contains(Tg3Flags::PCIX_MODE) {
            let mut xcaps = self.regs.read_config32(TG3PCI_X_CAPS);
            xcaps &= !(PCIX_CAPS_SPLIT_MASK | PCIX_CAPS_BURST_MASK);
            xcaps |= PCIX_CAPS_MAX_BURST_5704 << PCIX_CAPS_BURST_SHIFT;
            if self.flags.contains(Tg3Flags::SPLIT_MODE) {
                xcaps |= self.chip.split_mode_max_reqs << PCIX_CAPS_SPLIT_SHIFT;
            }
            self.regs.write_config32(TG3PCI_X_CAPS, xcaps);
        }

        let mut rdmac = engine;
        if self.flags.contains(Tg3Flags::SPLIT_MODE) {
            rdmac |= RDMAC_MODE_SPLIT_ENABLE;
        }
        self.regs.tw32_carefully(RDMAC_MODE, rdmac, 40);
    }

    /// Bring up the remaining send and receive blocks.
    fn enable_data_path(&mut self) -> Result<()> {
        for &(reg, val) in &[
            (RCVDCC_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE),
            (MBFREE_MODE, BLOCK_ENABLE),
            (SNDDATAC_MODE, BLOCK_ENABLE),
            (SNDBDC_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE),
            (RCVBDI_MODE, BLOCK_ENABLE | RCVBDI_MODE_RCB_ATTN_ENAB),
            (RCVDBDI_MODE, BLOCK_ENABLE | RCVDBDI_MODE_INV_RING_SZ),
            (SNDDATAI_MODE, BLOCK_ENABLE),
            (SNDBDI_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE),
            (SNDBDS_MODE, BLOCK_ENABLE | BLOCK_ATTN_ENABLE),
        ] {
            self.regs.tw32(reg, val);
        }

        // 5701 A0 needs an RX CPU firmware patch to pass traffic.
        if self.chip.chip_rev_id == CHIPREV_ID_5701_A0 {
            return Err(Tg3Error::UnsupportedChip);
        }
        Ok(())
    }

    /// Enable the MACs, the MI block and the PHY, then load the link.
    fn enable_mac(&mut self) -> Result<()> {
        self.modes.tx_mode = TX_MODE_ENABLE;
        self.regs.tw32_carefully(MAC_TX_MODE, self.modes.tx_mode, 100);

        self.modes.rx_mode = RX_MODE_ENABLE;
        self.regs.tw32_carefully(MAC_RX_MODE, self.modes.rx_mode, 10);

        self.modes.mi_mode = MAC_MI_MODE_BASE;
        self.regs.tw32_carefully(MAC_MI_MODE, self.modes.mi_mode, 40);

        self.regs.tw32(MAC_LED_CTRL, 0);
        self.regs.tw32(MAC_MI_STAT, MAC_MI_STAT_LNKSTAT_ATTN_ENAB);
        self.regs.tw32_carefully(MAC_RX_MODE, RX_MODE_RESET, 10);
        self.regs.tw32_carefully(MAC_RX_MODE, self.modes.rx_mode, 10);

        if self.chip.chip_rev_id == CHIPREV_ID_5703_A1 {
            self.regs.tw32(MAC_SERDES_CFG, 0x0061_6000);
        }

        self.setup_phy()?;

        if !self.chip.is_serdes() {
            // Clear the PHY CRC counters.
            let test = self.read_phy(0x1e)?;
            self.write_phy(0x1e, test | 0x8000)?;
            self.read_phy(0x14)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ENTRY POINTS
    // ═══════════════════════════════════════════════════════════════════════

    /// Take the chip from any state to [`ChipState::Ready`].
    pub fn init_hw(&mut self) -> Result<()> {
        self.set_power_state_0();
        self.regs.switch_clocks();
        self.state = ChipState::ClockSwitched;
        self.regs.write_config32(TG3PCI_MEM_WIN_BASE_ADDR, 0);

        self.reset_hw()?;
        self.flags |= Tg3Flags::INIT_COMPLETE;
        info!("chip ready");
        Ok(())
    }

    /// Halt, rebuild the rings and reprogram the chip.
    pub(crate) fn recover(&mut self) -> Result<()> {
        self.stats.recoveries += 1;
        warn!("reinitialising chip");
        if let Err(e) = self.halt() {
            warn!("recovery: halt failed: {}", e);
            self.carrier_ok = false;
        }
        self.init_rings();
        self.init_hw()
    }
}
