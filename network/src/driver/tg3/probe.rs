//! Chip identification, DMA self-test and attach.
//!
//! [`Tg3Device::probe`] is the only way a device becomes usable: it reads
//! the chip's invariants, resolves the station address, tunes and tests
//! DMA, programs the chip and waits for carrier. Any failure after the
//! chip has been touched leaves it halted.
//!
//! # Reference
//! Broadcom BCM570X PRG §8.1 (Chip Identification), §8.6 (DMA Read/Write
//! Control)

use log::{debug, info, warn};

use super::error::{Result, Tg3Error, WaitSite};
use super::hw::Tg3Bus;
use super::phy::phy_string;
use super::regs::*;
use super::rings::{DMA_TEST_WORDS, RX_PKT_BUF_SZ};
use super::{ChipState, LedMode, Tg3Device, Tg3Flags};
use crate::pci::{
    PciConfig, PCI_CACHE_LINE_SIZE, PCI_CAP_ID_PM, PCI_COMMAND, PCI_COMMAND_INVALIDATE,
    PCI_COMMAND_PARITY, PCI_COMMAND_SERR, PCI_SUBSYSTEM_ID, PCI_SUBSYSTEM_VENDOR_ID,
};
use crate::time::{poll_until, Delay};

// ═══════════════════════════════════════════════════════════════════════════
// SUPPORTED DEVICES
// ═══════════════════════════════════════════════════════════════════════════

/// PCI (vendor, device) pairs driven by this driver.
pub const TG3_PCI_IDS: &[(u16, u16)] = &[
    (PCI_VENDOR_ID_BROADCOM, 0x1644), // 5700
    (PCI_VENDOR_ID_BROADCOM, 0x1645), // 5701
    (PCI_VENDOR_ID_BROADCOM, 0x1646), // 5702
    (PCI_VENDOR_ID_BROADCOM, 0x1647), // 5703
    (PCI_VENDOR_ID_BROADCOM, 0x1648), // 5704
    (PCI_VENDOR_ID_BROADCOM, 0x164d), // 5702FE
    (PCI_VENDOR_ID_BROADCOM, 0x16a6), // 5702X
    (PCI_VENDOR_ID_BROADCOM, 0x16a7), // 5703X
    (PCI_VENDOR_ID_SYSKONNECT, 0x4400),
    (PCI_VENDOR_ID_ALTIMA, 0x1644), // AC1000 / AC9100
];

/// Check if a PCI device is a supported Tigon3.
pub fn is_supported_device(vendor_id: u16, device_id: u16) -> bool {
    TG3_PCI_IDS
        .iter()
        .any(|&(v, d)| v == vendor_id && d == device_id)
}

// ═══════════════════════════════════════════════════════════════════════════
// DMA SELF-TEST
// ═══════════════════════════════════════════════════════════════════════════

/// Polls of the completion FIFO per test transfer (100µs apart).
const DMA_TEST_LOOPS: u32 = 40;
/// NIC mbuf the test descriptor moves data through.
const DMA_TEST_MBUF: u32 = 0x0000_2100;
/// Dwords in an internal DMA descriptor.
const INTERNAL_DESC_WORDS: u32 = 8;

/// Which way a test transfer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DmaDirection {
    /// Host memory into the NIC (read DMA engine).
    ToDevice,
    /// NIC back to host memory (write DMA engine).
    FromDevice,
}

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    /// Choose DMA read/write control for the bus and, on 5700/5701,
    /// prove it with a round trip through the NIC.
    ///
    /// Corruption on the first pass narrows the write boundary to 16
    /// bytes and retries once.
    pub(crate) fn test_dma(&mut self) -> Result<()> {
        self.regs.tw32(TG3PCI_CLOCK_CTRL as u32, 0);

        let pcix = self.flags.contains(Tg3Flags::PCIX_MODE);
        let (write_water, read_water, min_dma) = match (pcix, self.chip.asic_rev()) {
            (false, _) => (0x7, 0x7, 0x0f),
            (true, ASIC_REV_5704) => (0x3, 0x7, 0x00),
            (true, _) => (0x3, 0x3, 0x0f),
        };
        let mut rwctrl = 0x7 << DMA_RWCTRL_PCI_WRITE_CMD_SHIFT
            | 0x6 << DMA_RWCTRL_PCI_READ_CMD_SHIFT
            | write_water << DMA_RWCTRL_WRITE_WATER_SHIFT
            | read_water << DMA_RWCTRL_READ_WATER_SHIFT
            | min_dma << DMA_RWCTRL_MIN_DMA_SHIFT;
        if pcix
            && matches!(
                self.chip.chip_rev_id,
                CHIPREV_ID_5703_A1 | CHIPREV_ID_5703_A2 | CHIPREV_ID_5703_A3 | CHIPREV_ID_5704_A0
            )
        {
            rwctrl |= DMA_RWCTRL_ONE_DMA;
        }
        rwctrl |= DMA_RWCTRL_USE_MEM_READ_MULT;

        self.chip.dma_rwctrl = rwctrl;
        self.regs.tw32(TG3PCI_DMA_RW_CTRL as u32, rwctrl);

        let asic = self.chip.asic_rev();
        if !self.config.test_dma || (asic != ASIC_REV_5700 && asic != ASIC_REV_5701) {
            return Ok(());
        }

        for _ in 0..2 {
            for (i, w) in self.rings.dma_test_buf().iter_mut().enumerate() {
                *w = i as u32;
            }
            self.do_test_dma(DmaDirection::ToDevice)?;

            self.rings.dma_test_buf().fill(0);
            self.do_test_dma(DmaDirection::FromDevice)?;

            let intact = self
                .rings
                .dma_test_buf()
                .iter()
                .enumerate()
                .all(|(i, &w)| w == i as u32);
            if intact {
                debug!("dma test passed, rwctrl {:#010x}", self.chip.dma_rwctrl);
                return Ok(());
            }

            if self.chip.dma_rwctrl & DMA_RWCTRL_WRITE_BNDRY_MASK != 0 {
                break;
            }
            debug!("dma test: corruption, narrowing write boundary");
            self.chip.dma_rwctrl |= DMA_RWCTRL_WRITE_BNDRY_16;
            self.regs
                .tw32(TG3PCI_DMA_RW_CTRL as u32, self.chip.dma_rwctrl);
        }

        warn!("dma test: data corrupted");
        Err(Tg3Error::DmaTestFailed)
    }

    /// Run one descriptor through a DMA engine and wait for completion.
    fn do_test_dma(&mut self, dir: DmaDirection) -> Result<()> {
        let desc_base = NIC_SRAM_DMA_DESC_POOL_BASE;

        self.regs.tw32(FTQ_RCVBD_COMP_FIFO_ENQDEQ, 0);
        self.regs.tw32(FTQ_RCVDATA_COMP_FIFO_ENQDEQ, 0);
        self.regs.tw32(RDMAC_STATUS, 0);
        self.regs.tw32(WDMAC_STATUS, 0);
        self.regs.tw32(BUFMGR_MODE, 0);
        self.regs.tw32(FTQ_RESET, 0);

        let (engine, cqid_sqid, enqueue, complete) = match dir {
            DmaDirection::ToDevice => (
                RDMAC_MODE,
                13 << 8 | 2,
                FTQ_DMA_HIGH_READ_FIFO_ENQDEQ,
                FTQ_RCVBD_COMP_FIFO_ENQDEQ,
            ),
            DmaDirection::FromDevice => (
                WDMAC_MODE,
                16 << 8 | 7,
                FTQ_DMA_HIGH_WRITE_FIFO_ENQDEQ,
                FTQ_RCVDATA_COMP_FIFO_ENQDEQ,
            ),
        };
        self.regs.tw32_carefully(engine, DMAC_MODE_RESET, 40);
        self.regs.tw32_carefully(engine, DMAC_MODE_ENABLE, 40);

        let bus = self.rings.dma_test_bus();
        let len = (DMA_TEST_WORDS * 4) as u32;
        let desc: [u32; INTERNAL_DESC_WORDS as usize] = [
            (bus >> 32) as u32,
            bus as u32,
            DMA_TEST_MBUF,
            len | cqid_sqid << 16,
            0x0000_0004,
            0,
            0,
            0,
        ];
        for (i, &word) in desc.iter().enumerate() {
            self.regs.write_mem(desc_base + i as u32 * 4, word);
        }

        self.regs.tw32(enqueue, desc_base);

        poll_until(&mut self.regs, DMA_TEST_LOOPS, 100, |r| {
            r.tr32(complete) & 0xffff == desc_base
        })
        .map(|_| ())
        .map_err(Tg3Error::timeout(WaitSite::DmaTest))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INVARIANTS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read everything about the chip and board that does not change
    /// while the driver runs, and set the workaround flags that follow.
    pub(crate) fn get_invariants(&mut self) -> Result<()> {
        self.chip.subsystem_vendor = self.regs.read_config16(PCI_SUBSYSTEM_VENDOR_ID);
        self.chip.subsystem_device = self.regs.read_config16(PCI_SUBSYSTEM_ID);

        // Memory write invalidate off; parity and SERR reporting on.
        let mut pci_cmd = self.regs.read_config16(PCI_COMMAND);
        pci_cmd &= !PCI_COMMAND_INVALIDATE;
        pci_cmd |= PCI_COMMAND_PARITY | PCI_COMMAND_SERR;
        self.regs.write_config16(PCI_COMMAND, pci_cmd);

        // Indirect access must be on before any register is touched.
        let misc_ctrl = self.regs.read_config32(TG3PCI_MISC_HOST_CTRL);
        if misc_ctrl == 0xffff_ffff {
            return Err(Tg3Error::DeviceNotResponding);
        }
        self.chip.chip_rev_id = misc_ctrl >> MISC_HOST_CTRL_CHIPREV_SHIFT;
        self.modes.misc_host_ctrl |= misc_ctrl & MISC_HOST_CTRL_CHIPREV;
        self.regs
            .write_config32(TG3PCI_MISC_HOST_CTRL, self.modes.misc_host_ctrl);

        let mut cacheline = self.regs.read_config32(PCI_CACHE_LINE_SIZE);
        self.chip.pci_cacheline_sz = cacheline as u8;
        self.chip.pci_lat_timer = (cacheline >> 8) as u8;
        if self.chip.asic_rev() == ASIC_REV_5703 && self.chip.pci_lat_timer < 64 {
            self.chip.pci_lat_timer = 64;
            cacheline = cacheline & !0xff00 | 64 << 8;
            self.regs.write_config32(PCI_CACHE_LINE_SIZE, cacheline);
        }

        let pci_state = self.regs.read_config32(TG3PCI_PCISTATE);
        if pci_state & PCISTATE_CONV_PCI_MODE == 0 {
            self.flags |= Tg3Flags::PCIX_MODE;
        }
        if pci_state & PCISTATE_BUS_SPEED_HIGH != 0 {
            self.flags |= Tg3Flags::PCI_HIGH_SPEED;
        }
        if pci_state & PCISTATE_BUS_32BIT != 0 {
            self.flags |= Tg3Flags::PCI_32BIT;
        }

        self.set_power_state_0();

        let chip_rev = self.chip.chip_rev();
        self.chip.coalesce_mode = if chip_rev != CHIPREV_5700_AX && chip_rev != CHIPREV_5700_BX {
            HOSTCC_MODE_32BYTE
        } else {
            0
        };

        self.regs.tw32_carefully(MAC_MI_MODE, self.modes.mi_mode, 40);
        self.regs.tw32(GRC_MODE, self.modes.grc_mode);
        self.regs.switch_clocks();
        self.state = ChipState::ClockSwitched;
        self.regs.write_config32(TG3PCI_MEM_WIN_BASE_ADDR, 0);

        self.regs.udelay(50);
        self.nvram_init();

        let board = self.regs.tr32(GRC_MISC_CFG) & GRC_MISC_CFG_BOARD_ID_MASK;
        if self.chip.asic_rev() == ASIC_REV_5704 {
            if board == GRC_MISC_CFG_BOARD_ID_5704CIOBE {
                self.flags |= Tg3Flags::SPLIT_MODE;
                self.chip.split_mode_max_reqs = SPLIT_MODE_5704_MAX_REQ;
            }
        } else if board == GRC_MISC_CFG_BOARD_ID_5702FE {
            self.flags |= Tg3Flags::TEN_100_ONLY;
        }

        self.phy_probe()?;
        self.read_part_number();

        let asic_5700 = self.chip.asic_rev() == ASIC_REV_5700;
        if self.chip.is_serdes() {
            self.flags.remove(Tg3Flags::USE_MI_INTERRUPT);
            self.chip.led_mode = LedMode::ThreeLink;
        } else {
            self.flags.set(Tg3Flags::USE_MI_INTERRUPT, asic_5700);
        }

        // 5700 status block link-change bit is unreliable.
        self.flags.set(Tg3Flags::USE_LINKCHG_REG, asic_5700);
        if self.chip.subsystem_vendor == PCI_VENDOR_ID_DELL && !self.chip.is_serdes() {
            self.flags |= Tg3Flags::USE_MI_INTERRUPT | Tg3Flags::USE_LINKCHG_REG;
        }
        self.flags.set(Tg3Flags::POLL_SERDES, self.chip.is_serdes());

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ATTACH / DETACH
    // ═══════════════════════════════════════════════════════════════════════

    /// Identify, program and bring up the link.
    ///
    /// The device is only usable if this returns `Ok`. A chip that fails
    /// to initialise or never reports carrier is halted before the error
    /// is returned.
    pub fn probe(&mut self) -> Result<()> {
        self.chip.pm_cap = self
            .regs
            .bus()
            .find_capability(PCI_CAP_ID_PM)
            .ok_or_else(|| {
                warn!("no power management capability");
                Tg3Error::NoDevice
            })?;

        self.flags.remove(Tg3Flags::INIT_COMPLETE);
        self.get_invariants()?;

        let mac = self.get_device_address()?;
        info!(
            "mac {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
        );

        self.test_dma()?;

        self.chip.pci_cfg_state = self.regs.save_config();
        self.log_identity();

        self.regs.disable_ints(self.modes.misc_host_ctrl);
        self.init_rings();

        if let Err(e) = self.init_hw() {
            warn!("init failed: {}", e);
            self.disable();
            return Err(e);
        }

        let mut scratch = [0u8; RX_PKT_BUF_SZ];
        for _ in 0..self.config.link_wait_ms {
            if self.carrier_ok {
                break;
            }
            if let Err(e) = self.poll_receive(&mut scratch) {
                debug!("attach: {}", e);
            }
            self.regs.mdelay(1);
        }
        if !self.carrier_ok {
            warn!("valid link not established");
            self.disable();
            return Err(Tg3Error::NoLink);
        }

        self.link_report();
        Ok(())
    }

    /// Halt the chip and forget negotiated state.
    pub fn disable(&mut self) {
        if let Err(e) = self.halt() {
            warn!("disable: {}", e);
        }
        self.flags
            .remove(Tg3Flags::INIT_COMPLETE | Tg3Flags::GOT_SERDES_FLOWCTL);
        self.carrier_ok = false;
    }

    fn log_identity(&self) {
        let pcix = self.flags.contains(Tg3Flags::PCIX_MODE);
        let clock = match (self.flags.contains(Tg3Flags::PCI_HIGH_SPEED), pcix) {
            (true, true) => "133MHz",
            (true, false) => "66MHz",
            (false, true) => "100MHz",
            (false, false) => "33MHz",
        };
        info!(
            "Tigon3 [partno({}) rev {:04x} PHY({})] (PCI{}:{}:{})",
            self.part_number.as_str(),
            self.chip.chip_rev_id,
            phy_string(self.chip.phy_id),
            if pcix { "X" } else { "" },
            clock,
            if self.flags.contains(Tg3Flags::PCI_32BIT) { "32-bit" } else { "64-bit" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tg3::sim::{Sim, SimBus, SimDelay, SIM_PM_CAP};
    use crate::driver::tg3::{testutil, Tg3Config};

    const STATION: [u8; 6] = [0x00, 0x10, 0x18, 0x2a, 0x3b, 0x4c];

    fn board_device(config: Tg3Config) -> (Sim, Tg3Device<SimBus, SimDelay>) {
        let (sim, dev) = testutil::device_with(config);
        testutil::fiber_board(&sim);
        (sim, dev)
    }

    #[test]
    fn id_table_matches_family() {
        assert!(is_supported_device(0x14e4, 0x1648));
        assert!(is_supported_device(0x14e4, 0x164d));
        assert!(is_supported_device(0x173b, 0x1644));
        assert!(is_supported_device(0x1148, 0x4400));
        assert!(!is_supported_device(0x14e4, 0x1600));
        assert!(!is_supported_device(0x8086, 0x1644));
    }

    #[test]
    fn invariants_on_conventional_pci_5704() {
        let (sim, mut dev) = board_device(Tg3Config::default());
        {
            let mut s = sim.state_mut();
            let cmd = s.config(PCI_COMMAND) | PCI_COMMAND_INVALIDATE as u32;
            s.set_config(PCI_COMMAND, cmd);
        }
        sim.state_mut().set_reg(GRC_MISC_CFG, GRC_MISC_CFG_BOARD_ID_5704CIOBE);

        assert_eq!(dev.get_invariants(), Ok(()));
        assert_eq!(dev.chip().chip_rev_id, 0x2003);
        assert_eq!(dev.chip().asic_rev(), ASIC_REV_5704);
        assert_eq!(dev.modes().misc_host_ctrl & MISC_HOST_CTRL_CHIPREV, 0x2003 << 16);
        assert_eq!(dev.chip().coalesce_mode, HOSTCC_MODE_32BYTE);
        assert_eq!(dev.chip().phy_id, PHY_ID_SERDES);

        let flags = dev.flags();
        assert!(!flags.contains(Tg3Flags::PCIX_MODE));
        assert!(flags.contains(Tg3Flags::NVRAM));
        assert!(flags.contains(Tg3Flags::SPLIT_MODE | Tg3Flags::POLL_SERDES));
        assert!(!flags.contains(Tg3Flags::TEN_100_ONLY | Tg3Flags::USE_MI_INTERRUPT));
        assert_eq!(dev.chip().split_mode_max_reqs, SPLIT_MODE_5704_MAX_REQ);
        assert_eq!(dev.chip().led_mode, LedMode::ThreeLink);

        let cmd = sim.state().config(PCI_COMMAND) as u16;
        assert_eq!(cmd & PCI_COMMAND_INVALIDATE, 0);
        assert_eq!(cmd & (PCI_COMMAND_PARITY | PCI_COMMAND_SERR), PCI_COMMAND_PARITY | PCI_COMMAND_SERR);
    }

    #[test]
    fn latency_timer_raised_on_5703() {
        let (sim, mut dev) = board_device(Tg3Config::default());
        {
            let mut s = sim.state_mut();
            s.set_chip_rev(CHIPREV_ID_5703_A2);
            s.set_config(PCI_CACHE_LINE_SIZE, 0x0000_2010);
        }

        assert_eq!(dev.get_invariants(), Ok(()));
        assert_eq!(dev.chip().asic_rev(), ASIC_REV_5703);
        assert_eq!(dev.chip().pci_cacheline_sz, 0x10);
        assert_eq!(dev.chip().pci_lat_timer, 64);
        let s = sim.state();
        assert_eq!(s.config_writes(PCI_CACHE_LINE_SIZE), vec![0x0000_4010]);
        assert_eq!(s.config(PCI_CACHE_LINE_SIZE), 0x0000_4010);
    }

    #[test]
    fn latency_timer_kept_when_long_enough_or_not_5703() {
        let (sim, mut dev) = board_device(Tg3Config::default());
        {
            let mut s = sim.state_mut();
            s.set_chip_rev(CHIPREV_ID_5703_A2);
            s.set_config(PCI_CACHE_LINE_SIZE, 0x0000_8010);
        }
        assert_eq!(dev.get_invariants(), Ok(()));
        assert_eq!(dev.chip().pci_lat_timer, 0x80);
        assert!(sim.state().config_writes(PCI_CACHE_LINE_SIZE).is_empty());

        let (sim, mut dev) = board_device(Tg3Config::default());
        sim.state_mut().set_config(PCI_CACHE_LINE_SIZE, 0x0000_2010);
        assert_eq!(dev.get_invariants(), Ok(()));
        assert_eq!(dev.chip().pci_lat_timer, 0x20);
        assert!(sim.state().config_writes(PCI_CACHE_LINE_SIZE).is_empty());
    }

    #[test]
    fn dma_control_for_pcix_5704_a0() {
        let (_sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.flags |= Tg3Flags::PCIX_MODE;

        assert_eq!(dev.test_dma(), Ok(()));
        let rw = dev.chip.dma_rwctrl;
        assert_eq!(rw >> DMA_RWCTRL_WRITE_WATER_SHIFT & 7, 3);
        assert_eq!(rw >> DMA_RWCTRL_READ_WATER_SHIFT & 7, 7);
        assert_ne!(rw & DMA_RWCTRL_ONE_DMA, 0);
        assert_ne!(rw & DMA_RWCTRL_USE_MEM_READ_MULT, 0);
    }

    #[test]
    fn dma_round_trip_times_out_without_completion() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5701_B0;

        assert_eq!(dev.test_dma(), Err(Tg3Error::Timeout(WaitSite::DmaTest)));
        assert_eq!(sim.delays().count(100), DMA_TEST_LOOPS as u64);
        let s = sim.state();
        assert_eq!(s.sram(NIC_SRAM_DMA_DESC_POOL_BASE + 8), DMA_TEST_MBUF);
        assert_eq!(s.sram(NIC_SRAM_DMA_DESC_POOL_BASE + 12), 0x400 | (13 << 8 | 2) << 16);
        assert_eq!(s.reg(FTQ_DMA_HIGH_READ_FIFO_ENQDEQ), NIC_SRAM_DMA_DESC_POOL_BASE);
    }

    #[test]
    fn corrupt_round_trip_narrows_boundary_then_fails() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5701_B0;
        {
            let mut s = sim.state_mut();
            s.pin(FTQ_RCVBD_COMP_FIFO_ENQDEQ, NIC_SRAM_DMA_DESC_POOL_BASE);
            s.pin(FTQ_RCVDATA_COMP_FIFO_ENQDEQ, NIC_SRAM_DMA_DESC_POOL_BASE);
        }

        // Nothing moves the data, so the read-back stays zeroed.
        assert_eq!(dev.test_dma(), Err(Tg3Error::DmaTestFailed));
        assert_ne!(dev.chip.dma_rwctrl & DMA_RWCTRL_WRITE_BNDRY_16, 0);
        assert_eq!(
            sim.state().reg(TG3PCI_DMA_RW_CTRL as u32),
            dev.chip.dma_rwctrl
        );
    }

    #[test]
    fn dma_round_trip_skipped_when_disabled() {
        let config = Tg3Config {
            test_dma: false,
            ..Tg3Config::default()
        };
        let (sim, mut dev) = testutil::device_with(config);
        dev.chip.chip_rev_id = CHIPREV_ID_5701_B0;
        assert_eq!(dev.test_dma(), Ok(()));
        assert!(sim.state().reg_writes(RDMAC_MODE).is_empty());
    }

    #[test]
    fn attach_brings_up_fiber_board() {
        let (sim, mut dev) = board_device(Tg3Config::default());

        assert_eq!(dev.probe(), Ok(()));
        assert_eq!(dev.chip().pm_cap, SIM_PM_CAP);
        assert_eq!(dev.mac_address(), STATION);
        assert_eq!(dev.state(), ChipState::Ready);
        assert!(dev.carrier_ok());
        assert!(dev.flags().contains(Tg3Flags::INIT_COMPLETE));
        assert_eq!(dev.part_number(), "none");
        assert_ne!(dev.chip().pci_cfg_state[0], 0);

        assert_eq!(sim.state().reg(MAC_ADDR_0_LOW), 0x182a_3b4c);
    }

    #[test]
    fn attach_without_link_halts_and_fails() {
        let config = Tg3Config {
            link_wait_ms: 5,
            ..Tg3Config::default()
        };
        let (sim, mut dev) = board_device(config);
        sim.state_mut().pin(MAC_STATUS, 0);

        assert_eq!(dev.probe(), Err(Tg3Error::NoLink));
        assert_eq!(dev.state(), ChipState::Halted);
        assert!(!dev.flags().contains(Tg3Flags::INIT_COMPLETE));
        assert!(!dev.carrier_ok());
    }

    #[test]
    fn attach_refuses_unpatched_5701_a0() {
        let config = Tg3Config {
            test_dma: false,
            ..Tg3Config::default()
        };
        let (sim, mut dev) = board_device(config);
        sim.state_mut().set_chip_rev(CHIPREV_ID_5701_A0);

        assert_eq!(dev.probe(), Err(Tg3Error::UnsupportedChip));
        assert_eq!(dev.state(), ChipState::Halted);
    }

    #[test]
    fn attach_rejects_absent_chip() {
        let (sim, mut dev) = board_device(Tg3Config::default());
        sim.state_mut().set_config(TG3PCI_MISC_HOST_CTRL, 0xffff_ffff);
        assert_eq!(dev.probe(), Err(Tg3Error::DeviceNotResponding));
    }

    #[test]
    fn attach_needs_power_management() {
        let (sim, mut dev) = board_device(Tg3Config::default());
        sim.state_mut().set_config(0x34, 0);
        assert_eq!(dev.probe(), Err(Tg3Error::NoDevice));
        assert_eq!(dev.state(), ChipState::Cold);
    }
}
