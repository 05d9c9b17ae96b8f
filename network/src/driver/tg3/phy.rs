//! MII management and copper link bring-up.
//!
//! Copper PHYs autonegotiate in hardware; the driver programs the
//! advertisement, restarts negotiation and reads back the result from
//! the Broadcom auxiliary status register. The TBI (fiber) port is
//! handled in [`super::fiber`].
//!
//! # Reference
//! IEEE 802.3 Clause 22 (MII), Clause 28 (autonegotiation),
//! Annex 28B (pause resolution), Broadcom BCM5401/5411/5701 datasheets

use log::{debug, info, warn};

use super::error::{Result, Tg3Error, WaitSite};
use super::hw::Tg3Bus;
use super::regs::*;
use super::{Advertising, Duplex, LedMode, LinkSpeed, Tg3Device, Tg3Flags};
use crate::time::{poll_until, Delay};

/// MII busy polls (10µs apart).
pub const PHY_BUSY_LOOPS: u32 = 5000;

// ═══════════════════════════════════════════════════════════════════════════
// PHY IDENTIFICATION
// ═══════════════════════════════════════════════════════════════════════════

/// Board subsystem id to PHY id, for boards whose PHY cannot be read.
const SUBSYS_PHY_IDS: &[(u16, u16, u32)] = &[
    // Broadcom reference boards
    (PCI_VENDOR_ID_BROADCOM, 0x1644, PHY_ID_BCM5401),
    (PCI_VENDOR_ID_BROADCOM, 0x0001, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_BROADCOM, 0x0002, PHY_ID_BCM8002),
    (PCI_VENDOR_ID_BROADCOM, 0x0003, PHY_ID_SERDES),
    (PCI_VENDOR_ID_BROADCOM, 0x0005, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_BROADCOM, 0x0006, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_BROADCOM, 0x0007, PHY_ID_SERDES),
    (PCI_VENDOR_ID_BROADCOM, 0x0008, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_BROADCOM, 0x8008, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_BROADCOM, 0x0009, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_BROADCOM, 0x8009, PHY_ID_BCM5701),
    // 3Com
    (PCI_VENDOR_ID_3COM, 0x1000, PHY_ID_BCM5401),
    (PCI_VENDOR_ID_3COM, 0x1006, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_3COM, 0x1004, PHY_ID_SERDES),
    (PCI_VENDOR_ID_3COM, 0x1007, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_3COM, 0x1008, PHY_ID_BCM5701),
    // Dell
    (PCI_VENDOR_ID_DELL, 0x00d1, PHY_ID_BCM5401),
    (PCI_VENDOR_ID_DELL, 0x0106, PHY_ID_BCM5401),
    (PCI_VENDOR_ID_DELL, 0x0109, PHY_ID_BCM5411),
    (PCI_VENDOR_ID_DELL, 0x010a, PHY_ID_BCM5411),
    // Compaq
    (PCI_VENDOR_ID_COMPAQ, 0x007c, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_COMPAQ, 0x009a, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_COMPAQ, 0x007d, PHY_ID_SERDES),
    (PCI_VENDOR_ID_COMPAQ, 0x0085, PHY_ID_BCM5701),
    (PCI_VENDOR_ID_COMPAQ, 0x0099, PHY_ID_BCM5701),
];

/// PHY id wired to a board, if the board is in the table.
pub fn subsystem_phy_id(vendor: u16, device: u16) -> Option<u32> {
    SUBSYS_PHY_IDS
        .iter()
        .find(|&&(v, d, _)| v == vendor && d == device)
        .map(|&(_, _, id)| id)
}

/// Combine PHYSID1/PHYSID2 into the driver's PHY id layout.
#[inline]
pub fn pack_phy_id(id1: u32, id2: u32) -> u32 {
    (id1 & 0xffff) << 10 | (id2 & 0xfc00) << 16 | (id2 & 0x03ff)
}

pub fn is_known_phy_id(id: u32) -> bool {
    matches!(
        id & PHY_ID_MASK,
        PHY_ID_BCM5400
            | PHY_ID_BCM5401
            | PHY_ID_BCM5411
            | PHY_ID_BCM5701
            | PHY_ID_BCM5703
            | PHY_ID_BCM5704
            | PHY_ID_BCM8002
            | PHY_ID_SERDES
    )
}

pub fn phy_string(phy_id: u32) -> &'static str {
    match phy_id & PHY_ID_MASK {
        PHY_ID_BCM5400 => "5400",
        PHY_ID_BCM5401 => "5401",
        PHY_ID_BCM5411 => "5411",
        PHY_ID_BCM5701 => "5701",
        PHY_ID_BCM5703 => "5703",
        PHY_ID_BCM5704 => "5704",
        PHY_ID_BCM8002 => "8002",
        PHY_ID_SERDES => "serdes",
        _ => "unknown",
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LINK RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════

/// Pause resolution (802.3 Annex 28B table 28B-3).
///
/// `local` and `remote` use the MII advertisement bit positions.
pub fn resolve_flow_control(local: u32, remote: u32) -> Tg3Flags {
    let remote_cap = remote & LPA_PAUSE_CAP != 0;
    let remote_asym = remote & LPA_PAUSE_ASYM != 0;

    if local & ADVERTISE_PAUSE_CAP != 0 {
        if local & ADVERTISE_PAUSE_ASYM != 0 {
            if remote_cap {
                Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE
            } else if remote_asym {
                Tg3Flags::RX_PAUSE
            } else {
                Tg3Flags::empty()
            }
        } else if remote_cap {
            Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE
        } else {
            Tg3Flags::empty()
        }
    } else if local & ADVERTISE_PAUSE_ASYM != 0 && remote_cap && remote_asym {
        Tg3Flags::TX_PAUSE
    } else {
        Tg3Flags::empty()
    }
}

/// Decode the speed/duplex field of `MII_TG3_AUX_STAT`.
pub fn aux_stat_speed_duplex(aux_stat: u32) -> Option<(LinkSpeed, Duplex)> {
    match aux_stat & MII_TG3_AUX_STAT_SPDMASK {
        MII_TG3_AUX_STAT_10HALF => Some((LinkSpeed::Speed10, Duplex::Half)),
        MII_TG3_AUX_STAT_10FULL => Some((LinkSpeed::Speed10, Duplex::Full)),
        MII_TG3_AUX_STAT_100HALF => Some((LinkSpeed::Speed100, Duplex::Half)),
        MII_TG3_AUX_STAT_100FULL => Some((LinkSpeed::Speed100, Duplex::Full)),
        MII_TG3_AUX_STAT_1000HALF => Some((LinkSpeed::Speed1000, Duplex::Half)),
        MII_TG3_AUX_STAT_1000FULL => Some((LinkSpeed::Speed1000, Duplex::Full)),
        _ => None,
    }
}

/// MII advertisement register value for a set of link modes.
fn mii_advertisement(adv: Advertising) -> u32 {
    let mut val = ADVERTISE_CSMA | ADVERTISE_PAUSE_CAP;
    if adv.contains(Advertising::HALF_10) {
        val |= ADVERTISE_10HALF;
    }
    if adv.contains(Advertising::FULL_10) {
        val |= ADVERTISE_10FULL;
    }
    if adv.contains(Advertising::HALF_100) {
        val |= ADVERTISE_100HALF;
    }
    if adv.contains(Advertising::FULL_100) {
        val |= ADVERTISE_100FULL;
    }
    val
}

// ═══════════════════════════════════════════════════════════════════════════
// MII ACCESS
// ═══════════════════════════════════════════════════════════════════════════

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    /// Run one MII management frame. Auto-polling is suspended around it.
    fn mii_frame(&mut self, frame: u32) -> Result<u32> {
        let auto_poll = self.modes.mi_mode & MAC_MI_MODE_AUTO_POLL != 0;
        if auto_poll {
            self.regs
                .tw32_carefully(MAC_MI_MODE, self.modes.mi_mode & !MAC_MI_MODE_AUTO_POLL, 40);
        }

        self.regs.tw32_flush(MAC_MI_COM, frame);
        let done = poll_until(&mut self.regs, PHY_BUSY_LOOPS, 10, |r| {
            r.tr32(MAC_MI_COM) & MI_COM_BUSY == 0
        });
        let result = match done {
            Ok(_) => {
                self.regs.udelay(5);
                Ok(self.regs.tr32(MAC_MI_COM))
            }
            Err(_) => Err(Tg3Error::PhyBusy),
        };

        if auto_poll {
            self.regs.tw32_carefully(MAC_MI_MODE, self.modes.mi_mode, 40);
        }
        result
    }

    pub(crate) fn read_phy(&mut self, reg: u32) -> Result<u32> {
        let frame = (PHY_ADDR << MI_COM_PHY_ADDR_SHIFT) & MI_COM_PHY_ADDR_MASK
            | (reg << MI_COM_REG_ADDR_SHIFT) & MI_COM_REG_ADDR_MASK
            | MI_COM_CMD_READ
            | MI_COM_START;
        self.mii_frame(frame).map(|v| v & MI_COM_DATA_MASK)
    }

    pub(crate) fn write_phy(&mut self, reg: u32, val: u32) -> Result<()> {
        let frame = (PHY_ADDR << MI_COM_PHY_ADDR_SHIFT) & MI_COM_PHY_ADDR_MASK
            | (reg << MI_COM_REG_ADDR_SHIFT) & MI_COM_REG_ADDR_MASK
            | val & MI_COM_DATA_MASK
            | MI_COM_CMD_WRITE
            | MI_COM_START;
        self.mii_frame(frame).map(|_| ())
    }

    /// Reset the PHY and wait for BMCR_RESET to self-clear.
    pub(crate) fn phy_reset(&mut self) -> Result<()> {
        self.read_phy(MII_BMSR)?;
        self.read_phy(MII_BMSR)?;
        self.write_phy(MII_BMCR, BMCR_RESET)?;

        let mut mii_error = None;
        poll_until(self, 5000, 10, |dev| match dev.read_phy(MII_BMCR) {
            Ok(bmcr) => bmcr & BMCR_RESET == 0,
            Err(e) => {
                mii_error = Some(e);
                true
            }
        })
        .map_err(Tg3Error::timeout(WaitSite::PhyReset))?;
        if let Some(e) = mii_error {
            return Err(e);
        }

        self.regs.udelay(40);
        Ok(())
    }

    /// BCM5401 DSP coefficients; tap power management off.
    fn init_5401_dsp(&mut self) -> Result<()> {
        self.write_phy(MII_TG3_AUX_CTRL, 0x0c20)?;
        for &(addr, val) in &[
            (0x0012, 0x1804),
            (0x0013, 0x1204),
            (0x8006, 0x0132),
            (0x8006, 0x0232),
            (0x201f, 0x0a20),
        ] {
            self.write_phy(MII_TG3_DSP_ADDRESS, addr)?;
            self.write_phy(MII_TG3_DSP_RW_PORT, val)?;
        }
        self.regs.udelay(40);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // COPPER
    // ═══════════════════════════════════════════════════════════════════════

    /// Program the advertisement and restart autonegotiation.
    fn copper_begin(&mut self) -> Result<()> {
        let mut adv = self.link.effective_advertising();
        if self.flags.contains(Tg3Flags::TEN_100_ONLY) {
            adv.remove(Advertising::GIGABIT);
        }

        self.write_phy(MII_ADVERTISE, mii_advertisement(adv))?;

        let mut gig = 0;
        if adv.contains(Advertising::HALF_1000) {
            gig |= MII_TG3_CTRL_ADV_1000_HALF;
        }
        if adv.contains(Advertising::FULL_1000) {
            gig |= MII_TG3_CTRL_ADV_1000_FULL;
        }
        if gig != 0 && self.chip.is_5701_a0_b0() {
            gig |= MII_TG3_CTRL_AS_MASTER | MII_TG3_CTRL_ENABLE_AS_MASTER;
        }
        self.write_phy(MII_TG3_CTRL, gig)?;

        debug!("phy: autoneg restart, advertising {:?}", adv);
        self.write_phy(MII_BMCR, BMCR_ANENABLE | BMCR_ANRESTART)
    }

    /// Apply a pause resolution to the RX/TX MAC modes.
    ///
    /// Mode registers are rewritten only when the resolution changes them.
    pub(crate) fn setup_flow_control(&mut self, local: u32, remote: u32) {
        let pause = if self.config.flow_control {
            resolve_flow_control(local, remote)
        } else {
            Tg3Flags::empty()
        };
        self.flags.remove(Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE);
        self.flags |= pause;

        let rx_mode = if pause.contains(Tg3Flags::RX_PAUSE) {
            self.modes.rx_mode | RX_MODE_FLOW_CTRL_ENABLE
        } else {
            self.modes.rx_mode & !RX_MODE_FLOW_CTRL_ENABLE
        };
        if rx_mode != self.modes.rx_mode {
            self.modes.rx_mode = rx_mode;
            self.regs.tw32(MAC_RX_MODE, rx_mode);
        }

        let tx_mode = if pause.contains(Tg3Flags::TX_PAUSE) {
            self.modes.tx_mode | TX_MODE_FLOW_CTRL_ENABLE
        } else {
            self.modes.tx_mode & !TX_MODE_FLOW_CTRL_ENABLE
        };
        if tx_mode != self.modes.tx_mode {
            self.modes.tx_mode = tx_mode;
            self.regs.tw32(MAC_TX_MODE, tx_mode);
        }
    }

    fn setup_copper_phy(&mut self) -> Result<()> {
        self.regs.tw32_carefully(
            MAC_STATUS,
            MAC_STATUS_SYNC_CHANGED | MAC_STATUS_CFG_CHANGED,
            40,
        );
        self.modes.mi_mode = MAC_MI_MODE_BASE;
        self.regs.tw32_carefully(MAC_MI_MODE, self.modes.mi_mode, 40);

        self.write_phy(MII_TG3_AUX_CTRL, 0x02)?;

        if self.chip.phy_id & PHY_ID_MASK == PHY_ID_BCM5401 {
            self.bcm5401_link_kick()?;
        } else if self.chip.is_5701_a0_b0() {
            // 5701 A0/B0 CRC workaround.
            self.write_phy(0x15, 0x0a75)?;
            self.write_phy(0x1c, 0x8c68)?;
            self.write_phy(0x1c, 0x8d68)?;
            self.write_phy(0x1c, 0x8c68)?;
        }

        // Clear latched PHY interrupts.
        self.read_phy(MII_TG3_ISTAT)?;
        self.read_phy(MII_TG3_ISTAT)?;

        let imask = if self.flags.contains(Tg3Flags::USE_MI_INTERRUPT) {
            !MII_TG3_INT_LINKCHG
        } else {
            !0
        };
        self.write_phy(MII_TG3_IMASK, imask)?;

        let ext = if self.chip.led_mode == LedMode::ThreeLink {
            MII_TG3_EXT_CTRL_LNK3_LED_MODE
        } else {
            0
        };
        self.write_phy(MII_TG3_EXT_CTRL, ext)?;

        let mut link_up = false;
        self.read_phy(MII_BMSR)?;
        let bmsr = self.read_phy(MII_BMSR)?;
        if bmsr & BMSR_LSTATUS != 0 {
            let mut aux_stat = 0;
            let mut mii_error = None;
            let polled = poll_until(self, 2000, 10, |dev| match dev.read_phy(MII_TG3_AUX_STAT) {
                Ok(v) => {
                    aux_stat = v;
                    v != 0
                }
                Err(e) => {
                    mii_error = Some(e);
                    true
                }
            });
            if let Some(e) = mii_error {
                return Err(e);
            }
            if let Err(t) = polled {
                debug!("aux status still zero after {} polls", t.polls);
            }
            let resolved = aux_stat_speed_duplex(aux_stat);

            self.read_phy(MII_BMCR)?;
            let bmcr = self.read_phy(MII_BMCR)?;
            if bmcr & BMCR_ANENABLE != 0 {
                // A PHY leaving low-power mode drops its gigabit
                // advertisement; renegotiate in that case.
                let gig = self.read_phy(MII_TG3_CTRL)?;
                link_up = gig & (MII_TG3_CTRL_ADV_1000_HALF | MII_TG3_CTRL_ADV_1000_FULL) != 0;
            }

            self.link.active_speed = resolved.map(|(s, _)| s);
            self.link.active_duplex = resolved.map(|(_, d)| d);
        }

        if link_up && self.link.active_duplex == Some(Duplex::Full) {
            let local = self.read_phy(MII_ADVERTISE)? & (ADVERTISE_PAUSE_CAP | ADVERTISE_PAUSE_ASYM);
            let remote = self.read_phy(MII_LPA)? & (LPA_PAUSE_CAP | LPA_PAUSE_ASYM);
            if local != ADVERTISE_PAUSE_CAP {
                link_up = false;
            } else {
                self.setup_flow_control(local, remote);
            }
        }

        if !link_up {
            self.copper_begin()?;
            self.read_phy(MII_BMSR)?;
            link_up = self.read_phy(MII_BMSR)? & BMSR_LSTATUS != 0;
        }

        self.program_copper_mac_mode(link_up);

        if self.chip.asic_rev() == ASIC_REV_5700
            && link_up
            && self.link.active_speed == Some(LinkSpeed::Speed1000)
            && self.flags.intersects(Tg3Flags::PCIX_MODE | Tg3Flags::PCI_HIGH_SPEED)
        {
            self.regs.udelay(120);
            self.regs.tw32_carefully(
                MAC_STATUS,
                MAC_STATUS_SYNC_CHANGED | MAC_STATUS_CFG_CHANGED,
                40,
            );
            self.regs
                .write_mem(NIC_SRAM_FIRMWARE_MBOX, NIC_SRAM_FIRMWARE_MBOX_MAGIC2);
        }

        if link_up != self.carrier_ok {
            self.carrier_ok = link_up;
            self.stats.link_changes += 1;
            self.link_report();
        }
        Ok(())
    }

    /// BCM5401 needs its DSP reloaded when the link is not up, and the
    /// B0 stepping a full reset if gigabit still fails to come up.
    fn bcm5401_link_kick(&mut self) -> Result<()> {
        self.read_phy(MII_BMSR)?;
        let mut bmsr = self.read_phy(MII_BMSR)?;
        if !self.flags.contains(Tg3Flags::INIT_COMPLETE) {
            bmsr = 0;
        }
        if bmsr & BMSR_LSTATUS != 0 {
            return Ok(());
        }

        self.init_5401_dsp()?;
        self.read_phy(MII_BMSR)?;
        let up = poll_until(self, 1000, 10, |dev| {
            dev.read_phy(MII_BMSR).map_or(false, |v| v & BMSR_LSTATUS != 0)
        })
        .is_ok();
        if up {
            self.regs.udelay(40);
            return Ok(());
        }

        if self.chip.phy_id & PHY_REV_MASK == PHY_REV_BCM5401_B0
            && self.link.active_speed == Some(LinkSpeed::Speed1000)
        {
            debug!("phy: 5401 B0 gigabit retry");
            self.phy_reset()?;
            self.init_5401_dsp()?;
        }
        Ok(())
    }

    fn program_copper_mac_mode(&mut self, link_up: bool) {
        let speed = self.link.active_speed;
        let mut mac_mode = self.modes.mac_mode & !MAC_MODE_PORT_MODE_MASK;
        if link_up && matches!(speed, Some(LinkSpeed::Speed10) | Some(LinkSpeed::Speed100)) {
            mac_mode |= MAC_MODE_PORT_MODE_MII;
        } else {
            mac_mode |= MAC_MODE_PORT_MODE_GMII;
        }

        mac_mode &= !MAC_MODE_HALF_DUPLEX;
        if self.link.active_duplex == Some(Duplex::Half) {
            mac_mode |= MAC_MODE_HALF_DUPLEX;
        }

        mac_mode &= !MAC_MODE_LINK_POLARITY;
        if self.chip.asic_rev() == ASIC_REV_5700 {
            if self.chip.led_mode == LedMode::Link10
                || (link_up && speed == Some(LinkSpeed::Speed10))
            {
                mac_mode |= MAC_MODE_LINK_POLARITY;
            }
        } else {
            if link_up {
                mac_mode |= MAC_MODE_LINK_POLARITY;
            }
            self.regs.tw32(MAC_LED_CTRL, LED_CTRL_PHY_MODE_1);
        }

        // Altima 5411 boards only pass traffic with MI auto-polling on.
        if self.chip.phy_id & PHY_ID_MASK == PHY_ID_BCM5411
            && self.chip.chip_rev_id == CHIPREV_ID_5700_ALTIMA
        {
            self.modes.mi_mode |= MAC_MI_MODE_AUTO_POLL;
            self.regs.tw32_carefully(MAC_MI_MODE, self.modes.mi_mode, 40);
        }

        self.modes.mac_mode = mac_mode;
        self.regs.tw32_carefully(MAC_MODE, mac_mode, 40);

        let event = if self
            .flags
            .intersects(Tg3Flags::USE_LINKCHG_REG | Tg3Flags::POLL_SERDES)
        {
            0
        } else {
            MAC_EVENT_LNKSTATE_CHANGED
        };
        self.regs.tw32_carefully(MAC_EVENT, event, 40);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DISPATCH
    // ═══════════════════════════════════════════════════════════════════════

    /// Bring the link up on whichever port the board has, then set the
    /// MAC transmit timing for the result.
    pub fn setup_phy(&mut self) -> Result<()> {
        let result = if self.chip.is_serdes() {
            self.setup_fiber_phy()
        } else {
            self.setup_copper_phy()
        };

        let slot_time = if self.link.active_speed == Some(LinkSpeed::Speed1000)
            && self.link.active_duplex == Some(Duplex::Half)
        {
            0xff
        } else {
            32
        };
        self.regs.tw32(
            MAC_TX_LENGTHS,
            2 << TX_LENGTHS_IPG_CRS_SHIFT | 6 << TX_LENGTHS_IPG_SHIFT | slot_time << TX_LENGTHS_SLOT_TIME_SHIFT,
        );
        result
    }

    pub(crate) fn link_report(&self) {
        if !self.carrier_ok {
            info!("link is down");
            return;
        }
        let speed = self.link.active_speed.map_or(10, |s| s.mbps());
        let duplex = match self.link.active_duplex {
            Some(Duplex::Full) => "full",
            _ => "half",
        };
        let tx = self.flags.contains(Tg3Flags::TX_PAUSE);
        let rx = self.flags.contains(Tg3Flags::RX_PAUSE);
        info!(
            "link is up at {} Mbps, {} duplex{}{}{}",
            speed,
            duplex,
            if tx { ", TX" } else { "" },
            if rx { ", RX" } else { "" },
            if tx || rx { " flow control" } else { "" },
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PROBE
    // ═══════════════════════════════════════════════════════════════════════

    /// Identify the PHY, reset it and apply per-chip fixups.
    ///
    /// The id read over MII wins when it is one this driver knows; a
    /// board table entry comes next, then the id the bootcode left in
    /// SRAM.
    pub(crate) fn phy_probe(&mut self) -> Result<()> {
        let table_id = subsystem_phy_id(self.chip.subsystem_vendor, self.chip.subsystem_device);

        let mut eeprom_phy_id = None;
        let mut eeprom_led = LedMode::Auto;
        let signature = self.regs.read_mem(NIC_SRAM_DATA_SIG) == NIC_SRAM_DATA_SIG_MAGIC;
        if signature {
            let nic_cfg = self.regs.read_mem(NIC_SRAM_DATA_CFG);
            if nic_cfg & NIC_SRAM_DATA_CFG_PHY_TYPE_MASK == NIC_SRAM_DATA_CFG_PHY_TYPE_FIBER {
                eeprom_phy_id = Some(PHY_ID_SERDES);
            } else {
                let nic_phy_id = self.regs.read_mem(NIC_SRAM_DATA_PHY_ID);
                if nic_phy_id != 0 {
                    eeprom_phy_id = Some(pack_phy_id(
                        (nic_phy_id & NIC_SRAM_DATA_PHY_ID1_MASK) >> 16,
                        nic_phy_id & NIC_SRAM_DATA_PHY_ID2_MASK,
                    ));
                }
            }

            eeprom_led = match nic_cfg & NIC_SRAM_DATA_CFG_LED_MODE_MASK {
                NIC_SRAM_DATA_CFG_LED_TRIPLE_SPD => LedMode::ThreeLink,
                NIC_SRAM_DATA_CFG_LED_LINK_SPD => LedMode::Link10,
                _ => LedMode::Auto,
            };

            if (self.chip.chip_rev_id == CHIPREV_ID_5703_A1
                || self.chip.chip_rev_id == CHIPREV_ID_5703_A2)
                && nic_cfg & NIC_SRAM_DATA_CFG_EEPROM_WP != 0
            {
                self.flags |= Tg3Flags::EEPROM_WRITE_PROT;
            }
            if nic_cfg & NIC_SRAM_DATA_CFG_ASF_ENABLE != 0 {
                self.flags |= Tg3Flags::ENABLE_ASF;
            }
            if nic_cfg & NIC_SRAM_DATA_CFG_FIBER_WOL != 0 {
                self.flags |= Tg3Flags::SERDES_WOL_CAP;
            }
        }

        let hw_id = match (self.read_phy(MII_PHYSID1), self.read_phy(MII_PHYSID2)) {
            (Ok(id1), Ok(id2)) => Some(pack_phy_id(id1, id2)),
            _ => None,
        };

        self.chip.phy_id = match (hw_id, table_id, eeprom_phy_id) {
            (Some(id), _, _) if is_known_phy_id(id) => id,
            (_, Some(id), _) => id,
            (_, None, Some(id)) if is_known_phy_id(id) => id,
            _ => {
                warn!("phy: unknown PHY {:#010x}", hw_id.unwrap_or(PHY_ID_INVALID));
                return Err(Tg3Error::UnsupportedPhy);
            }
        };
        debug!("phy: id {:#010x} ({})", self.chip.phy_id, phy_string(self.chip.phy_id));

        self.phy_reset()?;

        if self.chip.is_5701_a0_b0() {
            // These steppings come out of reset advertising 10Mb only.
            self.write_phy(
                MII_ADVERTISE,
                ADVERTISE_CSMA
                    | ADVERTISE_PAUSE_CAP
                    | ADVERTISE_10HALF
                    | ADVERTISE_10FULL
                    | ADVERTISE_100HALF
                    | ADVERTISE_100FULL,
            )?;
            let gig = if self.flags.contains(Tg3Flags::TEN_100_ONLY) {
                0
            } else {
                MII_TG3_CTRL_ADV_1000_HALF
                    | MII_TG3_CTRL_ADV_1000_FULL
                    | MII_TG3_CTRL_AS_MASTER
                    | MII_TG3_CTRL_ENABLE_AS_MASTER
            };
            self.write_phy(MII_TG3_CTRL, gig)?;
            self.write_phy(MII_BMCR, BMCR_ANRESTART | BMCR_ANENABLE)?;
        }

        match self.chip.asic_rev() {
            ASIC_REV_5703 => {
                self.write_phy(MII_TG3_AUX_CTRL, 0x0c00)?;
                self.write_phy(MII_TG3_DSP_ADDRESS, 0x201f)?;
                self.write_phy(MII_TG3_DSP_RW_PORT, 0x2aaa)?;
            }
            ASIC_REV_5704 => {
                self.write_phy(0x1c, 0x8d68)?;
                self.write_phy(0x1c, 0x8d68)?;
            }
            _ => {}
        }

        // Ethernet@WireSpeed.
        self.write_phy(MII_TG3_AUX_CTRL, 0x7007)?;
        let aux = self.read_phy(MII_TG3_AUX_CTRL)?;
        self.write_phy(MII_TG3_AUX_CTRL, aux | 1 << 15 | 1 << 4)?;

        if self.chip.phy_id & PHY_ID_MASK == PHY_ID_BCM5401 {
            self.init_5401_dsp()?;
        }

        self.chip.led_mode = if self.chip.subsystem_vendor == PCI_VENDOR_ID_DELL {
            LedMode::Link10
        } else if signature && eeprom_led != LedMode::Auto {
            eeprom_led
        } else {
            LedMode::ThreeLink
        };

        if self.chip.is_serdes() {
            self.link.advertising = Advertising::FIBRE_ALL;
        }
        if self.flags.contains(Tg3Flags::TEN_100_ONLY) {
            self.link.advertising.remove(Advertising::GIGABIT);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tg3::testutil;
    use crate::driver::tg3::LinkConfig;

    const CAP: u32 = ADVERTISE_PAUSE_CAP;
    const ASYM: u32 = ADVERTISE_PAUSE_ASYM;

    #[test]
    fn pause_resolution_follows_annex_28b() {
        let both = Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE;
        assert_eq!(resolve_flow_control(CAP | ASYM, CAP), both);
        assert_eq!(resolve_flow_control(CAP | ASYM, ASYM), Tg3Flags::RX_PAUSE);
        assert_eq!(resolve_flow_control(CAP | ASYM, 0), Tg3Flags::empty());
        assert_eq!(resolve_flow_control(CAP, CAP | ASYM), both);
        assert_eq!(resolve_flow_control(CAP, ASYM), Tg3Flags::empty());
        assert_eq!(resolve_flow_control(ASYM, CAP | ASYM), Tg3Flags::TX_PAUSE);
        assert_eq!(resolve_flow_control(ASYM, CAP), Tg3Flags::empty());
        assert_eq!(resolve_flow_control(0, CAP | ASYM), Tg3Flags::empty());
    }

    #[test]
    fn aux_stat_decodes_speed_and_duplex() {
        assert_eq!(
            aux_stat_speed_duplex(MII_TG3_AUX_STAT_1000FULL | 0x0f),
            Some((LinkSpeed::Speed1000, Duplex::Full))
        );
        assert_eq!(
            aux_stat_speed_duplex(MII_TG3_AUX_STAT_10HALF),
            Some((LinkSpeed::Speed10, Duplex::Half))
        );
        assert_eq!(aux_stat_speed_duplex(MII_TG3_AUX_STAT_100_4), None);
        assert_eq!(aux_stat_speed_duplex(0), None);
    }

    #[test]
    fn phy_ids_pack_and_name() {
        let id = pack_phy_id(0x0020, 0x6190);
        assert_eq!(id & PHY_ID_MASK, PHY_ID_BCM5704);
        assert_eq!(phy_string(id), "5704");
        assert!(is_known_phy_id(PHY_ID_SERDES));
        assert_eq!(phy_string(PHY_ID_SERDES), "serdes");
        assert!(!is_known_phy_id(pack_phy_id(0, 0)));
        assert_eq!(phy_string(PHY_ID_INVALID), "unknown");
    }

    #[test]
    fn subsystem_table_lookup() {
        assert_eq!(subsystem_phy_id(PCI_VENDOR_ID_3COM, 0x1004), Some(PHY_ID_SERDES));
        assert_eq!(subsystem_phy_id(PCI_VENDOR_ID_DELL, 0x0109), Some(PHY_ID_BCM5411));
        assert_eq!(subsystem_phy_id(PCI_VENDOR_ID_COMPAQ, 0x0001), None);
    }

    #[test]
    fn mii_access_suspends_auto_poll() {
        let (sim, mut dev) = testutil::device();
        sim.state_mut().phy[MII_PHYSID1 as usize] = 0x0020;
        dev.modes.mi_mode = MAC_MI_MODE_BASE | MAC_MI_MODE_AUTO_POLL;
        assert_eq!(dev.read_phy(MII_PHYSID1), Ok(0x0020));
        assert_eq!(
            sim.state().reg_writes(MAC_MI_MODE),
            vec![MAC_MI_MODE_BASE, MAC_MI_MODE_BASE | MAC_MI_MODE_AUTO_POLL]
        );
    }

    #[test]
    fn stuck_mii_reports_busy_after_budget() {
        let (sim, mut dev) = testutil::device();
        sim.state_mut().mii_stuck = true;
        assert_eq!(dev.write_phy(MII_BMCR, 0), Err(Tg3Error::PhyBusy));
        assert_eq!(sim.delays().count(10), PHY_BUSY_LOOPS as u64);
        assert_eq!(dev.phy_reset(), Err(Tg3Error::PhyBusy));
    }

    #[test]
    fn phy_reset_waits_for_self_clear() {
        let (sim, mut dev) = testutil::device();
        assert_eq!(dev.phy_reset(), Ok(()));
        assert_eq!(sim.state().phy[MII_BMCR as usize] as u32 & BMCR_RESET, 0);
        assert_eq!(sim.delays().count(40), 1);
    }

    fn copper_link_up(sim: &crate::driver::tg3::sim::Sim, lpa: u32) {
        let mut s = sim.state_mut();
        s.phy[MII_BMSR as usize] = BMSR_LSTATUS as u16;
        s.phy[MII_TG3_AUX_STAT as usize] = MII_TG3_AUX_STAT_1000FULL as u16;
        s.phy[MII_BMCR as usize] = BMCR_ANENABLE as u16;
        s.phy[MII_TG3_CTRL as usize] =
            (MII_TG3_CTRL_ADV_1000_HALF | MII_TG3_CTRL_ADV_1000_FULL) as u16;
        s.phy[MII_ADVERTISE as usize] = (ADVERTISE_CSMA | ADVERTISE_PAUSE_CAP) as u16;
        s.phy[MII_LPA as usize] = lpa as u16;
    }

    #[test]
    fn stalled_aux_status_read_fails_setup() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;
        copper_link_up(&sim, LPA_PAUSE_CAP);
        sim.state_mut().mii_stuck_reg = Some(MII_TG3_AUX_STAT);
        let before = sim.delays().count(10);

        assert_eq!(dev.setup_phy(), Err(Tg3Error::PhyBusy));
        assert!(!dev.carrier_ok());
        // One stalled frame; the aux status wait stops on the error.
        assert_eq!(sim.delays().count(10) - before, PHY_BUSY_LOOPS as u64);
    }

    #[test]
    fn empty_aux_status_leaves_speed_unresolved() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;
        copper_link_up(&sim, LPA_PAUSE_CAP);
        sim.state_mut().phy[MII_TG3_AUX_STAT as usize] = 0;

        assert_eq!(dev.setup_phy(), Ok(()));
        assert_eq!(dev.link.active_speed, None);
        assert_eq!(dev.link.active_duplex, None);
        assert!(sim.delays().count(10) >= 2000);
    }

    #[test]
    fn copper_gigabit_link_resolves_pause() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;
        copper_link_up(&sim, LPA_PAUSE_CAP);

        assert_eq!(dev.setup_phy(), Ok(()));
        assert!(dev.carrier_ok());
        assert_eq!(dev.link.active_speed, Some(LinkSpeed::Speed1000));
        assert_eq!(dev.link.active_duplex, Some(Duplex::Full));
        assert!(dev.flags.contains(Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE));
        assert_eq!(dev.stats.link_changes, 1);

        let s = sim.state();
        assert_eq!(s.reg_writes(MAC_RX_MODE), vec![RX_MODE_FLOW_CTRL_ENABLE]);
        assert_eq!(s.reg_writes(MAC_TX_MODE), vec![TX_MODE_FLOW_CTRL_ENABLE]);
        let mac_mode = s.reg(MAC_MODE);
        assert_eq!(mac_mode & MAC_MODE_PORT_MODE_MASK, MAC_MODE_PORT_MODE_GMII);
        assert_ne!(mac_mode & MAC_MODE_LINK_POLARITY, 0);
        assert_eq!(mac_mode & MAC_MODE_HALF_DUPLEX, 0);
        assert_eq!(s.reg(MAC_TX_LENGTHS), 2 << 12 | 6 << 8 | 32);
        // No renegotiation while the link is good.
        assert_eq!(s.phy[MII_BMCR as usize] as u32, BMCR_ANENABLE);
    }

    #[test]
    fn flow_control_disabled_in_config_resolves_nothing() {
        let config = crate::driver::tg3::Tg3Config { flow_control: false, ..Default::default() };
        let (sim, mut dev) = testutil::device_with(config);
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;
        copper_link_up(&sim, LPA_PAUSE_CAP);

        assert_eq!(dev.setup_phy(), Ok(()));
        assert!(dev.carrier_ok());
        assert!(!dev.flags.intersects(Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE));
        assert!(sim.state().reg_writes(MAC_RX_MODE).is_empty());
    }

    #[test]
    fn copper_link_down_restarts_autoneg() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;

        assert_eq!(dev.setup_phy(), Ok(()));
        assert!(!dev.carrier_ok());
        assert_eq!(dev.stats.link_changes, 0);

        let s = sim.state();
        assert_eq!(
            s.phy[MII_ADVERTISE as usize] as u32,
            ADVERTISE_CSMA
                | ADVERTISE_PAUSE_CAP
                | ADVERTISE_10HALF
                | ADVERTISE_10FULL
                | ADVERTISE_100HALF
                | ADVERTISE_100FULL
        );
        assert_eq!(
            s.phy[MII_TG3_CTRL as usize] as u32,
            MII_TG3_CTRL_ADV_1000_HALF | MII_TG3_CTRL_ADV_1000_FULL
        );
        assert_eq!(s.phy[MII_BMCR as usize] as u32, BMCR_ANENABLE | BMCR_ANRESTART);
        assert_eq!(s.reg(MAC_MODE) & MAC_MODE_LINK_POLARITY, 0);
    }

    #[test]
    fn forced_speed_narrows_copper_advertisement() {
        let link = LinkConfig {
            autoneg: false,
            speed: Some(LinkSpeed::Speed100),
            duplex: Some(Duplex::Full),
            ..LinkConfig::default()
        };
        let config = crate::driver::tg3::Tg3Config { link, ..Default::default() };
        let (sim, mut dev) = testutil::device_with(config);
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;

        assert_eq!(dev.setup_phy(), Ok(()));
        let s = sim.state();
        assert_eq!(
            s.phy[MII_ADVERTISE as usize] as u32,
            ADVERTISE_CSMA | ADVERTISE_PAUSE_CAP | ADVERTISE_100FULL
        );
        assert_eq!(s.phy[MII_TG3_CTRL as usize], 0);
    }

    #[test]
    fn half_duplex_gigabit_uses_long_slot_time() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.phy_id = PHY_ID_BCM5704;
        copper_link_up(&sim, 0);
        sim.state_mut().phy[MII_TG3_AUX_STAT as usize] = MII_TG3_AUX_STAT_1000HALF as u16;

        assert_eq!(dev.setup_phy(), Ok(()));
        assert!(dev.carrier_ok());
        let s = sim.state();
        assert_ne!(s.reg(MAC_MODE) & MAC_MODE_HALF_DUPLEX, 0);
        assert_eq!(s.reg(MAC_TX_LENGTHS), 2 << 12 | 6 << 8 | 0xff);
    }

    #[test]
    fn phy_id_prefers_readable_registers() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.subsystem_vendor = PCI_VENDOR_ID_3COM;
        dev.chip.subsystem_device = 0x1004;
        {
            let mut s = sim.state_mut();
            s.phy[MII_PHYSID1 as usize] = 0x0020;
            s.phy[MII_PHYSID2 as usize] = 0x6190;
        }
        assert_eq!(dev.phy_probe(), Ok(()));
        assert_eq!(dev.chip.phy_id, 0x6000_8190);
        assert_eq!(dev.chip.led_mode, LedMode::ThreeLink);
        assert_eq!(dev.link.advertising, Advertising::COPPER_ALL);
        // WireSpeed enable.
        assert_eq!(sim.state().phy[MII_TG3_AUX_CTRL as usize], 0x7007 | 0x8010);
    }

    #[test]
    fn phy_id_falls_back_to_board_table() {
        let (_sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.subsystem_vendor = PCI_VENDOR_ID_3COM;
        dev.chip.subsystem_device = 0x1004;
        assert_eq!(dev.phy_probe(), Ok(()));
        assert!(dev.chip.is_serdes());
        assert_eq!(dev.link.advertising, Advertising::FIBRE_ALL);
        assert_eq!(dev.phy_name(), "serdes");
    }

    #[test]
    fn phy_id_uses_bootcode_config_last() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5703_A2;
        {
            let mut s = sim.state_mut();
            s.set_sram(NIC_SRAM_DATA_SIG, NIC_SRAM_DATA_SIG_MAGIC);
            s.set_sram(
                NIC_SRAM_DATA_CFG,
                NIC_SRAM_DATA_CFG_LED_LINK_SPD
                    | NIC_SRAM_DATA_CFG_ASF_ENABLE
                    | NIC_SRAM_DATA_CFG_EEPROM_WP,
            );
            s.set_sram(NIC_SRAM_DATA_PHY_ID, 0x0020_6160);
        }
        assert_eq!(dev.phy_probe(), Ok(()));
        assert_eq!(dev.chip.phy_id & PHY_ID_MASK, PHY_ID_BCM5703);
        assert_eq!(dev.chip.led_mode, LedMode::Link10);
        assert!(dev.flags.contains(Tg3Flags::ENABLE_ASF | Tg3Flags::EEPROM_WRITE_PROT));
    }

    #[test]
    fn missing_phy_id_is_unsupported() {
        let (_sim, mut dev) = testutil::device();
        assert_eq!(dev.phy_probe(), Err(Tg3Error::UnsupportedPhy));
    }

    #[test]
    fn dell_boards_use_link10_leds() {
        let (_sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        dev.chip.subsystem_vendor = PCI_VENDOR_ID_DELL;
        dev.chip.subsystem_device = 0x0109;
        assert_eq!(dev.phy_probe(), Ok(()));
        assert_eq!(dev.chip.phy_id, PHY_ID_BCM5411);
        assert_eq!(dev.chip.led_mode, LedMode::Link10);
    }
}
