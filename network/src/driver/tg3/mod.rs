//! Broadcom Tigon3 (BCM570x) polled Ethernet driver.
//!
//! Supports the 5700/5701/5702/5703/5704 family with copper PHYs and the
//! TBI fiber port, driven entirely by polling: interrupts stay masked and
//! the status block is inspected from [`Tg3Device::poll_receive`].
//!
//! # Supported Devices
//! - BCM5700 / 5701 / 5702 / 5702FE / 5702X / 5703 / 5703X / 5704
//! - SysKonnect 9D21 (Tigon3 OEM)
//! - Altima AC1000 / AC9100
//!
//! # Layout
//! - [`hw`]: register, config-space and SRAM window access
//! - [`nvram`]: NVRAM / serial EEPROM reads, MAC and VPD lookup
//! - [`phy`], [`fiber`]: copper and TBI link bring-up
//! - [`init`]: reset, abort, halt and the full chip programming sequence
//! - [`rings`], [`rx`], [`tx`]: DMA descriptor rings and the data path
//! - [`probe`]: chip identification and attach
//! - [`driver`]: [`NetworkDriver`](crate::driver::traits::NetworkDriver) façade
//!
//! # Reference
//! Broadcom BCM570X Programmer's Reference Guide (570X-PG104-R)

pub mod driver;
pub mod error;
pub mod fiber;
pub mod hw;
pub mod init;
pub mod nvram;
pub mod phy;
pub mod probe;
pub mod regs;
pub mod rings;
pub mod rx;
pub mod tx;

#[cfg(test)]
pub(crate) mod sim;

pub use driver::Tg3Driver;
pub use error::{Result, Tg3Error, WaitSite};
pub use hw::{MmioBus, Tg3Bus, Tg3Regs};
pub use nvram::PartNumber;
pub use probe::{is_supported_device, TG3_PCI_IDS};
pub use rings::{DmaMap, RingMemory};

use bitflags::bitflags;

use self::hw::PCI_SAVED_DWORDS;
use self::regs::*;
use self::rings::RingSet;
use crate::time::Delay;
use crate::types::MacAddress;

// ═══════════════════════════════════════════════════════════════════════════
// FLAGS
// ═══════════════════════════════════════════════════════════════════════════

bitflags! {
    /// Chip and driver state bits discovered at probe or set at runtime.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Tg3Flags: u32 {
        /// Bus is running PCI-X.
        const PCIX_MODE          = 1 << 0;
        /// 66MHz PCI or 133MHz PCI-X.
        const PCI_HIGH_SPEED     = 1 << 1;
        /// 32-bit slot.
        const PCI_32BIT          = 1 << 2;
        /// Board has NVRAM (5702 and later) rather than a serial EEPROM.
        const NVRAM              = 1 << 3;
        /// NVRAM is a buffered flash part.
        const NVRAM_BUFFERED     = 1 << 4;
        /// Management firmware (ASF) is running on the NIC.
        const ENABLE_ASF         = 1 << 5;
        /// EEPROM is write protected.
        const EEPROM_WRITE_PROT  = 1 << 6;
        /// Fiber port can wake on LAN.
        const SERDES_WOL_CAP     = 1 << 7;
        /// 5704 split transaction mode.
        const SPLIT_MODE         = 1 << 8;
        /// Board cannot do gigabit.
        const TEN_100_ONLY       = 1 << 9;
        /// Link changes are signalled through the PHY interrupt.
        const USE_MI_INTERRUPT   = 1 << 10;
        /// Link changes are read from MAC_STATUS rather than the status block.
        const USE_LINKCHG_REG    = 1 << 11;
        /// Fiber link is polled.
        const POLL_SERDES        = 1 << 12;
        /// `init_hw` has completed at least once.
        const INIT_COMPLETE      = 1 << 13;
        /// Fiber flow control already negotiated.
        const GOT_SERDES_FLOWCTL = 1 << 14;
        /// Honour received pause frames.
        const RX_PAUSE           = 1 << 15;
        /// Send pause frames.
        const TX_PAUSE           = 1 << 16;
    }
}

bitflags! {
    /// Link modes offered during autonegotiation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Advertising: u32 {
        const HALF_10   = 1 << 0;
        const FULL_10   = 1 << 1;
        const HALF_100  = 1 << 2;
        const FULL_100  = 1 << 3;
        const HALF_1000 = 1 << 4;
        const FULL_1000 = 1 << 5;
        const AUTONEG   = 1 << 6;
        const MII       = 1 << 7;
        const FIBRE     = 1 << 8;

        const GIGABIT = Self::HALF_1000.bits() | Self::FULL_1000.bits();
    }
}

impl Advertising {
    /// Every copper mode plus autoneg over MII.
    pub const COPPER_ALL: Self = Self::HALF_10
        .union(Self::FULL_10)
        .union(Self::HALF_100)
        .union(Self::FULL_100)
        .union(Self::GIGABIT)
        .union(Self::AUTONEG)
        .union(Self::MII);

    /// Gigabit over fiber.
    pub const FIBRE_ALL: Self = Self::GIGABIT.union(Self::AUTONEG).union(Self::FIBRE);
}

// ═══════════════════════════════════════════════════════════════════════════
// LINK STATE
// ═══════════════════════════════════════════════════════════════════════════

/// Link speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSpeed {
    /// 10 Mbps.
    Speed10,
    /// 100 Mbps.
    Speed100,
    /// 1000 Mbps.
    Speed1000,
}

impl LinkSpeed {
    /// Speed in Mbps.
    pub fn mbps(&self) -> u32 {
        match self {
            LinkSpeed::Speed10 => 10,
            LinkSpeed::Speed100 => 100,
            LinkSpeed::Speed1000 => 1000,
        }
    }
}

/// Link duplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duplex {
    Half,
    Full,
}

/// Requested and negotiated link parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Modes offered to the partner.
    pub advertising: Advertising,
    /// Negotiate rather than force.
    pub autoneg: bool,
    /// Forced speed when `autoneg` is off.
    pub speed: Option<LinkSpeed>,
    /// Forced duplex when `autoneg` is off.
    pub duplex: Option<Duplex>,
    /// Speed the link came up at.
    pub active_speed: Option<LinkSpeed>,
    /// Duplex the link came up at.
    pub active_duplex: Option<Duplex>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            advertising: Advertising::COPPER_ALL,
            autoneg: true,
            speed: None,
            duplex: None,
            active_speed: None,
            active_duplex: None,
        }
    }
}

impl LinkConfig {
    /// Advertisement actually sent: the configured set, narrowed to the
    /// forced mode when autoneg is off.
    pub fn effective_advertising(&self) -> Advertising {
        if self.autoneg {
            return self.advertising;
        }
        let full = self.duplex != Some(Duplex::Half);
        let mode = match (self.speed, full) {
            (Some(LinkSpeed::Speed10), false) => Advertising::HALF_10,
            (Some(LinkSpeed::Speed10), true) => Advertising::FULL_10,
            (Some(LinkSpeed::Speed100), false) => Advertising::HALF_100,
            (Some(LinkSpeed::Speed100), true) => Advertising::FULL_100,
            (Some(LinkSpeed::Speed1000), false) => Advertising::HALF_1000,
            (Some(LinkSpeed::Speed1000), true) => Advertising::FULL_1000,
            (None, _) => return self.advertising,
        };
        (self.advertising & !Self::speed_modes()) | mode
    }

    fn speed_modes() -> Advertising {
        Advertising::HALF_10
            | Advertising::FULL_10
            | Advertising::HALF_100
            | Advertising::FULL_100
            | Advertising::GIGABIT
    }
}

/// LED wiring chosen by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    Auto,
    ThreeLink,
    Link10,
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Buffer manager watermarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufMgrConfig {
    pub mbuf_read_dma_low_water: u32,
    pub mbuf_mac_rx_low_water: u32,
    pub mbuf_high_water: u32,
    pub dma_low_water: u32,
    pub dma_high_water: u32,
}

impl Default for BufMgrConfig {
    fn default() -> Self {
        Self {
            mbuf_read_dma_low_water: DEFAULT_MB_RDMA_LOW_WATER,
            mbuf_mac_rx_low_water: DEFAULT_MB_MACRX_LOW_WATER,
            mbuf_high_water: DEFAULT_MB_HIGH_WATER,
            dma_low_water: DEFAULT_DMA_LOW_WATER,
            dma_high_water: DEFAULT_DMA_HIGH_WATER,
        }
    }
}

/// Tigon3 driver configuration.
#[derive(Debug, Clone, Copy)]
pub struct Tg3Config {
    /// CPU to bus address translation for the ring arena.
    pub dma: DmaMap,
    /// TSC frequency for delays (Hz).
    pub tsc_freq: u64,
    /// How long attach waits for carrier (ms).
    pub link_wait_ms: u32,
    /// RX buffers handed to the chip at reset.
    pub rx_pending: u32,
    /// Resolve pause frames from the autonegotiation result.
    pub flow_control: bool,
    /// Link advertisement / forced mode.
    pub link: LinkConfig,
    /// Run the DMA engine self-test on 5700/5701 parts.
    pub test_dma: bool,
    /// Buffer manager watermarks.
    pub bufmgr: BufMgrConfig,
}

impl Default for Tg3Config {
    fn default() -> Self {
        Self {
            dma: DmaMap::IDENTITY,
            tsc_freq: 2_500_000_000,
            link_wait_ms: 3000,
            rx_pending: rings::DEF_RX_RING_PENDING,
            flow_control: true,
            link: LinkConfig::default(),
            test_dma: true,
            bufmgr: BufMgrConfig::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DEVICE CONTEXT
// ═══════════════════════════════════════════════════════════════════════════

/// Values read from the chip at probe time.
#[derive(Debug, Clone, Copy)]
pub struct ChipInfo {
    /// Upper half of MISC_HOST_CTRL.
    pub chip_rev_id: u32,
    /// Config offset of the power-management capability.
    pub pm_cap: u8,
    pub subsystem_vendor: u16,
    pub subsystem_device: u16,
    pub pci_cacheline_sz: u8,
    pub pci_lat_timer: u8,
    /// Config header snapshot restored after a core clock reset.
    pub pci_cfg_state: [u32; PCI_SAVED_DWORDS],
    /// DMA read/write control chosen by the DMA test.
    pub dma_rwctrl: u32,
    /// Extra host coalescing mode bits.
    pub coalesce_mode: u32,
    pub split_mode_max_reqs: u32,
    pub phy_id: u32,
    pub led_mode: LedMode,
}

impl ChipInfo {
    fn new() -> Self {
        Self {
            chip_rev_id: 0,
            pm_cap: 0,
            subsystem_vendor: 0,
            subsystem_device: 0,
            pci_cacheline_sz: 0,
            pci_lat_timer: 0,
            pci_cfg_state: [0; PCI_SAVED_DWORDS],
            dma_rwctrl: 0,
            coalesce_mode: 0,
            split_mode_max_reqs: 0,
            phy_id: PHY_ID_INVALID,
            led_mode: LedMode::Auto,
        }
    }

    /// ASIC family (5700, 5701, ...).
    #[inline]
    pub fn asic_rev(&self) -> u32 {
        self.chip_rev_id >> 12
    }

    /// Major stepping within the family.
    #[inline]
    pub fn chip_rev(&self) -> u32 {
        self.chip_rev_id >> 8
    }

    #[inline]
    pub fn is_serdes(&self) -> bool {
        self.phy_id == PHY_ID_SERDES
    }

    /// 5701 A0/B0 need the CRC and advertisement fixes.
    #[inline]
    pub fn is_5701_a0_b0(&self) -> bool {
        self.chip_rev_id == CHIPREV_ID_5701_A0 || self.chip_rev_id == CHIPREV_ID_5701_B0
    }
}

/// Last value written to each mode register.
///
/// The hardware is only read back inside explicit read-modify-write
/// sequences; everywhere else these are the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    pub misc_host_ctrl: u32,
    pub grc_mode: u32,
    pub grc_local_ctrl: u32,
    pub mac_mode: u32,
    pub rx_mode: u32,
    pub tx_mode: u32,
    pub mi_mode: u32,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            misc_host_ctrl: MISC_HOST_CTRL_MASK_PCI_INT
                | MISC_HOST_CTRL_WORD_SWAP
                | MISC_HOST_CTRL_INDIR_ACCESS
                | MISC_HOST_CTRL_PCISTATE_RW,
            grc_mode: GRC_MODE_WSWAP_DATA | GRC_MODE_BSWAP_DATA | GRC_MODE_WSWAP_NONFRM_DATA,
            grc_local_ctrl: 0,
            mac_mode: 0,
            rx_mode: 0,
            tx_mode: 0,
            mi_mode: MAC_MI_MODE_BASE,
        }
    }
}

/// Where the chip is in its bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipState {
    /// Nothing programmed yet.
    Cold,
    /// Forced into D0.
    PowerOn,
    /// Core clock off the 44MHz/alternate source.
    ClockSwitched,
    /// Core clock reset issued.
    Reset,
    /// Bootcode acknowledged the mailbox magic.
    FirmwareHandshake,
    /// Fully programmed, rings live.
    Ready,
    /// Stopped by `halt`.
    Halted,
}

/// Software counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_timeouts: u64,
    pub recoveries: u64,
    pub link_changes: u64,
}

/// One Tigon3 adapter.
///
/// Owns the register bus, the ring arena and every piece of mirrored
/// chip state. All methods take `&mut self`; there is no internal
/// locking.
pub struct Tg3Device<B: Tg3Bus, D: Delay> {
    pub(crate) regs: Tg3Regs<B, D>,
    pub(crate) config: Tg3Config,
    pub(crate) chip: ChipInfo,
    pub(crate) modes: ModeState,
    pub(crate) flags: Tg3Flags,
    pub(crate) link: LinkConfig,
    pub(crate) carrier_ok: bool,
    pub(crate) bufmgr: BufMgrConfig,
    pub(crate) rings: RingSet,
    pub(crate) mac: MacAddress,
    pub(crate) part_number: PartNumber,
    pub(crate) stats: DriverStats,
    pub(crate) state: ChipState,
}

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    /// Build an unprogrammed device around a bus and a ring arena.
    ///
    /// Nothing is written to the chip; see [`Tg3Device::probe`].
    pub fn new(bus: B, delay: D, memory: &'static mut RingMemory, config: Tg3Config) -> Self {
        let rings = RingSet::new(memory, config.dma, config.rx_pending);
        Self {
            regs: Tg3Regs::new(bus, delay),
            chip: ChipInfo::new(),
            modes: ModeState::default(),
            flags: Tg3Flags::empty(),
            link: config.link,
            carrier_ok: false,
            bufmgr: config.bufmgr,
            rings,
            mac: [0; 6],
            part_number: PartNumber::none(),
            stats: DriverStats::default(),
            state: ChipState::Cold,
            config,
        }
    }

    /// Station address.
    #[inline]
    pub fn mac_address(&self) -> MacAddress {
        self.mac
    }

    #[inline]
    pub fn carrier_ok(&self) -> bool {
        self.carrier_ok
    }

    #[inline]
    pub fn link_config(&self) -> &LinkConfig {
        &self.link
    }

    #[inline]
    pub fn chip(&self) -> &ChipInfo {
        &self.chip
    }

    #[inline]
    pub fn flags(&self) -> Tg3Flags {
        self.flags
    }

    #[inline]
    pub fn modes(&self) -> &ModeState {
        &self.modes
    }

    #[inline]
    pub fn state(&self) -> ChipState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    /// Board part number from VPD, or `"none"`.
    #[inline]
    pub fn part_number(&self) -> &str {
        self.part_number.as_str()
    }

    /// Human-readable PHY name.
    pub fn phy_name(&self) -> &'static str {
        phy::phy_string(self.chip.phy_id)
    }

    /// Mutable access to the raw register layer.
    #[inline]
    pub fn regs(&mut self) -> &mut Tg3Regs<B, D> {
        &mut self.regs
    }
}

impl<B: Tg3Bus, D: Delay> Delay for Tg3Device<B, D> {
    #[inline]
    fn udelay(&mut self, us: u32) {
        self.regs.udelay(us)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::sim::{Sim, SimBus, SimDelay};
    use super::*;

    /// Unprobed device on a fresh simulator.
    pub fn device() -> (Sim, Tg3Device<SimBus, SimDelay>) {
        device_with(Tg3Config::default())
    }

    pub fn device_with(config: Tg3Config) -> (Sim, Tg3Device<SimBus, SimDelay>) {
        let sim = Sim::new();
        let dev = Tg3Device::new(sim.bus(), sim.delay(), RingMemory::leak_zeroed(), config);
        (sim, dev)
    }

    /// 5704 fiber board whose partner answers autonegotiation, with
    /// 00:10:18:2a:3b:4c in the bootcode mailbox.
    pub fn fiber_board(sim: &Sim) {
        let mut s = sim.state_mut();
        s.set_sram(NIC_SRAM_DATA_SIG, NIC_SRAM_DATA_SIG_MAGIC);
        s.set_sram(NIC_SRAM_DATA_CFG, NIC_SRAM_DATA_CFG_PHY_TYPE_FIBER);
        s.set_sram(
            NIC_SRAM_MAC_ADDR_HIGH_MBOX,
            NIC_SRAM_MAC_ADDR_SIGNATURE << 16 | 0x0010,
        );
        s.set_sram(NIC_SRAM_MAC_ADDR_LOW_MBOX, 0x182a_3b4c);
        s.pin(MAC_STATUS, MAC_STATUS_PCS_SYNCED | MAC_STATUS_RCVD_CFG);
        s.pin(MAC_RX_AUTO_NEG, 0x0000_a040);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_helpers_split_chip_rev_id() {
        let (_sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        assert_eq!(dev.chip.asic_rev(), ASIC_REV_5704);
        assert_eq!(dev.chip.chip_rev(), 0x20);
        dev.chip.chip_rev_id = 0x7102;
        assert_eq!(dev.chip.chip_rev(), CHIPREV_5700_BX);
    }

    #[test]
    fn forced_mode_narrows_advertisement() {
        let link = LinkConfig {
            autoneg: false,
            speed: Some(LinkSpeed::Speed100),
            duplex: Some(Duplex::Full),
            ..LinkConfig::default()
        };
        let adv = link.effective_advertising();
        assert_eq!(
            adv & (Advertising::GIGABIT | Advertising::HALF_100 | Advertising::FULL_10),
            Advertising::empty()
        );
        assert!(adv.contains(Advertising::FULL_100 | Advertising::MII));
        assert_eq!(LinkConfig::default().effective_advertising(), Advertising::COPPER_ALL);
    }

    #[test]
    fn new_device_is_cold_with_default_state() {
        let (_sim, dev) = testutil::device();
        assert_eq!(dev.state(), ChipState::Cold);
        assert!(!dev.carrier_ok());
        assert_eq!(dev.modes().mi_mode, MAC_MI_MODE_BASE);
        assert_ne!(dev.modes().misc_host_ctrl & MISC_HOST_CTRL_INDIR_ACCESS, 0);
        assert_eq!(dev.part_number(), "none");
        assert_eq!(dev.phy_name(), "unknown");
    }
}
