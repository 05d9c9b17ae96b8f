//! 1000BASE-X link bring-up on the TBI port.
//!
//! The Tigon3 MAC has no hardware autonegotiation for fiber, so the
//! Clause 37 arbitration is run in software: [`AnegSession::step`] is
//! called once per microsecond tick with the configuration word the MAC
//! last received, and returns the register writes the caller must make.
//! The session itself never touches hardware.
//!
//! Next-page exchange is not supported; a partner that insists on one
//! fails negotiation.
//!
//! # Reference
//! IEEE 802.3 Clause 37 (1000BASE-X autonegotiation), figure 37-6

use core::fmt;

use bitflags::bitflags;
use log::{debug, trace, warn};

use super::error::Result;
use super::hw::Tg3Bus;
use super::regs::*;
use super::rings::StatusFlags;
use super::{Duplex, LinkSpeed, Tg3Device, Tg3Flags};
use crate::time::Delay;

/// Ticks `Restart`, `CompleteAck` and `IdleDetect` hold before advancing.
pub const ANEG_SETTLE_TICKS: u32 = 10_000;
/// Tick budget for one negotiation (1µs per tick).
pub const ANEG_MAX_TICKS: u32 = 195_000;

// Base page bits of the 16-bit configuration word.
pub const ANEG_CFG_NP: u32 = 0x0000_0080;
pub const ANEG_CFG_ACK: u32 = 0x0000_0040;
pub const ANEG_CFG_RF2: u32 = 0x0000_0020;
pub const ANEG_CFG_RF1: u32 = 0x0000_0010;
pub const ANEG_CFG_PS2: u32 = 0x0000_0001;
pub const ANEG_CFG_PS1: u32 = 0x0000_8000;
pub const ANEG_CFG_HD: u32 = 0x0000_4000;
pub const ANEG_CFG_FD: u32 = 0x0000_2000;
/// Reserved bits; a word with any of these set is malformed.
pub const ANEG_CFG_INVAL: u32 = 0x0000_1f06;
const ANEG_CFG_TOGGLE: u32 = 0x0000_0008;

bitflags! {
    /// Management register view of the arbitration (Clause 37 `mr_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MrFlags: u32 {
        const AN_ENABLE     = 0x0000_0001;
        const RESTART_AN    = 0x0000_0002;
        const AN_COMPLETE   = 0x0000_0004;
        const PAGE_RX       = 0x0000_0008;
        const NP_LOADED     = 0x0000_0010;
        const TOGGLE_TX     = 0x0000_0020;
        const LP_ADV_FULL_DUPLEX   = 0x0000_0040;
        const LP_ADV_HALF_DUPLEX   = 0x0000_0080;
        const LP_ADV_SYM_PAUSE     = 0x0000_0100;
        const LP_ADV_ASYM_PAUSE    = 0x0000_0200;
        const LP_ADV_REMOTE_FAULT1 = 0x0000_0400;
        const LP_ADV_REMOTE_FAULT2 = 0x0000_0800;
        const LP_ADV_NEXT_PAGE     = 0x0000_1000;
        const TOGGLE_RX     = 0x0000_2000;
        const NP_RX         = 0x0000_4000;
        const LINK_OK       = 0x8000_0000;

        const LP_ADV = Self::LP_ADV_FULL_DUPLEX.bits()
            | Self::LP_ADV_HALF_DUPLEX.bits()
            | Self::LP_ADV_SYM_PAUSE.bits()
            | Self::LP_ADV_ASYM_PAUSE.bits()
            | Self::LP_ADV_REMOTE_FAULT1.bits()
            | Self::LP_ADV_REMOTE_FAULT2.bits()
            | Self::LP_ADV_NEXT_PAGE.bits();
    }
}

/// Arbitration state (figure 37-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnegState {
    Unknown,
    AnEnable,
    RestartInit,
    Restart,
    DisableLinkOk,
    AbilityDetectInit,
    AbilityDetect,
    AckDetectInit,
    AckDetect,
    CompleteAckInit,
    CompleteAck,
    IdleDetectInit,
    IdleDetect,
    LinkOk,
    NextPageWaitInit,
    NextPageWait,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnegOutcome {
    /// Keep ticking.
    Continue,
    /// Keep ticking; a settle timer is running.
    TimerEnabled,
    /// Negotiation finished (link OK or administratively disabled).
    Done,
}

/// Register write the caller must make after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnegEffect {
    /// Load `MAC_TX_AUTO_NEG` with the word and start sending configs.
    TxConfig(u32),
    /// Stop sending configs.
    StopConfigs,
}

/// One tick's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnegStep {
    pub outcome: AnegOutcome,
    pub effect: Option<AnegEffect>,
}

/// Negotiation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnegError {
    /// Received word had reserved bits set.
    ReservedBits(u32),
    /// Partner asked for a next page exchange.
    NextPageUnsupported,
    /// Tick budget ran out before the arbitration finished.
    Incomplete(AnegState),
}

impl fmt::Display for AnegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnegError::ReservedBits(word) => write!(f, "malformed config word {:#06x}", word),
            AnegError::NextPageUnsupported => f.write_str("next page requested"),
            AnegError::Incomplete(state) => write!(f, "no result, stuck in {:?}", state),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ARBITRATION
// ═══════════════════════════════════════════════════════════════════════════

/// One software autonegotiation run.
#[derive(Debug, Clone)]
pub struct AnegSession {
    state: AnegState,
    flags: MrFlags,
    link_time: u32,
    cur_time: u32,
    ability_match_cfg: u32,
    ability_match_count: u32,
    ability_match: bool,
    idle_match: bool,
    ack_match: bool,
    txconfig: u32,
    rxconfig: u32,
}

impl AnegSession {
    pub fn new(flags: MrFlags) -> Self {
        Self {
            state: AnegState::Unknown,
            flags,
            link_time: 0,
            cur_time: 0,
            ability_match_cfg: 0,
            ability_match_count: 0,
            ability_match: false,
            idle_match: false,
            ack_match: false,
            txconfig: 0,
            rxconfig: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> AnegState {
        self.state
    }

    #[inline]
    pub fn flags(&self) -> MrFlags {
        self.flags
    }

    /// Word currently being transmitted.
    #[inline]
    pub fn txconfig(&self) -> u32 {
        self.txconfig
    }

    /// Two consecutive identical words have been received.
    #[inline]
    pub fn ability_match(&self) -> bool {
        self.ability_match
    }

    /// No config word was received on the last tick.
    #[inline]
    pub fn idle_match(&self) -> bool {
        self.idle_match
    }

    fn clear_matches(&mut self) {
        self.ability_match_cfg = 0;
        self.ability_match_count = 0;
        self.ability_match = false;
        self.idle_match = false;
        self.ack_match = false;
    }

    fn settled(&self) -> bool {
        self.cur_time.wrapping_sub(self.link_time) > ANEG_SETTLE_TICKS
    }

    fn sample(&mut self, rx: Option<u32>) {
        match rx {
            Some(word) => {
                if word != self.ability_match_cfg {
                    self.ability_match_cfg = word;
                    self.ability_match = false;
                    self.ability_match_count = 0;
                } else {
                    self.ability_match_count += 1;
                    if self.ability_match_count > 1 {
                        self.ability_match = true;
                    }
                }
                self.ack_match = word & ANEG_CFG_ACK != 0;
                self.idle_match = false;
            }
            None => {
                self.idle_match = true;
                self.ability_match_cfg = 0;
                self.ability_match_count = 0;
                self.ability_match = false;
                self.ack_match = false;
            }
        }
        self.rxconfig = rx.unwrap_or(0);
    }

    /// Advance one tick.
    ///
    /// `rx` is the received configuration word, or `None` when the MAC
    /// saw no config ordered sets since the last tick.
    pub fn step(&mut self, rx: Option<u32>) -> core::result::Result<AnegStep, AnegError> {
        if self.state == AnegState::Unknown {
            self.rxconfig = 0;
            self.link_time = 0;
            self.cur_time = 0;
            self.clear_matches();
        }
        self.cur_time = self.cur_time.wrapping_add(1);

        if let Some(word) = rx {
            if word & ANEG_CFG_INVAL != 0 {
                return Err(AnegError::ReservedBits(word));
            }
        }
        self.sample(rx);

        let mut outcome = AnegOutcome::Continue;
        let mut effect = None;

        match self.state {
            AnegState::Unknown | AnegState::AnEnable => {
                self.flags.remove(MrFlags::AN_COMPLETE | MrFlags::PAGE_RX);
                if self.flags.contains(MrFlags::AN_ENABLE) {
                    self.link_time = 0;
                    self.cur_time = 0;
                    self.clear_matches();
                    self.state = AnegState::RestartInit;
                } else {
                    self.state = AnegState::DisableLinkOk;
                }
            }

            AnegState::RestartInit | AnegState::Restart => {
                if self.state == AnegState::RestartInit {
                    self.link_time = self.cur_time;
                    self.flags.remove(MrFlags::NP_LOADED);
                    self.txconfig = 0;
                    effect = Some(AnegEffect::TxConfig(0));
                    self.state = AnegState::Restart;
                }
                if self.settled() {
                    self.state = AnegState::AbilityDetectInit;
                } else {
                    outcome = AnegOutcome::TimerEnabled;
                }
            }

            AnegState::DisableLinkOk => outcome = AnegOutcome::Done,

            AnegState::AbilityDetectInit => {
                self.flags.remove(MrFlags::TOGGLE_TX);
                self.txconfig = ANEG_CFG_FD | ANEG_CFG_PS1;
                effect = Some(AnegEffect::TxConfig(self.txconfig));
                self.state = AnegState::AbilityDetect;
            }

            AnegState::AbilityDetect => {
                if self.ability_match && self.rxconfig != 0 {
                    self.state = AnegState::AckDetectInit;
                }
            }

            AnegState::AckDetectInit | AnegState::AckDetect => {
                if self.state == AnegState::AckDetectInit {
                    self.txconfig |= ANEG_CFG_ACK;
                    effect = Some(AnegEffect::TxConfig(self.txconfig));
                    self.state = AnegState::AckDetect;
                }
                if self.ack_match {
                    self.state = if self.rxconfig & !ANEG_CFG_ACK
                        == self.ability_match_cfg & !ANEG_CFG_ACK
                    {
                        AnegState::CompleteAckInit
                    } else {
                        AnegState::AnEnable
                    };
                } else if self.ability_match && self.rxconfig == 0 {
                    self.state = AnegState::AnEnable;
                }
            }

            AnegState::CompleteAckInit => {
                self.latch_partner();
                self.link_time = self.cur_time;
                self.state = AnegState::CompleteAck;
                outcome = AnegOutcome::TimerEnabled;
            }

            AnegState::CompleteAck => {
                if self.ability_match && self.rxconfig == 0 {
                    self.state = AnegState::AnEnable;
                } else if self.settled() {
                    let next_page = self.flags.contains(MrFlags::LP_ADV_NEXT_PAGE)
                        && (self.txconfig & ANEG_CFG_NP != 0
                            || self.flags.contains(MrFlags::NP_RX));
                    if next_page {
                        return Err(AnegError::NextPageUnsupported);
                    }
                    self.state = AnegState::IdleDetectInit;
                }
            }

            AnegState::IdleDetectInit => {
                self.link_time = self.cur_time;
                effect = Some(AnegEffect::StopConfigs);
                self.state = AnegState::IdleDetect;
                outcome = AnegOutcome::TimerEnabled;
            }

            AnegState::IdleDetect => {
                if self.ability_match && self.rxconfig == 0 {
                    self.state = AnegState::AnEnable;
                } else if self.settled() {
                    self.state = AnegState::LinkOk;
                }
            }

            AnegState::LinkOk => {
                self.flags |= MrFlags::AN_COMPLETE | MrFlags::LINK_OK;
                outcome = AnegOutcome::Done;
            }

            AnegState::NextPageWaitInit | AnegState::NextPageWait => {}
        }

        Ok(AnegStep { outcome, effect })
    }

    /// Record the partner's base page.
    fn latch_partner(&mut self) {
        let rx = self.rxconfig;
        self.flags.remove(MrFlags::LP_ADV | MrFlags::TOGGLE_RX | MrFlags::NP_RX);
        for &(bit, flag) in &[
            (ANEG_CFG_FD, MrFlags::LP_ADV_FULL_DUPLEX),
            (ANEG_CFG_HD, MrFlags::LP_ADV_HALF_DUPLEX),
            (ANEG_CFG_PS1, MrFlags::LP_ADV_SYM_PAUSE),
            (ANEG_CFG_PS2, MrFlags::LP_ADV_ASYM_PAUSE),
            (ANEG_CFG_RF1, MrFlags::LP_ADV_REMOTE_FAULT1),
            (ANEG_CFG_RF2, MrFlags::LP_ADV_REMOTE_FAULT2),
            (ANEG_CFG_NP, MrFlags::LP_ADV_NEXT_PAGE | MrFlags::NP_RX),
            (ANEG_CFG_TOGGLE, MrFlags::TOGGLE_RX),
        ] {
            if rx & bit != 0 {
                self.flags |= flag;
            }
        }
        self.flags.toggle(MrFlags::TOGGLE_TX);
        self.flags |= MrFlags::PAGE_RX;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TBI LINK SETUP
// ═══════════════════════════════════════════════════════════════════════════

const MAC_STATUS_CHANGED: u32 = MAC_STATUS_SYNC_CHANGED | MAC_STATUS_CFG_CHANGED;

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    fn apply_aneg_effect(&mut self, effect: AnegEffect) {
        match effect {
            AnegEffect::TxConfig(word) => {
                self.regs.tw32(MAC_TX_AUTO_NEG, word);
                self.modes.mac_mode |= MAC_MODE_SEND_CONFIGS;
            }
            AnegEffect::StopConfigs => self.modes.mac_mode &= !MAC_MODE_SEND_CONFIGS,
        }
        self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);
    }

    /// Run the arbitration until it finishes or the tick budget runs out.
    fn fiber_autoneg(&mut self) -> core::result::Result<MrFlags, AnegError> {
        let mut session = AnegSession::new(MrFlags::AN_ENABLE);
        let mut tick = 1;
        while tick < ANEG_MAX_TICKS {
            let rx = if self.regs.tr32(MAC_STATUS) & MAC_STATUS_RCVD_CFG != 0 {
                Some(self.regs.tr32(MAC_RX_AUTO_NEG))
            } else {
                None
            };
            let step = session.step(rx)?;
            if let Some(effect) = step.effect {
                trace!("aneg: {:?} -> {:?}", session.state(), effect);
                self.apply_aneg_effect(effect);
            }
            if step.outcome == AnegOutcome::Done {
                return Ok(session.flags());
            }
            self.regs.udelay(1);
            tick += 1;
        }
        Err(AnegError::Incomplete(session.state()))
    }

    /// Ack latched sync/config change events, up to `tries` times.
    fn clear_mac_status_changes(&mut self, tries: u32) {
        for _ in 0..tries {
            self.regs.udelay(20);
            self.regs.tw32_carefully(MAC_STATUS, MAC_STATUS_CHANGED, 40);
            if self.regs.tr32(MAC_STATUS) & MAC_STATUS_CHANGED == 0 {
                break;
            }
        }
    }

    fn pcs_synced(&mut self) -> bool {
        self.regs.tr32(MAC_STATUS) & MAC_STATUS_PCS_SYNCED != 0
    }

    pub(crate) fn setup_fiber_phy(&mut self) -> Result<()> {
        let orig_pause = self.flags & (Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE);
        let orig_speed = self.link.active_speed;
        let orig_duplex = self.link.active_duplex;

        self.modes.mac_mode &= !(MAC_MODE_PORT_MODE_MASK | MAC_MODE_HALF_DUPLEX);
        self.modes.mac_mode |= MAC_MODE_PORT_MODE_TBI;
        self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);

        // Reset the SerDes on first init or while a link is present.
        if !self.flags.contains(Tg3Flags::INIT_COMPLETE) || self.pcs_synced() {
            self.reset_serdes()?;
        }

        let event = if self.flags.contains(Tg3Flags::POLL_SERDES) {
            0
        } else {
            MAC_EVENT_LNKSTATE_CHANGED
        };
        self.regs.tw32_carefully(MAC_EVENT, event, 40);

        let mut link_up = false;
        if self.pcs_synced() {
            if self.flags.contains(Tg3Flags::GOT_SERDES_FLOWCTL) {
                // Already negotiated; force 1000FD.
                link_up = true;
            } else {
                self.regs.tw32(MAC_TX_AUTO_NEG, 0);
                let gmii = self.modes.mac_mode & !MAC_MODE_PORT_MODE_MASK | MAC_MODE_PORT_MODE_GMII;
                self.regs.tw32_carefully(MAC_MODE, gmii, 40);
                self.regs
                    .tw32_carefully(MAC_MODE, self.modes.mac_mode | MAC_MODE_SEND_CONFIGS, 40);

                let result = self.fiber_autoneg();

                self.modes.mac_mode &= !MAC_MODE_SEND_CONFIGS;
                self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);

                match result {
                    Ok(mr)
                        if mr.intersects(
                            MrFlags::AN_COMPLETE | MrFlags::LINK_OK | MrFlags::LP_ADV_FULL_DUPLEX,
                        ) =>
                    {
                        let mut remote = 0;
                        if mr.contains(MrFlags::LP_ADV_SYM_PAUSE) {
                            remote |= LPA_PAUSE_CAP;
                        }
                        if mr.contains(MrFlags::LP_ADV_ASYM_PAUSE) {
                            remote |= LPA_PAUSE_ASYM;
                        }
                        self.setup_flow_control(ADVERTISE_PAUSE_CAP, remote);
                        self.flags |= Tg3Flags::GOT_SERDES_FLOWCTL;
                        link_up = true;
                    }
                    Ok(_) => {}
                    // Sync alone still brings the link up below.
                    Err(e @ AnegError::Incomplete(_)) => debug!("aneg: {}", e),
                    Err(e) => warn!("aneg: {}", e),
                }

                self.clear_mac_status_changes(60);
                if !link_up && self.pcs_synced() {
                    link_up = true;
                }
            }
        }

        self.modes.mac_mode &= !MAC_MODE_LINK_POLARITY;
        self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);

        let status = self.rings.status();
        self.rings
            .set_status(StatusFlags::UPDATED | (status - StatusFlags::LINK_CHG));

        self.clear_mac_status_changes(100);

        if !self.pcs_synced() {
            link_up = false;
        }

        if link_up {
            self.link.active_speed = Some(LinkSpeed::Speed1000);
            self.link.active_duplex = Some(Duplex::Full);
        } else {
            self.link.active_speed = None;
            self.link.active_duplex = None;
        }

        if link_up != self.carrier_ok {
            self.carrier_ok = link_up;
            self.stats.link_changes += 1;
            self.link_report();
        } else if orig_pause != self.flags & (Tg3Flags::RX_PAUSE | Tg3Flags::TX_PAUSE)
            || orig_speed != self.link.active_speed
            || orig_duplex != self.link.active_duplex
        {
            self.link_report();
        }

        if !self.pcs_synced() {
            self.regs
                .tw32_carefully(MAC_MODE, self.modes.mac_mode | MAC_MODE_LINK_POLARITY, 40);
            if self.flags.contains(Tg3Flags::INIT_COMPLETE) {
                self.regs.tw32_carefully(MAC_MODE, self.modes.mac_mode, 40);
            }
        }
        Ok(())
    }

    /// SerDes PLL and channel setup, ending with the channel register
    /// deselected so the PHY id reads normally.
    fn reset_serdes(&mut self) -> Result<()> {
        self.write_phy(0x16, 0x8007)?;
        self.write_phy(MII_BMCR, BMCR_RESET)?;
        for _ in 0..500 {
            self.regs.udelay(10);
        }

        self.write_phy(0x10, 0x8411)?;
        self.write_phy(0x11, 0x0a10)?;
        self.write_phy(0x18, 0x00a0)?;
        self.write_phy(0x16, 0x41ff)?;

        // Pulse POR.
        self.write_phy(0x13, 0x0400)?;
        self.regs.udelay(40);
        self.write_phy(0x13, 0x0000)?;

        self.write_phy(0x11, 0x0a50)?;
        self.regs.udelay(40);
        self.write_phy(0x11, 0x0a10)?;

        self.regs.mdelay(150);
        self.write_phy(0x10, 0x8011)
    }
}
