//! NVRAM and serial EEPROM access.
//!
//! 5700/5701 boards carry a serial EEPROM behind the GRC EEPROM state
//! machine; later parts use the NVRAM interface, optionally with a
//! buffered flash that pages at 264 bytes. [`Tg3Device::nvram_read`]
//! hides the difference.
//!
//! Two consumers read it: the MAC address lookup (mailbox, then NVRAM,
//! then the MAC address registers) and the VPD part number.
//!
//! # Reference
//! Broadcom BCM570X PRG §9 (NVRAM), PCI Local Bus 2.2 §6.4 (VPD)

use log::{debug, warn};
use smoltcp::wire::EthernetAddress;

use super::error::{Result, Tg3Error, WaitSite};
use super::hw::Tg3Bus;
use super::regs::*;
use super::{Tg3Device, Tg3Flags};
use crate::pci::PciConfig;
use crate::time::{poll_until, Delay};
use crate::types::MacAddress;

/// NVRAM offset of the VPD block.
pub const VPD_OFFSET: u32 = 0x100;
/// Bytes of VPD read.
pub const VPD_LEN: usize = 256;
/// MAC address in NVRAM for function 0.
pub const NVRAM_MAC_OFFSET_FN0: u32 = 0x7c;
/// MAC address in NVRAM for function 1.
pub const NVRAM_MAC_OFFSET_FN1: u32 = 0xcc;

const VPD_TAG_ID_STRING: u8 = 0x82;
const VPD_TAG_RO: u8 = 0x90;
const VPD_TAG_RW: u8 = 0x91;
const PART_NUMBER_MAX: usize = 24;

// ═══════════════════════════════════════════════════════════════════════════
// PART NUMBER
// ═══════════════════════════════════════════════════════════════════════════

/// Board part number from the VPD `PN` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartNumber {
    bytes: [u8; PART_NUMBER_MAX],
    len: u8,
}

impl PartNumber {
    /// Placeholder used when VPD has no part number.
    pub fn none() -> Self {
        let mut bytes = [0u8; PART_NUMBER_MAX];
        bytes[..4].copy_from_slice(b"none");
        Self { bytes, len: 4 }
    }

    fn from_bytes(src: &[u8]) -> Self {
        let mut bytes = [0u8; PART_NUMBER_MAX];
        let len = src.len().min(PART_NUMBER_MAX);
        bytes[..len].copy_from_slice(&src[..len]);
        Self { bytes, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("none")
    }
}

/// Find the `PN` keyword in a VPD image.
///
/// Identifier-string and read-write resources are skipped; the part
/// number must sit in the read-only resource that follows. Every length
/// is checked against the image, so a corrupt image ends the scan.
pub fn parse_part_number(vpd: &[u8; VPD_LEN]) -> Option<PartNumber> {
    let mut i = 0usize;
    while i + 3 <= VPD_LEN {
        let tag = vpd[i];
        let len = vpd[i + 1] as usize | (vpd[i + 2] as usize) << 8;
        if tag == VPD_TAG_ID_STRING || tag == VPD_TAG_RW {
            i += 3 + len;
            continue;
        }
        if tag != VPD_TAG_RO {
            return None;
        }

        let block_end = (i + 3 + len).min(VPD_LEN);
        i += 3;
        while i + 3 <= block_end {
            let kw_len = vpd[i + 2] as usize;
            if vpd[i] == b'P' && vpd[i + 1] == b'N' {
                if kw_len > PART_NUMBER_MAX || i + 3 + kw_len > VPD_LEN {
                    return None;
                }
                return Some(PartNumber::from_bytes(&vpd[i + 3..i + 3 + kw_len]));
            }
            i += 3 + kw_len;
        }
        return None;
    }
    None
}

/// Unicast and not all zeroes.
pub fn is_valid_mac(mac: &MacAddress) -> bool {
    EthernetAddress(*mac).is_unicast() && mac.iter().any(|&b| b != 0)
}

// ═══════════════════════════════════════════════════════════════════════════
// NVRAM / EEPROM
// ═══════════════════════════════════════════════════════════════════════════

impl<B: Tg3Bus, D: Delay> Tg3Device<B, D> {
    /// Reset the EEPROM state machine and pick the NVRAM access mode.
    pub(crate) fn nvram_init(&mut self) {
        self.regs.tw32(
            GRC_EEPROM_ADDR,
            EEPROM_ADDR_FSM_RESET | EEPROM_DEFAULT_CLOCK_PERIOD << EEPROM_ADDR_CLKPERD_SHIFT,
        );
        self.regs.mdelay(1);

        let lcl = self.regs.tr32(GRC_LOCAL_CTRL);
        self.regs
            .tw32_carefully(GRC_LOCAL_CTRL, lcl | GRC_LCLCTRL_AUTO_SEEPROM, 100);

        let asic = self.chip.asic_rev();
        if asic != ASIC_REV_5700 && asic != ASIC_REV_5701 {
            let mut nvcfg1 = self.regs.tr32(NVRAM_CFG1);
            self.flags |= Tg3Flags::NVRAM;
            if nvcfg1 & NVRAM_CFG1_FLASHIF_ENAB != 0 {
                if nvcfg1 & NVRAM_CFG1_BUFFERED_MODE != 0 {
                    self.flags |= Tg3Flags::NVRAM_BUFFERED;
                }
            } else {
                nvcfg1 &= !NVRAM_CFG1_COMPAT_BYPASS;
                self.regs.tw32(NVRAM_CFG1, nvcfg1);
            }
        } else {
            self.flags.remove(Tg3Flags::NVRAM | Tg3Flags::NVRAM_BUFFERED);
        }
        debug!("nvram: mode {:?}", self.flags & (Tg3Flags::NVRAM | Tg3Flags::NVRAM_BUFFERED));
    }

    /// Read one dword at byte `offset`.
    pub fn nvram_read(&mut self, offset: u32) -> Result<u32> {
        if !self.flags.contains(Tg3Flags::NVRAM) {
            return self.eeprom_read(offset);
        }

        let mut offset = offset;
        if self.flags.contains(Tg3Flags::NVRAM_BUFFERED) {
            offset = ((offset / NVRAM_BUFFERED_PAGE_SIZE) << NVRAM_BUFFERED_PAGE_POS)
                + offset % NVRAM_BUFFERED_PAGE_SIZE;
        }
        if offset > NVRAM_ADDR_MSK {
            return Err(Tg3Error::InvalidArgument);
        }

        self.regs.tw32(NVRAM_SWARB, SWARB_REQ_SET1);
        if poll_until(&mut self.regs, 1000, 20, |r| r.tr32(NVRAM_SWARB) & SWARB_GNT1 != 0).is_err()
        {
            self.regs.tw32(NVRAM_SWARB, SWARB_REQ_CLR1);
            return Err(Tg3Error::Timeout(WaitSite::NvramArbitration));
        }

        self.regs.tw32(NVRAM_ADDR, offset);
        self.regs.tw32(
            NVRAM_CMD,
            NVRAM_CMD_RD | NVRAM_CMD_GO | NVRAM_CMD_FIRST | NVRAM_CMD_LAST | NVRAM_CMD_DONE,
        );

        // DONE drops when the command is accepted and rises on completion.
        let mut saw_done_clear = false;
        let done = poll_until(&mut self.regs, 1000, 10, |r| {
            let done = r.tr32(NVRAM_CMD) & NVRAM_CMD_DONE != 0;
            if saw_done_clear {
                done
            } else {
                saw_done_clear = !done;
                false
            }
        });
        if done.is_err() {
            self.regs.tw32(NVRAM_SWARB, SWARB_REQ_CLR1);
            return Err(Tg3Error::Timeout(WaitSite::NvramCommand));
        }

        let val = self.regs.tr32(NVRAM_RDDATA).swap_bytes();
        self.regs.tw32(NVRAM_SWARB, SWARB_REQ_CLR1);
        Ok(val)
    }

    fn eeprom_read(&mut self, offset: u32) -> Result<u32> {
        if offset > EEPROM_ADDR_ADDR_MASK || offset % 4 != 0 {
            return Err(Tg3Error::InvalidArgument);
        }

        let tmp = self.regs.tr32(GRC_EEPROM_ADDR)
            & !(EEPROM_ADDR_ADDR_MASK | EEPROM_ADDR_DEVID_MASK | EEPROM_ADDR_READ);
        self.regs.tw32(
            GRC_EEPROM_ADDR,
            tmp | (offset & EEPROM_ADDR_ADDR_MASK) | EEPROM_ADDR_READ | EEPROM_ADDR_START,
        );

        poll_until(&mut self.regs, 10_000, 100, |r| {
            r.tr32(GRC_EEPROM_ADDR) & EEPROM_ADDR_COMPLETE != 0
        })
        .map_err(Tg3Error::timeout(WaitSite::EepromComplete))?;

        Ok(self.regs.tr32(GRC_EEPROM_DATA))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // VPD / MAC
    // ═══════════════════════════════════════════════════════════════════════

    /// Read the VPD image and extract the part number.
    pub(crate) fn read_part_number(&mut self) {
        let mut vpd = [0u8; VPD_LEN];
        for (i, chunk) in vpd.chunks_exact_mut(4).enumerate() {
            match self.nvram_read(VPD_OFFSET + (i as u32) * 4) {
                Ok(word) => chunk.copy_from_slice(&word.to_le_bytes()),
                Err(e) => {
                    debug!("vpd: read failed at {:#x}: {}", VPD_OFFSET + i as u32 * 4, e);
                    self.part_number = PartNumber::none();
                    return;
                }
            }
        }
        self.part_number = parse_part_number(&vpd).unwrap_or_else(PartNumber::none);
    }

    /// Resolve the station address.
    ///
    /// Order: the bootcode's SRAM mailbox (when it carries the `HK`
    /// signature), the board NVRAM, then whatever the MAC address
    /// registers hold.
    pub(crate) fn get_device_address(&mut self) -> Result<MacAddress> {
        let mac = match self.mac_from_mailbox() {
            Some(mac) => mac,
            None => match self.mac_from_nvram() {
                Some(mac) => mac,
                None => self.mac_from_registers(),
            },
        };
        if !is_valid_mac(&mac) {
            warn!("mac: no valid station address found");
            return Err(Tg3Error::InvalidMac);
        }
        self.mac = mac;
        Ok(mac)
    }

    fn mac_from_mailbox(&mut self) -> Option<MacAddress> {
        let hi = self.regs.read_mem(NIC_SRAM_MAC_ADDR_HIGH_MBOX);
        if hi >> 16 != NIC_SRAM_MAC_ADDR_SIGNATURE {
            return None;
        }
        let lo = self.regs.read_mem(NIC_SRAM_MAC_ADDR_LOW_MBOX);
        let [_, _, h1, h0] = hi.to_be_bytes();
        let [l3, l2, l1, l0] = lo.to_be_bytes();
        Some([h1, h0, l3, l2, l1, l0])
    }

    fn mac_from_nvram(&mut self) -> Option<MacAddress> {
        let base = if self.regs.bus().function() == 0 {
            NVRAM_MAC_OFFSET_FN0
        } else {
            NVRAM_MAC_OFFSET_FN1
        };
        let hi = self.nvram_read(base).ok()?;
        let lo = self.nvram_read(base + 4).ok()?;
        let [_, _, h2, h3] = hi.to_le_bytes();
        let [l0, l1, l2, l3] = lo.to_le_bytes();
        let mac = [h2, h3, l0, l1, l2, l3];
        is_valid_mac(&mac).then_some(mac)
    }

    fn mac_from_registers(&mut self) -> MacAddress {
        let hi = self.regs.tr32(MAC_ADDR_0_HIGH);
        let lo = self.regs.tr32(MAC_ADDR_0_LOW);
        let [_, _, h1, h0] = hi.to_be_bytes();
        let [l3, l2, l1, l0] = lo.to_be_bytes();
        [h1, h0, l3, l2, l1, l0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tg3::testutil;

    fn vpd_image(parts: &[&[u8]]) -> [u8; VPD_LEN] {
        let mut vpd = [0u8; VPD_LEN];
        let mut at = 0;
        for p in parts {
            vpd[at..at + p.len()].copy_from_slice(p);
            at += p.len();
        }
        vpd
    }

    #[test]
    fn part_number_found_after_id_string() {
        let vpd = vpd_image(&[
            &[0x82, 5, 0],
            b"Board",
            &[0x90, 16, 0],
            b"EC",
            &[2],
            b"A1",
            b"PN",
            &[8],
            b"BCM95704",
        ]);
        assert_eq!(parse_part_number(&vpd).map(|p| p.as_str() == "BCM95704"), Some(true));
    }

    #[test]
    fn part_number_rejects_unknown_tag_and_oversize_keyword() {
        assert_eq!(parse_part_number(&vpd_image(&[&[0x10, 0, 0]])), None);
        let long = vpd_image(&[&[0x90, 40, 0], b"PN", &[30]]);
        assert_eq!(parse_part_number(&long), None);
    }

    #[test]
    fn part_number_scan_stops_at_block_end() {
        // Keyword lengths walk past the declared block without a PN.
        let vpd = vpd_image(&[&[0x90, 6, 0], b"EC", &[200], b"PN", &[2], b"XX"]);
        assert_eq!(parse_part_number(&vpd), None);
        // A resource length pointing past the image ends the scan.
        let vpd = vpd_image(&[&[0x82, 0xff, 0xff]]);
        assert_eq!(parse_part_number(&vpd), None);
    }

    #[test]
    fn nvram_init_selects_buffered_flash_on_5704() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5704_A0;
        sim.state_mut()
            .set_reg(NVRAM_CFG1, NVRAM_CFG1_FLASHIF_ENAB | NVRAM_CFG1_BUFFERED_MODE);
        dev.nvram_init();
        assert!(dev.flags.contains(Tg3Flags::NVRAM | Tg3Flags::NVRAM_BUFFERED));
        assert_ne!(sim.state().reg(GRC_LOCAL_CTRL) & GRC_LCLCTRL_AUTO_SEEPROM, 0);
    }

    #[test]
    fn nvram_init_clears_compat_bypass_without_flash() {
        let (sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = CHIPREV_ID_5703_A2;
        sim.state_mut().set_reg(NVRAM_CFG1, NVRAM_CFG1_COMPAT_BYPASS | 0x10);
        dev.nvram_init();
        assert!(dev.flags.contains(Tg3Flags::NVRAM));
        assert!(!dev.flags.contains(Tg3Flags::NVRAM_BUFFERED));
        assert_eq!(sim.state().reg(NVRAM_CFG1), 0x10);
    }

    #[test]
    fn nvram_init_uses_eeprom_on_5701() {
        let (_sim, mut dev) = testutil::device();
        dev.chip.chip_rev_id = 0x0105;
        dev.flags |= Tg3Flags::NVRAM;
        dev.nvram_init();
        assert!(!dev.flags.contains(Tg3Flags::NVRAM));
    }

    #[test]
    fn buffered_nvram_translates_page_offsets() {
        let (sim, mut dev) = testutil::device();
        dev.flags |= Tg3Flags::NVRAM | Tg3Flags::NVRAM_BUFFERED;
        sim.state_mut().nvram.insert(1 << NVRAM_BUFFERED_PAGE_POS, 0xdead_beef);
        assert_eq!(dev.nvram_read(NVRAM_BUFFERED_PAGE_SIZE), Ok(0xdead_beef));
        assert_eq!(
            sim.state().reg_writes(NVRAM_SWARB),
            vec![SWARB_REQ_SET1, SWARB_REQ_CLR1]
        );
    }

    #[test]
    fn nvram_offset_out_of_range_is_rejected() {
        let (_sim, mut dev) = testutil::device();
        dev.flags |= Tg3Flags::NVRAM;
        assert_eq!(dev.nvram_read(0x0100_0000), Err(Tg3Error::InvalidArgument));
    }

    #[test]
    fn eeprom_rejects_unaligned_and_large_offsets() {
        let (sim, mut dev) = testutil::device();
        sim.state_mut().nvram.insert(0x7c, 0x1234_5678);
        assert_eq!(dev.nvram_read(0x7c), Ok(0x1234_5678));
        assert_eq!(dev.nvram_read(0x7e), Err(Tg3Error::InvalidArgument));
        assert_eq!(dev.nvram_read(0x1_0000), Err(Tg3Error::InvalidArgument));
    }

    #[test]
    fn eeprom_timeout_reports_site() {
        let (sim, mut dev) = testutil::device();
        sim.state_mut().pin(GRC_EEPROM_ADDR, 0);
        assert_eq!(dev.nvram_read(0), Err(Tg3Error::Timeout(WaitSite::EepromComplete)));
        assert_eq!(sim.delays().count(100), 10_000);
    }

    #[test]
    fn mailbox_mac_wins_over_nvram() {
        let (sim, mut dev) = testutil::device();
        {
            let mut s = sim.state_mut();
            s.set_sram(NIC_SRAM_MAC_ADDR_HIGH_MBOX, 0x484b_0010);
            s.set_sram(NIC_SRAM_MAC_ADDR_LOW_MBOX, 0x1819_2a3b);
            s.nvram.insert(0x7c, 0x1000_0000);
            s.nvram.insert(0x80, 0xccbb_aa18);
        }
        assert_eq!(dev.get_device_address(), Ok([0x00, 0x10, 0x18, 0x19, 0x2a, 0x3b]));
    }

    #[test]
    fn nvram_mac_used_without_mailbox_signature() {
        let (sim, mut dev) = testutil::device();
        {
            let mut s = sim.state_mut();
            s.set_sram(NIC_SRAM_MAC_ADDR_HIGH_MBOX, 0x1234_0010);
            s.nvram.insert(0x7c, 0x1000_0000);
            s.nvram.insert(0x80, 0xccbb_aa18);
        }
        assert_eq!(dev.get_device_address(), Ok([0x00, 0x10, 0x18, 0xaa, 0xbb, 0xcc]));
    }

    #[test]
    fn second_function_reads_its_own_nvram_slot() {
        let (sim, mut dev) = testutil::device();
        {
            let mut s = sim.state_mut();
            s.function = 1;
            s.nvram.insert(0xcc, 0x1000_0000);
            s.nvram.insert(0xd0, 0x0302_0118);
        }
        assert_eq!(dev.get_device_address(), Ok([0x00, 0x10, 0x18, 0x01, 0x02, 0x03]));
    }

    #[test]
    fn multicast_nvram_falls_back_to_registers() {
        let (sim, mut dev) = testutil::device();
        {
            let mut s = sim.state_mut();
            s.nvram.insert(0x7c, 0xffff_0000);
            s.nvram.insert(0x80, 0xffff_ffff);
            s.set_reg(MAC_ADDR_0_HIGH, 0x0010);
            s.set_reg(MAC_ADDR_0_LOW, 0x1801_0203);
        }
        assert_eq!(dev.get_device_address(), Ok([0x00, 0x10, 0x18, 0x01, 0x02, 0x03]));
    }

    #[test]
    fn no_source_gives_invalid_mac() {
        let (_sim, mut dev) = testutil::device();
        assert_eq!(dev.get_device_address(), Err(Tg3Error::InvalidMac));
        assert_eq!(dev.mac_address(), [0; 6]);
    }

    #[test]
    fn read_part_number_from_eeprom() {
        let (sim, mut dev) = testutil::device();
        {
            let mut s = sim.state_mut();
            let vpd = vpd_image(&[&[0x90, 11, 0], b"PN", &[8], b"BCM95701"]);
            for (i, c) in vpd.chunks_exact(4).enumerate() {
                s.nvram.insert(VPD_OFFSET + i as u32 * 4, u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
            }
        }
        dev.read_part_number();
        assert_eq!(dev.part_number(), "BCM95701");
    }
}
