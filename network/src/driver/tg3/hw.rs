//! Register access layer.
//!
//! The Tigon3 exposes three paths into the chip:
//! - BAR0 MMIO, used for every read and for mailbox writes
//! - the indirect register window in PCI config space
//!   (`REG_BASE_ADDR`/`REG_DATA`), used for every non-mailbox write
//! - the SRAM window (`MEM_WIN_BASE_ADDR`/`MEM_WIN_DATA`) into NIC-local
//!   memory
//!
//! Register writes go through the indirect window because early 570x
//! parts can drop posted MMIO writes to the MAC block. Mailboxes are
//! safe to write directly.
//!
//! # Reference
//! Broadcom BCM570X PRG §2.4 (Register Access Methods)

use super::regs::*;
use crate::arch::mmio;
use crate::pci::PciConfig;
use crate::time::Delay;

// ═══════════════════════════════════════════════════════════════════════════
// BUS ABSTRACTION
// ═══════════════════════════════════════════════════════════════════════════

/// MMIO plus configuration space of one Tigon3 function.
///
/// Reads take `&mut self` so a simulated bus can record them.
pub trait Tg3Bus: PciConfig {
    fn mmio_read32(&mut self, offset: u32) -> u32;
    fn mmio_write32(&mut self, offset: u32, value: u32);
    fn mmio_read16(&mut self, offset: u32) -> u16;
    fn mmio_write16(&mut self, offset: u32, value: u16);
    fn mmio_read8(&mut self, offset: u32) -> u8;
    fn mmio_write8(&mut self, offset: u32, value: u8);
}

/// Hardware bus: a mapped BAR0 plus a config-space handle.
pub struct MmioBus<C: PciConfig> {
    base: u64,
    len: u64,
    pci: C,
}

impl<C: PciConfig> MmioBus<C> {
    /// Wrap a mapped register BAR.
    ///
    /// # Safety
    /// `base..base+len` must be the device's BAR0, mapped uncached, and
    /// stay mapped for the lifetime of the bus.
    pub unsafe fn new(base: u64, len: u64, pci: C) -> Self {
        Self { base, len, pci }
    }

    /// BAR length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    fn addr(&self, offset: u32) -> u64 {
        debug_assert!((offset as u64) < self.len);
        self.base + offset as u64
    }
}

impl<C: PciConfig> PciConfig for MmioBus<C> {
    fn read_config32(&mut self, offset: u8) -> u32 {
        self.pci.read_config32(offset)
    }
    fn write_config32(&mut self, offset: u8, value: u32) {
        self.pci.write_config32(offset, value)
    }
    fn read_config16(&mut self, offset: u8) -> u16 {
        self.pci.read_config16(offset)
    }
    fn write_config16(&mut self, offset: u8, value: u16) {
        self.pci.write_config16(offset, value)
    }
    fn function(&self) -> u8 {
        self.pci.function()
    }
}

// SAFETY (all accessors): `new` guarantees the BAR mapping.
impl<C: PciConfig> Tg3Bus for MmioBus<C> {
    fn mmio_read32(&mut self, offset: u32) -> u32 {
        unsafe { mmio::read32(self.addr(offset)) }
    }
    fn mmio_write32(&mut self, offset: u32, value: u32) {
        unsafe { mmio::write32(self.addr(offset), value) }
    }
    fn mmio_read16(&mut self, offset: u32) -> u16 {
        unsafe { mmio::read16(self.addr(offset)) }
    }
    fn mmio_write16(&mut self, offset: u32, value: u16) {
        unsafe { mmio::write16(self.addr(offset), value) }
    }
    fn mmio_read8(&mut self, offset: u32) -> u8 {
        unsafe { mmio::read8(self.addr(offset)) }
    }
    fn mmio_write8(&mut self, offset: u32, value: u8) {
        unsafe { mmio::write8(self.addr(offset), value) }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTER ACCESSORS
// ═══════════════════════════════════════════════════════════════════════════

/// Number of config dwords saved across a core clock reset.
pub const PCI_SAVED_DWORDS: usize = 16;

/// Raw register, SRAM and config access plus the delay source.
///
/// None of these report errors; a wedged chip shows up later as a
/// bounded poll running out.
pub struct Tg3Regs<B, D> {
    bus: B,
    delay: D,
}

impl<B: Tg3Bus, D: Delay> Tg3Regs<B, D> {
    pub fn new(bus: B, delay: D) -> Self {
        Self { bus, delay }
    }

    /// Underlying bus (config-space access, tests).
    #[inline]
    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    #[inline]
    pub fn tr32(&mut self, off: u32) -> u32 {
        self.bus.mmio_read32(off)
    }

    #[inline]
    pub fn tr16(&mut self, off: u32) -> u16 {
        self.bus.mmio_read16(off)
    }

    #[inline]
    pub fn tr8(&mut self, off: u32) -> u8 {
        self.bus.mmio_read8(off)
    }

    /// Indirect register write through the config-space window.
    #[inline]
    pub fn tw32(&mut self, off: u32, val: u32) {
        self.bus.write_config32(TG3PCI_REG_BASE_ADDR, off);
        self.bus.write_config32(TG3PCI_REG_DATA, val);
    }

    /// Direct MMIO write; only for mailboxes.
    #[inline]
    pub fn tw32_mailbox(&mut self, off: u32, val: u32) {
        self.bus.mmio_write32(off, val)
    }

    #[inline]
    pub fn tw16(&mut self, off: u32, val: u16) {
        self.bus.mmio_write16(off, val)
    }

    #[inline]
    pub fn tw8(&mut self, off: u32, val: u8) {
        self.bus.mmio_write8(off, val)
    }

    /// Write, then read back so the write has reached the chip.
    ///
    /// Returns the value read back.
    #[inline]
    pub fn tw32_flush(&mut self, off: u32, val: u32) -> u32 {
        self.tw32(off, val);
        self.tr32(off)
    }

    /// Write, read back, then let the block settle for `us`.
    #[inline]
    pub fn tw32_carefully(&mut self, off: u32, val: u32, us: u32) {
        self.tw32_flush(off, val);
        self.delay.udelay(us);
    }

    /// Mailbox write followed by a read back.
    #[inline]
    pub fn tw32_mailbox_flush(&mut self, off: u32, val: u32) -> u32 {
        self.tw32_mailbox(off, val);
        self.tr32(off)
    }

    /// Read a dword of NIC SRAM.
    pub fn read_mem(&mut self, off: u32) -> u32 {
        self.bus.write_config32(TG3PCI_MEM_WIN_BASE_ADDR, off);
        let val = self.bus.read_config32(TG3PCI_MEM_WIN_DATA);
        self.bus.write_config32(TG3PCI_MEM_WIN_BASE_ADDR, 0);
        val
    }

    /// Write a dword of NIC SRAM.
    pub fn write_mem(&mut self, off: u32, val: u32) {
        self.bus.write_config32(TG3PCI_MEM_WIN_BASE_ADDR, off);
        self.bus.write_config32(TG3PCI_MEM_WIN_DATA, val);
        self.bus.write_config32(TG3PCI_MEM_WIN_BASE_ADDR, 0);
    }

    #[inline]
    pub fn read_config32(&mut self, off: u8) -> u32 {
        self.bus.read_config32(off)
    }

    #[inline]
    pub fn write_config32(&mut self, off: u8, val: u32) {
        self.bus.write_config32(off, val)
    }

    #[inline]
    pub fn read_config16(&mut self, off: u8) -> u16 {
        self.bus.read_config16(off)
    }

    #[inline]
    pub fn write_config16(&mut self, off: u8, val: u16) {
        self.bus.write_config16(off, val)
    }

    #[inline]
    pub fn read_config8(&mut self, off: u8) -> u8 {
        self.bus.read_config8(off)
    }

    #[inline]
    pub fn write_config8(&mut self, off: u8, val: u8) {
        self.bus.write_config8(off, val)
    }

    /// Mask the PCI interrupt and park the interrupt mailbox at 1.
    pub fn disable_ints(&mut self, misc_host_ctrl: u32) {
        self.tw32(
            TG3PCI_MISC_HOST_CTRL as u32,
            misc_host_ctrl | MISC_HOST_CTRL_MASK_PCI_INT,
        );
        self.tw32_mailbox_flush(MAILBOX_INTERRUPT_0 + TG3_64BIT_REG_LOW, 1);
    }

    /// Step the core clock off the 44MHz/alternate sources.
    pub fn switch_clocks(&mut self) {
        let clock_ctrl = TG3PCI_CLOCK_CTRL as u32;
        if self.tr32(clock_ctrl) & CLOCK_CTRL_44MHZ_CORE != 0 {
            self.tw32_carefully(clock_ctrl, CLOCK_CTRL_44MHZ_CORE | CLOCK_CTRL_ALTCLK, 40);
            self.tw32_carefully(clock_ctrl, CLOCK_CTRL_ALTCLK, 40);
        }
        self.tw32_carefully(clock_ctrl, 0, 40);
    }

    /// Snapshot the first 64 bytes of config space.
    pub fn save_config(&mut self) -> [u32; PCI_SAVED_DWORDS] {
        let mut saved = [0u32; PCI_SAVED_DWORDS];
        for (i, dword) in saved.iter_mut().enumerate() {
            *dword = self.bus.read_config32((i * 4) as u8);
        }
        saved
    }

    /// Write back a snapshot from [`save_config`](Self::save_config).
    pub fn restore_config(&mut self, saved: &[u32; PCI_SAVED_DWORDS]) {
        for (i, dword) in saved.iter().enumerate() {
            self.bus.write_config32((i * 4) as u8, *dword);
        }
    }
}

impl<B, D: Delay> Delay for Tg3Regs<B, D> {
    #[inline]
    fn udelay(&mut self, us: u32) {
        self.delay.udelay(us)
    }
}
