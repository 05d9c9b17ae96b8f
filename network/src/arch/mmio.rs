//! MMIO (Memory-Mapped I/O) accessors.
//!
//! # Safety
//! - Address must be a valid MMIO address inside a mapped BAR
//! - Address must be naturally aligned for the access width
//! - The mapping must be uncached

use core::ptr::{read_volatile, write_volatile};

/// Read 8-bit value from MMIO address.
///
/// # Safety
/// Address must be valid MMIO address.
#[inline]
pub unsafe fn read8(addr: u64) -> u8 {
    read_volatile(addr as *const u8)
}

/// Write 8-bit value to MMIO address.
#[inline]
pub unsafe fn write8(addr: u64, value: u8) {
    write_volatile(addr as *mut u8, value)
}

/// Read 16-bit value from MMIO address.
///
/// # Safety
/// Address must be valid, 2-byte aligned MMIO address.
#[inline]
pub unsafe fn read16(addr: u64) -> u16 {
    read_volatile(addr as *const u16)
}

/// Write 16-bit value to MMIO address.
#[inline]
pub unsafe fn write16(addr: u64, value: u16) {
    write_volatile(addr as *mut u16, value)
}

/// Read 32-bit value from MMIO address.
///
/// # Safety
/// Address must be valid, 4-byte aligned MMIO address.
#[inline]
pub unsafe fn read32(addr: u64) -> u32 {
    read_volatile(addr as *const u32)
}

/// Write 32-bit value to MMIO address.
#[inline]
pub unsafe fn write32(addr: u64, value: u32) {
    write_volatile(addr as *mut u32, value)
}
