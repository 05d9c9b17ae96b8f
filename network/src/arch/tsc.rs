//! TSC (Time Stamp Counter) access.
//!
//! # Safety
//! TSC reads are always safe. Delays assume an invariant TSC whose
//! frequency was calibrated by the caller.

/// Read TSC (non-serializing).
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn read_tsc() -> u64 {
    // SAFETY: RDTSC has no memory side effects.
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Stub for non-x86_64 targets.
#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub fn read_tsc() -> u64 {
    0
}
