//! Memory barriers.
//!
//! Descriptor writes must be globally visible before the producer
//! mailbox is written, and status block reads must not be hoisted above
//! the poll that observed them.

/// Store fence - ensures all prior stores are globally visible.
///
/// Use before device notification to ensure descriptors are written.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn sfence() {
    // SAFETY: fence instruction only.
    unsafe { core::arch::x86_64::_mm_sfence() }
}

/// Load fence - ensures all prior loads complete before subsequent.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn lfence() {
    // SAFETY: fence instruction only.
    unsafe { core::arch::x86_64::_mm_lfence() }
}

// Stubs for non-x86_64
#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub fn sfence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::Release);
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub fn lfence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::Acquire);
}
