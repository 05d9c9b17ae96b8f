//! Time and timing module.
//!
//! Busy-wait delays and the bounded poll helper every hardware wait in
//! the driver goes through.
//!
//! All hardware waits in this crate are expressed as "check, then sleep"
//! loops with a fixed iteration budget. [`poll_until`] is the single
//! implementation; callers pass the budget and the interval that the
//! chip documentation asks for and get back either the number of polls
//! it took or a [`PollTimeout`].

use crate::arch::tsc::read_tsc;

// ═══════════════════════════════════════════════════════════════════════════
// DELAY
// ═══════════════════════════════════════════════════════════════════════════

/// Microsecond busy-wait source.
///
/// Production code uses [`TscDelay`]; unit tests substitute a recording
/// implementation so timing contracts can be asserted exactly.
pub trait Delay {
    /// Spin for at least `us` microseconds.
    fn udelay(&mut self, us: u32);

    /// Spin for at least `ms` milliseconds.
    fn mdelay(&mut self, ms: u32) {
        for _ in 0..ms {
            self.udelay(1000);
        }
    }
}

/// TSC-calibrated busy wait.
#[derive(Debug, Clone, Copy)]
pub struct TscDelay {
    ticks_per_us: u64,
}

impl TscDelay {
    /// Create from TSC frequency in Hz.
    pub fn new(tsc_freq: u64) -> Self {
        Self {
            ticks_per_us: (tsc_freq / 1_000_000).max(1),
        }
    }

    /// Convert microseconds to ticks.
    #[inline]
    pub fn us_to_ticks(&self, us: u64) -> u64 {
        us * self.ticks_per_us
    }
}

impl Delay for TscDelay {
    fn udelay(&mut self, us: u32) {
        let start = read_tsc();
        let ticks = self.us_to_ticks(us as u64);
        while read_tsc().wrapping_sub(start) < ticks {
            core::hint::spin_loop();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BOUNDED POLLING
// ═══════════════════════════════════════════════════════════════════════════

/// A bounded wait ran out of iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    /// Iterations spent before giving up.
    pub polls: u32,
}

/// Poll `ready` up to `max_polls` times, sleeping `interval_us` after
/// every unsuccessful check.
///
/// Returns the 1-based poll on which `ready` first returned true. The
/// context is handed to the predicate so it can touch registers between
/// sleeps.
pub fn poll_until<C, F>(
    ctx: &mut C,
    max_polls: u32,
    interval_us: u32,
    mut ready: F,
) -> Result<u32, PollTimeout>
where
    C: Delay + ?Sized,
    F: FnMut(&mut C) -> bool,
{
    for poll in 1..=max_polls {
        if ready(ctx) {
            return Ok(poll);
        }
        ctx.udelay(interval_us);
    }
    Err(PollTimeout { polls: max_polls })
}
