//! CPU primitives used by the driver.
//!
//! Inline-assembly versions of the port, MMIO, TSC and fence primitives.
//! Every function has a no-op stub on non-x86_64 targets so host-side
//! unit tests link.
//!
//! # Reference
//! Intel SDM Vol. 2 (IN/OUT, RDTSC, SFENCE/LFENCE/MFENCE)

pub mod barriers;
pub mod mmio;
pub mod pio;
pub mod tsc;
