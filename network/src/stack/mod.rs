//! IP stack glue.
//!
//! Bridges any [`NetworkDriver`](crate::driver::traits::NetworkDriver) to
//! smoltcp without heap allocation in the packet path.

pub mod adapter;

pub use adapter::SmoltcpAdapter;
