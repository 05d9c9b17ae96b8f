//! DMA descriptor rings, status block and the static ring arena.
//!
//! Everything the chip reads or writes by DMA lives in one
//! [`RingMemory`] block that is never moved after the device is built:
//! the send ring, the standard receive (posting) ring, the receive
//! return (completion) ring, the status and statistics blocks, the
//! receive buffers and the transmit bounce buffers.
//!
//! Posting slot `i` is bound to receive buffer `i` for the lifetime of
//! the device. The chip never writes the posting ring, so the slots are
//! filled once by [`RingSet::init`] and only the producer index moves.
//!
//! # Reference
//! Broadcom BCM570X PRG §6 (Send/Receive Rings), §5.4 (Status Block)

use core::ptr;

use spin::Once;

use super::error::{Result, Tg3Error};
use crate::types::ETH_HLEN;

// ═══════════════════════════════════════════════════════════════════════════
// RING GEOMETRY
// ═══════════════════════════════════════════════════════════════════════════

/// Send ring entries.
pub const TX_RING_SIZE: u32 = 512;
/// Standard receive ring entries.
pub const RX_RING_SIZE: u32 = 512;
/// Receive return ring entries.
pub const RX_RCB_RING_SIZE: u32 = 1024;
/// Buffers handed to the chip at reset.
pub const DEF_RX_RING_PENDING: u32 = 20;

/// Size of one receive buffer.
pub const RX_PKT_BUF_SZ: usize = 1536 + 2 + 64;
/// Length advertised in each posting descriptor.
pub const RX_POSTED_LEN: u32 = (RX_PKT_BUF_SZ - 64) as u32;
/// Largest payload the bounce buffer takes.
pub const TX_PAYLOAD_MAX: usize = 1536;
/// Status block size as the chip writes it.
pub const HW_STATUS_SIZE: usize = 0x50;
/// Statistics block size.
pub const HW_STATS_SIZE: usize = 0x800;
/// DMA self-test buffer, in dwords.
pub const DMA_TEST_WORDS: usize = 0x400 / 4;

#[inline]
pub const fn next_tx(n: u32) -> u32 {
    (n + 1) % TX_RING_SIZE
}

// ═══════════════════════════════════════════════════════════════════════════
// DESCRIPTORS
// ═══════════════════════════════════════════════════════════════════════════

/// Receive buffer descriptor, shared by the posting and return rings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct RxBufferDesc {
    pub addr_hi: u32,
    pub addr_lo: u32,
    /// Index (high half) and length (low half).
    pub idx_len: u32,
    /// Type (high half) and flags (low half).
    pub type_flags: u32,
    pub ip_tcp_csum: u32,
    /// Error bits (high half) and VLAN tag (low half).
    pub err_vlan: u32,
    pub reserved: u32,
    /// Echoed back verbatim in the return ring.
    pub opaque: u32,
}

/// Send buffer descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct TxBufferDesc {
    pub addr_hi: u32,
    pub addr_lo: u32,
    /// Length (high half) and flags (low half).
    pub len_flags: u32,
    pub vlan_tag: u32,
}

pub const RXD_LEN_MASK: u32 = 0x0000_ffff;
pub const RXD_LEN_SHIFT: u32 = 0;
pub const RXD_FLAGS_SHIFT: u32 = 0;
pub const RXD_FLAG_END: u32 = 0x0004;
pub const RXD_OPAQUE_INDEX_MASK: u32 = 0x0000_ffff;
pub const RXD_OPAQUE_INDEX_SHIFT: u32 = 0;
pub const RXD_OPAQUE_RING_STD: u32 = 0x0001_0000;
pub const RXD_OPAQUE_RING_JUMBO: u32 = 0x0002_0000;
pub const RXD_OPAQUE_RING_MINI: u32 = 0x0003_0000;
pub const RXD_OPAQUE_RING_MASK: u32 = 0x0007_0000;
/// Any bit here marks a bad frame.
pub const RXD_ERR_MASK: u32 = 0xffff_0000;
/// Odd nibble on MII; the frame is still good.
pub const RXD_ERR_ODD_NIBBLE_RCVD_MII: u32 = 0x0010_0000;

pub const TXD_FLAG_END: u32 = 0x0004;
pub const TXD_LEN_SHIFT: u32 = 16;

/// Host status block.
#[derive(Debug, Default)]
#[repr(C)]
pub struct StatusBlock {
    pub status: u32,
    pub status_tag: u32,
    pub rx_jumbo_consumer: u16,
    pub rx_consumer: u16,
    pub rx_mini_consumer: u16,
    pub reserved: u16,
    pub idx: [StatusIdx; 16],
}

/// Per-ring producer/consumer pair in the status block.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct StatusIdx {
    pub rx_producer: u16,
    pub tx_consumer: u16,
}

bitflags::bitflags! {
    /// `StatusBlock::status` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u32 {
        /// Chip wrote a new status block.
        const UPDATED  = 0x0000_0001;
        /// Link state changed.
        const LINK_CHG = 0x0000_0002;
        /// Block error attention.
        const ERROR    = 0x0000_0004;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ARENA
// ═══════════════════════════════════════════════════════════════════════════

/// One receive buffer.
#[derive(Clone, Copy)]
#[repr(C, align(64))]
pub struct RxBuffer(pub [u8; RX_PKT_BUF_SZ]);

/// All DMA-visible memory of one adapter.
#[repr(C, align(4096))]
pub struct RingMemory {
    pub rx_std: [RxBufferDesc; RX_RING_SIZE as usize],
    pub rx_rcb: [RxBufferDesc; RX_RCB_RING_SIZE as usize],
    pub tx: [TxBufferDesc; TX_RING_SIZE as usize],
    pub status: StatusBlock,
    pub stats: [u8; HW_STATS_SIZE],
    pub rx_buffers: [RxBuffer; RX_RING_SIZE as usize],
    pub tx_header: TxHeader,
    pub tx_payload: TxPayload,
    pub dma_test: DmaTestBuffer,
}

#[derive(Clone, Copy)]
#[repr(C, align(64))]
pub struct TxHeader(pub [u8; ETH_HLEN]);

#[derive(Clone, Copy)]
#[repr(C, align(64))]
pub struct TxPayload(pub [u8; TX_PAYLOAD_MAX]);

#[derive(Clone, Copy)]
#[repr(C, align(4096))]
pub struct DmaTestBuffer(pub [u32; DMA_TEST_WORDS]);

static mut ARENA: RingMemory = unsafe { core::mem::zeroed() };
static ARENA_CLAIM: Once<()> = Once::new();

impl RingMemory {
    /// Hand out the built-in static arena. Succeeds once per boot.
    pub fn claim_static() -> Result<&'static mut RingMemory> {
        let mut first = false;
        ARENA_CLAIM.call_once(|| first = true);
        if !first {
            return Err(Tg3Error::RingsInUse);
        }
        // SAFETY: the Once above lets exactly one caller through.
        Ok(unsafe { &mut *ptr::addr_of_mut!(ARENA) })
    }

    /// Zeroed arena on the heap, leaked for tests.
    #[cfg(test)]
    pub fn leak_zeroed() -> &'static mut RingMemory {
        use std::alloc::{alloc_zeroed, Layout};
        let layout = Layout::new::<RingMemory>();
        // SAFETY: all-zero is a valid RingMemory; the block is never freed.
        unsafe { &mut *(alloc_zeroed(layout) as *mut RingMemory) }
    }
}

/// CPU to bus address translation for the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaMap {
    pub cpu_base: u64,
    pub bus_base: u64,
}

impl DmaMap {
    /// Bus address == CPU address.
    pub const IDENTITY: Self = Self { cpu_base: 0, bus_base: 0 };

    #[inline]
    pub fn to_bus(&self, cpu: u64) -> u64 {
        cpu.wrapping_sub(self.cpu_base).wrapping_add(self.bus_base)
    }

    #[inline]
    pub fn bus_of<T>(&self, p: *const T) -> u64 {
        self.to_bus(p as u64)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RING SET
// ═══════════════════════════════════════════════════════════════════════════

/// Ring memory plus the software indices into it.
pub struct RingSet {
    mem: &'static mut RingMemory,
    dma: DmaMap,
    /// Next send slot to fill.
    pub tx_prod: u32,
    /// Posting ring producer as last written to the mailbox.
    pub rx_std_ptr: u32,
    /// Next return ring slot to consume.
    pub rx_rcb_ptr: u32,
    rx_pending: u32,
}

impl RingSet {
    pub fn new(mem: &'static mut RingMemory, dma: DmaMap, rx_pending: u32) -> Self {
        Self {
            mem,
            dma,
            tx_prod: 0,
            rx_std_ptr: 0,
            rx_rcb_ptr: 0,
            rx_pending: rx_pending.clamp(1, RX_RING_SIZE - 1),
        }
    }

    /// Buffers posted at reset.
    #[inline]
    pub fn rx_pending(&self) -> u32 {
        self.rx_pending
    }

    /// Zero every ring and block, then fill the posting ring.
    pub fn init(&mut self) {
        let dma = self.dma;
        let mem = &mut *self.mem;
        mem.rx_std.fill(RxBufferDesc::default());
        mem.rx_rcb.fill(RxBufferDesc::default());
        mem.tx.fill(TxBufferDesc::default());
        mem.stats.fill(0);
        Self::zero_status(mem);

        for (i, (desc, buf)) in mem.rx_std.iter_mut().zip(mem.rx_buffers.iter()).enumerate() {
            let bus = dma.bus_of(buf.0.as_ptr());
            desc.addr_hi = (bus >> 32) as u32;
            desc.addr_lo = bus as u32;
            desc.idx_len = RX_POSTED_LEN << RXD_LEN_SHIFT;
            desc.type_flags = RXD_FLAG_END << RXD_FLAGS_SHIFT;
            desc.opaque = RXD_OPAQUE_RING_STD | ((i as u32) << RXD_OPAQUE_INDEX_SHIFT);
        }
    }

    /// Reset software indices to the post-reset hardware view.
    pub fn reset_indices(&mut self) {
        self.tx_prod = 0;
        self.rx_rcb_ptr = 0;
        self.rx_std_ptr = self.rx_pending;
    }

    /// Clear the host status block.
    pub fn clear_status(&mut self) {
        Self::zero_status(&mut *self.mem);
    }

    /// Clear the host statistics block.
    pub fn clear_stats(&mut self) {
        self.mem.stats.fill(0);
    }

    fn zero_status(mem: &mut RingMemory) {
        // SAFETY: StatusBlock is plain integers; the pointer is valid.
        unsafe { ptr::write_bytes(ptr::addr_of_mut!(mem.status), 0, 1) };
    }

    // ─── status block (written by the chip) ───

    #[inline]
    pub fn status(&self) -> StatusFlags {
        // SAFETY: field of a live, aligned block.
        let raw = unsafe { ptr::read_volatile(ptr::addr_of!(self.mem.status.status)) };
        StatusFlags::from_bits_retain(raw)
    }

    #[inline]
    pub fn set_status(&mut self, flags: StatusFlags) {
        // SAFETY: as above.
        unsafe { ptr::write_volatile(ptr::addr_of_mut!(self.mem.status.status), flags.bits()) }
    }

    #[inline]
    pub fn rx_producer(&self) -> u32 {
        // SAFETY: as above.
        unsafe { ptr::read_volatile(ptr::addr_of!(self.mem.status.idx[0].rx_producer)) as u32 }
    }

    #[inline]
    pub fn tx_consumer(&self) -> u32 {
        // SAFETY: as above.
        unsafe { ptr::read_volatile(ptr::addr_of!(self.mem.status.idx[0].tx_consumer)) as u32 }
    }

    // ─── receive ───

    /// Return ring entry `i`.
    #[inline]
    pub fn rcb(&self, i: u32) -> RxBufferDesc {
        let i = (i % RX_RCB_RING_SIZE) as usize;
        // SAFETY: in-bounds element of the arena.
        unsafe { ptr::read_volatile(ptr::addr_of!(self.mem.rx_rcb[i])) }
    }

    #[inline]
    pub fn posting(&self, i: u32) -> &RxBufferDesc {
        &self.mem.rx_std[(i % RX_RING_SIZE) as usize]
    }

    /// Receive buffer bound to posting slot `i`.
    #[inline]
    pub fn rx_buffer(&self, i: u32) -> &[u8; RX_PKT_BUF_SZ] {
        &self.mem.rx_buffers[(i % RX_RING_SIZE) as usize].0
    }

    // ─── transmit ───

    /// Entries the chip has not yet consumed.
    #[inline]
    pub fn tx_in_flight(&self) -> u32 {
        self.tx_prod.wrapping_sub(self.tx_consumer()) % TX_RING_SIZE
    }

    /// Room for a header + payload pair without the producer catching
    /// up with the consumer.
    #[inline]
    pub fn tx_has_room(&self) -> bool {
        self.tx_in_flight() + 2 <= TX_RING_SIZE - 1
    }

    /// Copy a frame into the bounce buffers and queue both descriptors.
    ///
    /// Returns the new producer index. The caller has checked
    /// [`tx_has_room`](Self::tx_has_room) and the payload length.
    pub fn queue_tx(&mut self, header: &[u8; ETH_HLEN], payload: &[u8]) -> u32 {
        let dma = self.dma;
        let mem = &mut *self.mem;
        mem.tx_header.0.copy_from_slice(header);
        mem.tx_payload.0[..payload.len()].copy_from_slice(payload);

        let hdr_bus = dma.bus_of(mem.tx_header.0.as_ptr());
        let pay_bus = dma.bus_of(mem.tx_payload.0.as_ptr());

        let mut entry = self.tx_prod;
        mem.tx[entry as usize] = TxBufferDesc {
            addr_hi: (hdr_bus >> 32) as u32,
            addr_lo: hdr_bus as u32,
            len_flags: (ETH_HLEN as u32) << TXD_LEN_SHIFT,
            vlan_tag: 0,
        };
        entry = next_tx(entry);
        mem.tx[entry as usize] = TxBufferDesc {
            addr_hi: (pay_bus >> 32) as u32,
            addr_lo: pay_bus as u32,
            len_flags: (payload.len() as u32) << TXD_LEN_SHIFT | TXD_FLAG_END,
            vlan_tag: 0,
        };
        entry = next_tx(entry);
        self.tx_prod = entry;
        entry
    }

    #[inline]
    pub fn tx_desc(&self, i: u32) -> &TxBufferDesc {
        &self.mem.tx[(i % TX_RING_SIZE) as usize]
    }

    // ─── bus addresses ───

    #[inline]
    pub fn rx_std_bus(&self) -> u64 {
        self.dma.bus_of(self.mem.rx_std.as_ptr())
    }

    #[inline]
    pub fn rx_rcb_bus(&self) -> u64 {
        self.dma.bus_of(self.mem.rx_rcb.as_ptr())
    }

    #[inline]
    pub fn tx_bus(&self) -> u64 {
        self.dma.bus_of(self.mem.tx.as_ptr())
    }

    #[inline]
    pub fn status_bus(&self) -> u64 {
        self.dma.bus_of(ptr::addr_of!(self.mem.status))
    }

    #[inline]
    pub fn stats_bus(&self) -> u64 {
        self.dma.bus_of(self.mem.stats.as_ptr())
    }

    // ─── DMA self-test buffer ───

    #[inline]
    pub fn dma_test_bus(&self) -> u64 {
        self.dma.bus_of(self.mem.dma_test.0.as_ptr())
    }

    #[inline]
    pub fn dma_test_buf(&mut self) -> &mut [u32; DMA_TEST_WORDS] {
        &mut self.mem.dma_test.0
    }

    /// Arena access for tests that play the chip's DMA side.
    #[cfg(test)]
    pub fn mem_mut(&mut self) -> &mut RingMemory {
        &mut *self.mem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    fn ring_set() -> RingSet {
        RingSet::new(RingMemory::leak_zeroed(), DmaMap::IDENTITY, DEF_RX_RING_PENDING)
    }

    #[test]
    fn descriptor_layouts_match_hardware() {
        assert_eq!(size_of::<RxBufferDesc>(), 32);
        assert_eq!(size_of::<TxBufferDesc>(), 16);
        assert_eq!(size_of::<StatusBlock>(), HW_STATUS_SIZE);
        assert_eq!(core::mem::align_of::<RingMemory>(), 4096);
    }

    #[test]
    fn init_binds_each_posting_slot_to_its_own_buffer() {
        let mut rings = ring_set();
        rings.init();
        for i in [0u32, 1, 19, 20, 511] {
            let d = *rings.posting(i);
            assert_eq!(d.opaque, RXD_OPAQUE_RING_STD | i);
            assert_eq!(d.idx_len & RXD_LEN_MASK, RX_POSTED_LEN);
            assert_eq!(d.type_flags, RXD_FLAG_END);
            let bus = (d.addr_hi as u64) << 32 | d.addr_lo as u64;
            assert_eq!(bus, rings.rx_buffer(i).as_ptr() as u64);
        }
        assert_ne!(rings.posting(0).addr_lo, rings.posting(20).addr_lo);
    }

    #[test]
    fn queue_tx_builds_header_and_payload_pair() {
        let mut rings = ring_set();
        rings.init();
        rings.tx_prod = TX_RING_SIZE - 1;
        let prod = rings.queue_tx(&[0xaa; ETH_HLEN], &[1, 2, 3, 4]);
        assert_eq!(prod, 1);
        let hdr = *rings.tx_desc(TX_RING_SIZE - 1);
        let pay = *rings.tx_desc(0);
        assert_eq!(hdr.len_flags, (ETH_HLEN as u32) << TXD_LEN_SHIFT);
        assert_eq!(pay.len_flags, 4 << TXD_LEN_SHIFT | TXD_FLAG_END);
    }

    #[test]
    fn producer_never_catches_consumer() {
        let mut rings = ring_set();
        rings.init();
        rings.tx_prod = 508;
        assert!(rings.tx_has_room());
        rings.tx_prod = 509;
        assert!(rings.tx_has_room());
        rings.tx_prod = 510;
        assert!(!rings.tx_has_room());
    }

    #[test]
    fn dma_map_translates_by_offset() {
        let map = DmaMap { cpu_base: 0x10_0000, bus_base: 0x8000_0000 };
        assert_eq!(map.to_bus(0x10_2000), 0x8000_2000);
        assert_eq!(DmaMap::IDENTITY.to_bus(0x1234), 0x1234);
    }

    #[test]
    fn static_arena_is_claimed_once() {
        assert!(RingMemory::claim_static().is_ok());
        assert_eq!(RingMemory::claim_static().err(), Some(Tg3Error::RingsInUse));
    }
}
