//! Tigon3 register definitions.
//!
//! Register offsets, SRAM mailbox locations and bit definitions for the
//! BCM5700/5701/5702/5703/5704 family. Offsets below 0x100 are PCI
//! configuration space; everything else is BAR0 (or the SRAM window).
//!
//! # Reference
//! Broadcom BCM570X Programmer's Reference Guide, §5 (Register Map)

// ═══════════════════════════════════════════════════════════════════════════
// PCI CONFIGURATION SPACE (VENDOR SPECIFIC)
// ═══════════════════════════════════════════════════════════════════════════

/// PCI-X capability command/status.
pub const TG3PCI_X_CAPS: u8 = 0x40;
/// Relaxed ordering enable.
pub const PCIX_CAPS_RELAXED_ORDERING: u32 = 0x0002_0000;
/// Max outstanding split transactions.
pub const PCIX_CAPS_SPLIT_MASK: u32 = 0x0070_0000;
pub const PCIX_CAPS_SPLIT_SHIFT: u32 = 20;
/// Max memory read byte count.
pub const PCIX_CAPS_BURST_MASK: u32 = 0x000c_0000;
pub const PCIX_CAPS_BURST_SHIFT: u32 = 18;
pub const PCIX_CAPS_MAX_BURST_5704: u32 = 2;

/// Miscellaneous host control.
pub const TG3PCI_MISC_HOST_CTRL: u8 = 0x68;
pub const MISC_HOST_CTRL_CLEAR_INT: u32 = 0x0000_0001;
pub const MISC_HOST_CTRL_MASK_PCI_INT: u32 = 0x0000_0002;
pub const MISC_HOST_CTRL_BYTE_SWAP: u32 = 0x0000_0004;
pub const MISC_HOST_CTRL_WORD_SWAP: u32 = 0x0000_0008;
pub const MISC_HOST_CTRL_PCISTATE_RW: u32 = 0x0000_0010;
pub const MISC_HOST_CTRL_CLKREG_RW: u32 = 0x0000_0020;
pub const MISC_HOST_CTRL_INDIR_ACCESS: u32 = 0x0000_0080;
pub const MISC_HOST_CTRL_CHIPREV: u32 = 0xffff_0000;
pub const MISC_HOST_CTRL_CHIPREV_SHIFT: u32 = 16;

/// DMA read/write control.
pub const TG3PCI_DMA_RW_CTRL: u8 = 0x6c;
pub const DMA_RWCTRL_MIN_DMA_SHIFT: u32 = 0;
pub const DMA_RWCTRL_READ_BNDRY_MASK: u32 = 0x0000_0700;
pub const DMA_RWCTRL_WRITE_BNDRY_MASK: u32 = 0x0000_3800;
pub const DMA_RWCTRL_WRITE_BNDRY_16: u32 = 0x0000_0800;
pub const DMA_RWCTRL_ONE_DMA: u32 = 0x0000_4000;
pub const DMA_RWCTRL_READ_WATER_SHIFT: u32 = 16;
pub const DMA_RWCTRL_WRITE_WATER_SHIFT: u32 = 19;
pub const DMA_RWCTRL_USE_MEM_READ_MULT: u32 = 0x0040_0000;
pub const DMA_RWCTRL_PCI_READ_CMD_SHIFT: u32 = 24;
pub const DMA_RWCTRL_PCI_WRITE_CMD_SHIFT: u32 = 28;

/// PCI state.
pub const TG3PCI_PCISTATE: u8 = 0x70;
pub const PCISTATE_FORCE_RESET: u32 = 0x0000_0001;
pub const PCISTATE_INT_NOT_ACTIVE: u32 = 0x0000_0002;
pub const PCISTATE_CONV_PCI_MODE: u32 = 0x0000_0004;
pub const PCISTATE_BUS_SPEED_HIGH: u32 = 0x0000_0008;
pub const PCISTATE_BUS_32BIT: u32 = 0x0000_0010;
pub const PCISTATE_ROM_ENABLE: u32 = 0x0000_0020;
pub const PCISTATE_ROM_RETRY_ENABLE: u32 = 0x0000_0040;
pub const PCISTATE_RETRY_SAME_DMA: u32 = 0x0000_2000;

/// Clock control.
pub const TG3PCI_CLOCK_CTRL: u8 = 0x74;
pub const CLOCK_CTRL_ALTCLK: u32 = 0x0000_1000;
pub const CLOCK_CTRL_44MHZ_CORE: u32 = 0x0004_0000;
pub const CLOCK_CTRL_DELAY_PCI_GRANT: u32 = 0x8000_0000;

/// Indirect register window: address.
pub const TG3PCI_REG_BASE_ADDR: u8 = 0x78;
/// SRAM window: address.
pub const TG3PCI_MEM_WIN_BASE_ADDR: u8 = 0x7c;
/// Indirect register window: data.
pub const TG3PCI_REG_DATA: u8 = 0x80;
/// SRAM window: data.
pub const TG3PCI_MEM_WIN_DATA: u8 = 0x84;

// ═══════════════════════════════════════════════════════════════════════════
// CHIP REVISIONS
// ═══════════════════════════════════════════════════════════════════════════

pub const CHIPREV_ID_5700_ALTIMA: u32 = 0x7104;
pub const CHIPREV_ID_5701_A0: u32 = 0x0000;
pub const CHIPREV_ID_5701_B0: u32 = 0x0100;
pub const CHIPREV_ID_5703_A1: u32 = 0x1001;
pub const CHIPREV_ID_5703_A2: u32 = 0x1002;
pub const CHIPREV_ID_5703_A3: u32 = 0x1003;
pub const CHIPREV_ID_5704_A0: u32 = 0x2000;

pub const ASIC_REV_5700: u32 = 0x07;
pub const ASIC_REV_5701: u32 = 0x00;
pub const ASIC_REV_5703: u32 = 0x01;
pub const ASIC_REV_5704: u32 = 0x02;

pub const CHIPREV_5700_AX: u32 = 0x70;
pub const CHIPREV_5700_BX: u32 = 0x71;

// ═══════════════════════════════════════════════════════════════════════════
// MAILBOXES (BAR0, 64-bit pairs)
// ═══════════════════════════════════════════════════════════════════════════

/// High word of a 64-bit register pair.
pub const TG3_64BIT_REG_HIGH: u32 = 0x0;
/// Low word of a 64-bit register pair.
pub const TG3_64BIT_REG_LOW: u32 = 0x4;
pub const MAILBOX_INTERRUPT_0: u32 = 0x0200;
pub const MAILBOX_RCV_STD_PROD_IDX: u32 = 0x0268;
pub const MAILBOX_RCV_JUMBO_PROD_IDX: u32 = 0x0270;
pub const MAILBOX_RCVRET_CON_IDX_0: u32 = 0x0280;
pub const MAILBOX_SNDHOST_PROD_IDX_0: u32 = 0x0300;
pub const MAILBOX_SNDNIC_PROD_IDX_0: u32 = 0x0380;

// ═══════════════════════════════════════════════════════════════════════════
// MAC CONTROL
// ═══════════════════════════════════════════════════════════════════════════

/// MAC mode.
pub const MAC_MODE: u32 = 0x0400;
pub const MAC_MODE_RESET: u32 = 0x0000_0001;
pub const MAC_MODE_HALF_DUPLEX: u32 = 0x0000_0002;
pub const MAC_MODE_PORT_MODE_MASK: u32 = 0x0000_000c;
pub const MAC_MODE_PORT_MODE_TBI: u32 = 0x0000_000c;
pub const MAC_MODE_PORT_MODE_GMII: u32 = 0x0000_0008;
pub const MAC_MODE_PORT_MODE_MII: u32 = 0x0000_0004;
pub const MAC_MODE_LINK_POLARITY: u32 = 0x0000_0400;
pub const MAC_MODE_RXSTAT_ENABLE: u32 = 0x0000_0800;
pub const MAC_MODE_RXSTAT_CLEAR: u32 = 0x0000_1000;
pub const MAC_MODE_TXSTAT_ENABLE: u32 = 0x0000_4000;
pub const MAC_MODE_TXSTAT_CLEAR: u32 = 0x0000_8000;
pub const MAC_MODE_SEND_CONFIGS: u32 = 0x0002_0000;
pub const MAC_MODE_TDE_ENABLE: u32 = 0x0020_0000;
pub const MAC_MODE_RDE_ENABLE: u32 = 0x0040_0000;
pub const MAC_MODE_FHDE_ENABLE: u32 = 0x0080_0000;

/// MAC status.
pub const MAC_STATUS: u32 = 0x0404;
pub const MAC_STATUS_PCS_SYNCED: u32 = 0x0000_0001;
pub const MAC_STATUS_SIGNAL_DET: u32 = 0x0000_0002;
pub const MAC_STATUS_RCVD_CFG: u32 = 0x0000_0004;
pub const MAC_STATUS_CFG_CHANGED: u32 = 0x0000_0008;
pub const MAC_STATUS_SYNC_CHANGED: u32 = 0x0000_0010;
pub const MAC_STATUS_LNKSTATE_CHANGED: u32 = 0x0000_1000;
pub const MAC_STATUS_MI_INTERRUPT: u32 = 0x0080_0000;

/// MAC event enable.
pub const MAC_EVENT: u32 = 0x0408;
pub const MAC_EVENT_LNKSTATE_CHANGED: u32 = 0x0000_1000;

/// LED control.
pub const MAC_LED_CTRL: u32 = 0x040c;
pub const LED_CTRL_PHY_MODE_1: u32 = 0x0000_0800;

/// Station address slots (4, stride 8).
pub const MAC_ADDR_0_HIGH: u32 = 0x0410;
pub const MAC_ADDR_0_LOW: u32 = 0x0414;
pub const MAC_ADDR_STRIDE: u32 = 8;
pub const MAC_ADDR_SLOTS: u32 = 4;

pub const MAC_TX_BACKOFF_SEED: u32 = 0x0438;
pub const TX_BACKOFF_SEED_MASK: u32 = 0x0000_03ff;
pub const MAC_RX_MTU_SIZE: u32 = 0x043c;

/// Transmitted autonegotiation config word (fiber).
pub const MAC_TX_AUTO_NEG: u32 = 0x0444;
/// Received autonegotiation config word (fiber).
pub const MAC_RX_AUTO_NEG: u32 = 0x0448;

/// MII management communication.
pub const MAC_MI_COM: u32 = 0x044c;
pub const MI_COM_CMD_WRITE: u32 = 0x0400_0000;
pub const MI_COM_CMD_READ: u32 = 0x0800_0000;
pub const MI_COM_READ_FAILED: u32 = 0x1000_0000;
pub const MI_COM_START: u32 = 0x2000_0000;
pub const MI_COM_BUSY: u32 = 0x2000_0000;
pub const MI_COM_PHY_ADDR_MASK: u32 = 0x03e0_0000;
pub const MI_COM_PHY_ADDR_SHIFT: u32 = 21;
pub const MI_COM_REG_ADDR_MASK: u32 = 0x001f_0000;
pub const MI_COM_REG_ADDR_SHIFT: u32 = 16;
pub const MI_COM_DATA_MASK: u32 = 0x0000_ffff;

pub const MAC_MI_STAT: u32 = 0x0450;
pub const MAC_MI_STAT_LNKSTAT_ATTN_ENAB: u32 = 0x0000_0001;

pub const MAC_MI_MODE: u32 = 0x0454;
pub const MAC_MI_MODE_AUTO_POLL: u32 = 0x0000_0010;
pub const MAC_MI_MODE_BASE: u32 = 0x000c_0000;

/// TX MAC mode.
pub const MAC_TX_MODE: u32 = 0x045c;
pub const TX_MODE_RESET: u32 = 0x0000_0001;
pub const TX_MODE_ENABLE: u32 = 0x0000_0002;
pub const TX_MODE_FLOW_CTRL_ENABLE: u32 = 0x0000_0010;

pub const MAC_TX_LENGTHS: u32 = 0x0464;
pub const TX_LENGTHS_SLOT_TIME_SHIFT: u32 = 0;
pub const TX_LENGTHS_IPG_SHIFT: u32 = 8;
pub const TX_LENGTHS_IPG_CRS_SHIFT: u32 = 12;

/// RX MAC mode.
pub const MAC_RX_MODE: u32 = 0x0468;
pub const RX_MODE_RESET: u32 = 0x0000_0001;
pub const RX_MODE_ENABLE: u32 = 0x0000_0002;
pub const RX_MODE_FLOW_CTRL_ENABLE: u32 = 0x0000_0004;
pub const RX_MODE_PROMISC: u32 = 0x0000_0100;
pub const RX_MODE_KEEP_VLAN_TAG: u32 = 0x0000_0400;

/// Multicast hash (4 dwords).
pub const MAC_HASH_REG_0: u32 = 0x0470;
pub const MAC_HASH_REG_1: u32 = 0x0474;
pub const MAC_HASH_REG_2: u32 = 0x0478;
pub const MAC_HASH_REG_3: u32 = 0x047c;

/// Receive classification rules (16 pairs, stride 8).
pub const MAC_RCV_RULE_0: u32 = 0x0480;
pub const MAC_RCV_VALUE_0: u32 = 0x0484;
pub const MAC_RCV_RULE_STRIDE: u32 = 8;
pub const MAC_RCV_RULE_CFG: u32 = 0x0500;
pub const RCV_RULE_CFG_DEFAULT_CLASS: u32 = 0x0000_0008;
pub const RCV_RULE_DISABLE_MASK: u32 = 0x7fff_ffff;

pub const MAC_SERDES_CFG: u32 = 0x0590;

// ═══════════════════════════════════════════════════════════════════════════
// DATA PATH BLOCKS
// ═══════════════════════════════════════════════════════════════════════════
// Every block mode register uses bit 1 for enable; most use bit 2 for
// attention.

pub const BLOCK_ENABLE: u32 = 0x0000_0002;
pub const BLOCK_ATTN_ENABLE: u32 = 0x0000_0004;

/// Send data initiator.
pub const SNDDATAI_MODE: u32 = 0x0c00;
pub const SNDDATAI_STATSCTRL: u32 = 0x0c08;
pub const SNDDATAI_SCTRL_ENABLE: u32 = 0x0000_0001;
pub const SNDDATAI_SCTRL_FASTUPD: u32 = 0x0000_0002;
pub const SNDDATAI_STATSENAB: u32 = 0x0c0c;

/// Send data completion.
pub const SNDDATAC_MODE: u32 = 0x1000;
/// Send BD selector.
pub const SNDBDS_MODE: u32 = 0x1400;
/// Send BD initiator.
pub const SNDBDI_MODE: u32 = 0x1800;
/// Send BD completion.
pub const SNDBDC_MODE: u32 = 0x1c00;

/// Receive list placement.
pub const RCVLPC_MODE: u32 = 0x2000;
pub const RCVLPC_CONFIG: u32 = 0x2010;
pub const RCVLPC_STATSCTRL: u32 = 0x2014;
pub const RCVLPC_STATSCTRL_ENABLE: u32 = 0x0000_0001;
pub const RCVLPC_STATS_ENABLE: u32 = 0x2018;

/// Receive data and receive BD initiator.
pub const RCVDBDI_MODE: u32 = 0x2400;
pub const RCVDBDI_MODE_INV_RING_SZ: u32 = 0x0000_0010;
pub const RCVDBDI_JUMBO_BD: u32 = 0x2440;
pub const RCVDBDI_STD_BD: u32 = 0x2450;
pub const RCVDBDI_MINI_BD: u32 = 0x2460;

/// Receive data completion.
pub const RCVDCC_MODE: u32 = 0x2800;

/// Receive BD initiator.
pub const RCVBDI_MODE: u32 = 0x2c00;
pub const RCVBDI_MODE_RCB_ATTN_ENAB: u32 = 0x0000_0004;
pub const RCVBDI_STD_THRESH: u32 = 0x2c18;
pub const RCVBDI_JUMBO_THRESH: u32 = 0x2c1c;

/// Receive BD completion.
pub const RCVCC_MODE: u32 = 0x3000;
/// Receive list selector.
pub const RCVLSC_MODE: u32 = 0x3400;
/// Mbuf cluster free.
pub const MBFREE_MODE: u32 = 0x3800;

// ═══════════════════════════════════════════════════════════════════════════
// HOST COALESCING
// ═══════════════════════════════════════════════════════════════════════════

pub const HOSTCC_MODE: u32 = 0x3c00;
pub const HOSTCC_MODE_ENABLE: u32 = 0x0000_0002;
pub const HOSTCC_MODE_32BYTE: u32 = 0x0000_0100;
pub const HOSTCC_RXCOL_TICKS: u32 = 0x3c08;
pub const HOSTCC_TXCOL_TICKS: u32 = 0x3c0c;
pub const HOSTCC_RXMAX_FRAMES: u32 = 0x3c10;
pub const HOSTCC_TXMAX_FRAMES: u32 = 0x3c14;
pub const HOSTCC_RXCOAL_TICK_INT: u32 = 0x3c18;
pub const HOSTCC_TXCOAL_TICK_INT: u32 = 0x3c1c;
pub const HOSTCC_RXCOAL_MAXF_INT: u32 = 0x3c20;
pub const HOSTCC_TXCOAL_MAXF_INT: u32 = 0x3c24;
pub const HOSTCC_STAT_COAL_TICKS: u32 = 0x3c28;
pub const HOSTCC_STATS_BLK_HOST_ADDR: u32 = 0x3c30;
pub const HOSTCC_STATUS_BLK_HOST_ADDR: u32 = 0x3c38;
pub const HOSTCC_STATS_BLK_NIC_ADDR: u32 = 0x3c40;
pub const HOSTCC_STATUS_BLK_NIC_ADDR: u32 = 0x3c44;

pub const LOW_RXCOL_TICKS: u32 = 0x0000_0000;
pub const LOW_TXCOL_TICKS: u32 = 0x0000_0096;
pub const LOW_RXMAX_FRAMES: u32 = 0x0000_0001;
pub const LOW_TXMAX_FRAMES: u32 = 0x0000_0005;
pub const DEFAULT_STAT_COAL_TICKS: u32 = 1_000_000;

// ═══════════════════════════════════════════════════════════════════════════
// MEMORY ARBITER / BUFFER MANAGER
// ═══════════════════════════════════════════════════════════════════════════

pub const MEMARB_MODE: u32 = 0x4000;

pub const BUFMGR_MODE: u32 = 0x4400;
pub const BUFMGR_MB_POOL_ADDR: u32 = 0x4408;
pub const BUFMGR_MB_POOL_SIZE: u32 = 0x440c;
pub const BUFMGR_MB_RDMA_LOW_WATER: u32 = 0x4410;
pub const BUFMGR_MB_MACRX_LOW_WATER: u32 = 0x4414;
pub const BUFMGR_MB_HIGH_WATER: u32 = 0x4418;
pub const BUFMGR_DMA_DESC_POOL_ADDR: u32 = 0x442c;
pub const BUFMGR_DMA_DESC_POOL_SIZE: u32 = 0x4430;
pub const BUFMGR_DMA_LOW_WATER: u32 = 0x4434;
pub const BUFMGR_DMA_HIGH_WATER: u32 = 0x4438;

pub const DEFAULT_MB_RDMA_LOW_WATER: u32 = 0x0000_0050;
pub const DEFAULT_MB_MACRX_LOW_WATER: u32 = 0x0000_0020;
pub const DEFAULT_MB_HIGH_WATER: u32 = 0x0000_0060;
pub const DEFAULT_DMA_LOW_WATER: u32 = 0x0000_0005;
pub const DEFAULT_DMA_HIGH_WATER: u32 = 0x0000_000a;

// ═══════════════════════════════════════════════════════════════════════════
// DMA ENGINES / FLOW-THROUGH QUEUES
// ═══════════════════════════════════════════════════════════════════════════

/// Read DMA engine.
pub const RDMAC_MODE: u32 = 0x4800;
pub const RDMAC_STATUS: u32 = 0x4804;
/// Write DMA engine.
pub const WDMAC_MODE: u32 = 0x4c00;
pub const WDMAC_STATUS: u32 = 0x4c04;

// Shared by RDMAC_MODE and WDMAC_MODE.
pub const DMAC_MODE_RESET: u32 = 0x0000_0001;
pub const DMAC_MODE_ENABLE: u32 = 0x0000_0002;
pub const DMAC_MODE_TGTABRT_ENAB: u32 = 0x0000_0004;
pub const DMAC_MODE_MSTABRT_ENAB: u32 = 0x0000_0008;
pub const DMAC_MODE_PARITYERR_ENAB: u32 = 0x0000_0010;
pub const DMAC_MODE_ADDROFLOW_ENAB: u32 = 0x0000_0020;
pub const DMAC_MODE_FIFOOFLOW_ENAB: u32 = 0x0000_0040;
pub const DMAC_MODE_FIFOURUN_ENAB: u32 = 0x0000_0080;
pub const DMAC_MODE_FIFOOREAD_ENAB: u32 = 0x0000_0100;
pub const DMAC_MODE_LNGREAD_ENAB: u32 = 0x0000_0200;
pub const RDMAC_MODE_SPLIT_ENABLE: u32 = 0x0000_0800;

pub const FTQ_RESET: u32 = 0x5c00;
pub const FTQ_DMA_HIGH_READ_FIFO_ENQDEQ: u32 = 0x5c28;
pub const FTQ_DMA_HIGH_WRITE_FIFO_ENQDEQ: u32 = 0x5c78;
pub const FTQ_RCVBD_COMP_FIFO_ENQDEQ: u32 = 0x5cd8;
pub const FTQ_RCVDATA_COMP_FIFO_ENQDEQ: u32 = 0x5d08;

/// DMA completion.
pub const DMAC_MODE: u32 = 0x6400;

// ═══════════════════════════════════════════════════════════════════════════
// GRC (GENERAL REGISTER CONTROL)
// ═══════════════════════════════════════════════════════════════════════════

pub const GRC_MODE: u32 = 0x6800;
pub const GRC_MODE_BSWAP_NONFRM_DATA: u32 = 0x0000_0002;
pub const GRC_MODE_WSWAP_NONFRM_DATA: u32 = 0x0000_0004;
pub const GRC_MODE_BSWAP_DATA: u32 = 0x0000_0010;
pub const GRC_MODE_WSWAP_DATA: u32 = 0x0000_0020;
pub const GRC_MODE_HOST_STACKUP: u32 = 0x0001_0000;
pub const GRC_MODE_HOST_SENDBDS: u32 = 0x0002_0000;
pub const GRC_MODE_NO_TX_PHDR_CSUM: u32 = 0x0010_0000;
pub const GRC_MODE_NO_RX_PHDR_CSUM: u32 = 0x0080_0000;
pub const GRC_MODE_IRQ_ON_MAC_ATTN: u32 = 0x0400_0000;
pub const GRC_MODE_4X_NIC_SEND_RINGS: u32 = 0x2000_0000;

pub const GRC_MISC_CFG: u32 = 0x6804;
pub const GRC_MISC_CFG_CORECLK_RESET: u32 = 0x0000_0001;
pub const GRC_MISC_CFG_PRESCALAR_SHIFT: u32 = 1;
pub const GRC_MISC_CFG_BOARD_ID_MASK: u32 = 0x0001_e000;
pub const GRC_MISC_CFG_BOARD_ID_5702FE: u32 = 0x0000_4000;
pub const GRC_MISC_CFG_BOARD_ID_5704CIOBE: u32 = 0x0000_4000;
/// Outstanding split transactions on the 5704 CIOB-E board.
pub const SPLIT_MODE_5704_MAX_REQ: u32 = 3;

pub const GRC_LOCAL_CTRL: u32 = 0x6808;
pub const GRC_LCLCTRL_INT_ON_ATTN: u32 = 0x0000_0008;
pub const GRC_LCLCTRL_GPIO_OE1: u32 = 0x0000_1000;
pub const GRC_LCLCTRL_GPIO_OUTPUT1: u32 = 0x0000_8000;
pub const GRC_LCLCTRL_AUTO_SEEPROM: u32 = 0x0100_0000;

pub const GRC_RX_CPU_EVENT: u32 = 0x6810;
pub const GRC_RX_CPU_DRIVER_EVENT: u32 = 0x0000_4000;

/// Legacy serial EEPROM state machine.
pub const GRC_EEPROM_ADDR: u32 = 0x6838;
pub const EEPROM_ADDR_WRITE: u32 = 0x0000_0000;
pub const EEPROM_ADDR_READ: u32 = 0x8000_0000;
pub const EEPROM_ADDR_COMPLETE: u32 = 0x4000_0000;
pub const EEPROM_ADDR_FSM_RESET: u32 = 0x2000_0000;
pub const EEPROM_ADDR_DEVID_MASK: u32 = 0x1c00_0000;
pub const EEPROM_ADDR_DEVID_SHIFT: u32 = 26;
pub const EEPROM_ADDR_START: u32 = 0x0200_0000;
pub const EEPROM_ADDR_CLKPERD_SHIFT: u32 = 16;
pub const EEPROM_ADDR_ADDR_MASK: u32 = 0x0000_ffff;
pub const EEPROM_DEFAULT_CLOCK_PERIOD: u32 = 0x60;
pub const GRC_EEPROM_DATA: u32 = 0x683c;

// ═══════════════════════════════════════════════════════════════════════════
// NVRAM INTERFACE
// ═══════════════════════════════════════════════════════════════════════════

pub const NVRAM_CMD: u32 = 0x7000;
pub const NVRAM_CMD_DONE: u32 = 0x0000_0008;
pub const NVRAM_CMD_GO: u32 = 0x0000_0010;
pub const NVRAM_CMD_RD: u32 = 0x0000_0000;
pub const NVRAM_CMD_FIRST: u32 = 0x0000_0080;
pub const NVRAM_CMD_LAST: u32 = 0x0000_0100;
pub const NVRAM_ADDR: u32 = 0x700c;
pub const NVRAM_ADDR_MSK: u32 = 0x00ff_ffff;
pub const NVRAM_RDDATA: u32 = 0x7010;
pub const NVRAM_CFG1: u32 = 0x7014;
pub const NVRAM_CFG1_FLASHIF_ENAB: u32 = 0x0000_0001;
pub const NVRAM_CFG1_BUFFERED_MODE: u32 = 0x0000_0002;
pub const NVRAM_CFG1_COMPAT_BYPASS: u32 = 0x8000_0000;
pub const NVRAM_SWARB: u32 = 0x7020;
pub const SWARB_REQ_SET1: u32 = 0x0000_0002;
pub const SWARB_REQ_CLR1: u32 = 0x0000_0020;
pub const SWARB_GNT1: u32 = 0x0000_0200;

/// Buffered flash page geometry.
pub const NVRAM_BUFFERED_PAGE_SIZE: u32 = 264;
pub const NVRAM_BUFFERED_PAGE_POS: u32 = 9;

// ═══════════════════════════════════════════════════════════════════════════
// NIC SRAM LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

pub const NIC_SRAM_SEND_RCB: u32 = 0x0000_0100;
pub const NIC_SRAM_RCV_RET_RCB: u32 = 0x0000_0200;
pub const NIC_SRAM_STATS_BLK: u32 = 0x0000_0300;
pub const NIC_SRAM_STATUS_BLK: u32 = 0x0000_0b00;

/// Firmware mailbox; bootcode inverts the magic when it is done.
pub const NIC_SRAM_FIRMWARE_MBOX: u32 = 0x0000_0b50;
pub const NIC_SRAM_FIRMWARE_MBOX_MAGIC1: u32 = 0x4B65_7654;
pub const NIC_SRAM_FIRMWARE_MBOX_MAGIC2: u32 = 0x4861_764b;

pub const NIC_SRAM_DATA_SIG: u32 = 0x0000_0b54;
pub const NIC_SRAM_DATA_SIG_MAGIC: u32 = 0x4B65_7654;
pub const NIC_SRAM_DATA_CFG: u32 = 0x0000_0b58;
pub const NIC_SRAM_DATA_CFG_LED_MODE_MASK: u32 = 0x0000_000c;
pub const NIC_SRAM_DATA_CFG_LED_TRIPLE_SPD: u32 = 0x0000_0004;
pub const NIC_SRAM_DATA_CFG_LED_LINK_SPD: u32 = 0x0000_0008;
pub const NIC_SRAM_DATA_CFG_PHY_TYPE_MASK: u32 = 0x0000_0030;
pub const NIC_SRAM_DATA_CFG_PHY_TYPE_FIBER: u32 = 0x0000_0020;
pub const NIC_SRAM_DATA_CFG_ASF_ENABLE: u32 = 0x0000_0080;
pub const NIC_SRAM_DATA_CFG_EEPROM_WP: u32 = 0x0000_0100;
pub const NIC_SRAM_DATA_CFG_FIBER_WOL: u32 = 0x0000_4000;
pub const NIC_SRAM_DATA_PHY_ID: u32 = 0x0000_0b74;
pub const NIC_SRAM_DATA_PHY_ID1_MASK: u32 = 0xffff_0000;
pub const NIC_SRAM_DATA_PHY_ID2_MASK: u32 = 0x0000_ffff;

pub const NIC_SRAM_FW_CMD_MBOX: u32 = 0x0000_0b78;
pub const FWCMD_NICDRV_PAUSE_FW: u32 = 0x0000_0002;

pub const NIC_SRAM_FW_DRV_STATE_MBOX: u32 = 0x0000_0c04;
pub const DRV_STATE_START: u32 = 0x0000_0001;
pub const DRV_STATE_UNLOAD: u32 = 0x0000_0002;
pub const DRV_STATE_SUSPEND: u32 = 0x0000_0004;

/// Bootcode-provided station address ("HK" signature in the high half).
pub const NIC_SRAM_MAC_ADDR_HIGH_MBOX: u32 = 0x0000_0c14;
pub const NIC_SRAM_MAC_ADDR_LOW_MBOX: u32 = 0x0000_0c18;
pub const NIC_SRAM_MAC_ADDR_SIGNATURE: u32 = 0x484b;

/// Window range cleared during reset (statistics through status block).
pub const NIC_SRAM_CLEAR_START: u32 = NIC_SRAM_STATS_BLK;
pub const NIC_SRAM_CLEAR_END: u32 = NIC_SRAM_FIRMWARE_MBOX;

pub const NIC_SRAM_DMA_DESC_POOL_BASE: u32 = 0x0000_2000;
pub const NIC_SRAM_DMA_DESC_POOL_SIZE: u32 = 0x0000_2000;
pub const NIC_SRAM_TX_BUFFER_DESC: u32 = 0x0000_4000;
pub const NIC_SRAM_RX_BUFFER_DESC: u32 = 0x0000_6000;
pub const NIC_SRAM_MBUF_POOL_BASE: u32 = 0x0000_8000;
pub const NIC_SRAM_MBUF_POOL_SIZE96: u32 = 0x0001_8000;
pub const NIC_SRAM_MBUF_POOL_SIZE64: u32 = 0x0001_0000;

// ═══════════════════════════════════════════════════════════════════════════
// BDINFO (RING CONTROL BLOCKS)
// ═══════════════════════════════════════════════════════════════════════════

pub const TG3_BDINFO_HOST_ADDR: u32 = 0x0;
pub const TG3_BDINFO_MAXLEN_FLAGS: u32 = 0x8;
pub const TG3_BDINFO_NIC_ADDR: u32 = 0xc;
pub const TG3_BDINFO_SIZE: u32 = 0x10;
pub const BDINFO_FLAGS_DISABLED: u32 = 0x0000_0002;
pub const BDINFO_FLAGS_MAXLEN_SHIFT: u32 = 16;

/// Largest frame the standard ring accepts.
pub const RX_STD_MAX_SIZE: u32 = 1536;

// ═══════════════════════════════════════════════════════════════════════════
// MII / PHY REGISTERS
// ═══════════════════════════════════════════════════════════════════════════

pub const PHY_ADDR: u32 = 0x01;

pub const MII_BMCR: u32 = 0x00;
pub const BMCR_RESET: u32 = 0x8000;
pub const BMCR_ANENABLE: u32 = 0x1000;
pub const BMCR_ANRESTART: u32 = 0x0200;
pub const MII_BMSR: u32 = 0x01;
pub const BMSR_LSTATUS: u32 = 0x0004;
pub const MII_PHYSID1: u32 = 0x02;
pub const MII_PHYSID2: u32 = 0x03;
pub const MII_ADVERTISE: u32 = 0x04;
pub const ADVERTISE_CSMA: u32 = 0x0001;
pub const ADVERTISE_10HALF: u32 = 0x0020;
pub const ADVERTISE_10FULL: u32 = 0x0040;
pub const ADVERTISE_100HALF: u32 = 0x0080;
pub const ADVERTISE_100FULL: u32 = 0x0100;
pub const ADVERTISE_PAUSE_CAP: u32 = 0x0400;
pub const ADVERTISE_PAUSE_ASYM: u32 = 0x0800;
pub const MII_LPA: u32 = 0x05;
pub const LPA_PAUSE_CAP: u32 = 0x0400;
pub const LPA_PAUSE_ASYM: u32 = 0x0800;

/// 1000BASE-T control.
pub const MII_TG3_CTRL: u32 = 0x09;
pub const MII_TG3_CTRL_ADV_1000_HALF: u32 = 0x0100;
pub const MII_TG3_CTRL_ADV_1000_FULL: u32 = 0x0200;
pub const MII_TG3_CTRL_AS_MASTER: u32 = 0x0800;
pub const MII_TG3_CTRL_ENABLE_AS_MASTER: u32 = 0x1000;

pub const MII_TG3_EXT_CTRL: u32 = 0x10;
pub const MII_TG3_EXT_CTRL_LNK3_LED_MODE: u32 = 0x0002;
pub const MII_TG3_DSP_RW_PORT: u32 = 0x15;
pub const MII_TG3_DSP_ADDRESS: u32 = 0x17;
pub const MII_TG3_AUX_CTRL: u32 = 0x18;

pub const MII_TG3_AUX_STAT: u32 = 0x19;
pub const MII_TG3_AUX_STAT_SPDMASK: u32 = 0x0700;
pub const MII_TG3_AUX_STAT_10HALF: u32 = 0x0100;
pub const MII_TG3_AUX_STAT_10FULL: u32 = 0x0200;
pub const MII_TG3_AUX_STAT_100HALF: u32 = 0x0300;
pub const MII_TG3_AUX_STAT_100_4: u32 = 0x0400;
pub const MII_TG3_AUX_STAT_100FULL: u32 = 0x0500;
pub const MII_TG3_AUX_STAT_1000HALF: u32 = 0x0600;
pub const MII_TG3_AUX_STAT_1000FULL: u32 = 0x0700;

pub const MII_TG3_ISTAT: u32 = 0x1a;
pub const MII_TG3_IMASK: u32 = 0x1b;
pub const MII_TG3_INT_LINKCHG: u32 = 0x0002;

// ═══════════════════════════════════════════════════════════════════════════
// PHY IDS
// ═══════════════════════════════════════════════════════════════════════════

pub const PHY_ID_MASK: u32 = 0xffff_fff0;
pub const PHY_REV_MASK: u32 = 0x0000_000f;
pub const PHY_REV_BCM5401_B0: u32 = 0x1;
pub const PHY_ID_BCM5400: u32 = 0x6000_8040;
pub const PHY_ID_BCM5401: u32 = 0x6000_8050;
pub const PHY_ID_BCM5411: u32 = 0x6000_8070;
pub const PHY_ID_BCM5701: u32 = 0x6000_8110;
pub const PHY_ID_BCM5703: u32 = 0x6000_8160;
pub const PHY_ID_BCM5704: u32 = 0x6000_8190;
pub const PHY_ID_BCM8002: u32 = 0x6001_0140;
pub const PHY_ID_SERDES: u32 = 0xfeed_bee0;
pub const PHY_ID_INVALID: u32 = 0xffff_ffff;

// ═══════════════════════════════════════════════════════════════════════════
// PCI VENDORS (SUBSYSTEM TABLE)
// ═══════════════════════════════════════════════════════════════════════════

pub const PCI_VENDOR_ID_BROADCOM: u16 = 0x14e4;
pub const PCI_VENDOR_ID_3COM: u16 = 0x10b7;
pub const PCI_VENDOR_ID_DELL: u16 = 0x1028;
pub const PCI_VENDOR_ID_COMPAQ: u16 = 0x0e11;
pub const PCI_VENDOR_ID_SYSKONNECT: u16 = 0x1148;
pub const PCI_VENDOR_ID_ALTIMA: u16 = 0x173b;
