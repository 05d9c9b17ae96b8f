//! Simulated Tigon3 for unit tests.
//!
//! Models the parts of the chip the driver talks to: the BAR0 register
//! file (with offsets below 0x100 aliasing config space), the indirect
//! register and SRAM windows, an MII-attached PHY, the NVRAM and EEPROM
//! state machines and the bootcode firmware handshake. Every write is
//! appended to an access log so tests can assert ordering.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use super::hw::{Tg3Bus, Tg3Regs};
use super::regs::*;
use crate::pci::{PciConfig, PCI_CAP_ID_PM, PCI_CAPABILITY_LIST, PCI_STATUS_CAP_LIST};
use crate::time::Delay;

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Direct BAR0 write.
    Mmio { off: u32, val: u32 },
    /// Register write through the indirect window.
    Reg { off: u32, val: u32 },
    /// SRAM write through the memory window.
    Sram { off: u32, val: u32 },
    /// Any other config-space write.
    Config { off: u8, val: u32 },
}

/// Config offset of the power-management capability in the sim.
pub const SIM_PM_CAP: u8 = 0x48;

pub struct SimState {
    config: [u32; 64],
    regs: HashMap<u32, u32>,
    sram: HashMap<u32, u32>,
    pinned: HashMap<u32, u32>,
    /// NVRAM/EEPROM contents as the driver should see them.
    pub nvram: HashMap<u32, u32>,
    pub phy: [u16; 32],
    pub log: Vec<Access>,
    reg_base: u32,
    mem_win: u32,
    nvram_busy: bool,
    /// Bootcode inverts the magic on this many-th read (None: never).
    pub fw_ack_after: Option<u32>,
    /// Firmware mailbox reads since the last magic write.
    pub fw_polls: u32,
    /// MII frames never complete.
    pub mii_stuck: bool,
    /// Frames addressing this PHY register never complete.
    pub mii_stuck_reg: Option<u32>,
    pub function: u8,
}

impl SimState {
    fn new() -> Self {
        let mut s = Self {
            config: [0; 64],
            regs: HashMap::new(),
            sram: HashMap::new(),
            pinned: HashMap::new(),
            nvram: HashMap::new(),
            phy: [0; 32],
            log: Vec::new(),
            reg_base: 0,
            mem_win: 0,
            nvram_busy: false,
            fw_ack_after: Some(1),
            fw_polls: 0,
            mii_stuck: false,
            mii_stuck_reg: None,
            function: 0,
        };
        // Broadcom 5704, conventional PCI, PM capability at 0x48.
        s.config[0] = 0x1648_14e4;
        s.config[1] = (PCI_STATUS_CAP_LIST as u32) << 16 | 0x0006;
        s.config[PCI_CAPABILITY_LIST as usize / 4] = SIM_PM_CAP as u32;
        s.config[SIM_PM_CAP as usize / 4] = PCI_CAP_ID_PM as u32 | 0x0002_0000;
        s.set_chip_rev(0x2003);
        s.config[TG3PCI_PCISTATE as usize / 4] = PCISTATE_CONV_PCI_MODE;
        s
    }

    pub fn set_chip_rev(&mut self, rev: u32) {
        let i = TG3PCI_MISC_HOST_CTRL as usize / 4;
        self.config[i] = (self.config[i] & 0xffff) | rev << MISC_HOST_CTRL_CHIPREV_SHIFT;
    }

    pub fn config(&self, off: u8) -> u32 {
        self.config[off as usize / 4]
    }

    pub fn set_config(&mut self, off: u8, val: u32) {
        self.config[off as usize / 4] = val;
    }

    /// Current register value (as the chip holds it).
    pub fn reg(&self, off: u32) -> u32 {
        if off < 0x100 {
            return self.config[off as usize / 4];
        }
        self.regs.get(&off).copied().unwrap_or(0)
    }

    pub fn set_reg(&mut self, off: u32, val: u32) {
        if off < 0x100 {
            self.config[off as usize / 4] = val;
        } else {
            self.regs.insert(off, val);
        }
    }

    /// Reads of `off` return `val` no matter what is written.
    pub fn pin(&mut self, off: u32, val: u32) {
        self.pinned.insert(off, val);
    }

    pub fn sram(&self, off: u32) -> u32 {
        self.sram.get(&off).copied().unwrap_or(0)
    }

    pub fn set_sram(&mut self, off: u32, val: u32) {
        self.sram.insert(off, val);
    }

    /// Values written to config offset `off`, in order.
    pub fn config_writes(&self, off: u8) -> Vec<u32> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Config { off: o, val } if o == off => Some(val),
                _ => None,
            })
            .collect()
    }

    /// Values written to register `off` (indirect or direct), in order.
    pub fn reg_writes(&self, off: u32) -> Vec<u32> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Reg { off: o, val } | Access::Mmio { off: o, val } if o == off => {
                    Some(val)
                }
                _ => None,
            })
            .collect()
    }

    /// Position in the log of the first write matching `pred`.
    pub fn position(&self, pred: impl Fn(&Access) -> bool) -> Option<usize> {
        self.log.iter().position(pred)
    }

    fn read_reg(&mut self, off: u32) -> u32 {
        if let Some(&v) = self.pinned.get(&off) {
            return v;
        }
        let v = self.reg(off);
        if off == NVRAM_CMD && self.nvram_busy {
            self.nvram_busy = false;
            self.regs.insert(NVRAM_CMD, NVRAM_CMD_DONE);
        }
        v
    }

    fn write_reg(&mut self, off: u32, val: u32) {
        match off {
            o if o == TG3PCI_MISC_HOST_CTRL as u32 => {
                let i = o as usize / 4;
                self.config[i] = (self.config[i] & MISC_HOST_CTRL_CHIPREV) | (val & 0xffff);
            }
            MAC_MI_COM => self.mii_frame(val),
            NVRAM_SWARB => {
                let grant = if val & SWARB_REQ_SET1 != 0 { SWARB_GNT1 } else { 0 };
                self.regs.insert(off, grant);
            }
            NVRAM_CMD => {
                if val & NVRAM_CMD_GO != 0 {
                    let addr = self.reg(NVRAM_ADDR);
                    let word = self.nvram.get(&addr).copied().unwrap_or(0);
                    self.regs.insert(NVRAM_RDDATA, word.swap_bytes());
                    self.nvram_busy = true;
                }
                self.regs.insert(off, 0);
            }
            GRC_EEPROM_ADDR => {
                if val & EEPROM_ADDR_START != 0 {
                    let addr = val & EEPROM_ADDR_ADDR_MASK;
                    let word = self.nvram.get(&addr).copied().unwrap_or(0);
                    self.regs.insert(GRC_EEPROM_DATA, word);
                    self.regs
                        .insert(off, (val & !EEPROM_ADDR_START) | EEPROM_ADDR_COMPLETE);
                } else {
                    self.regs.insert(off, val);
                }
            }
            GRC_RX_CPU_EVENT => {
                // RX CPU firmware acknowledges driver events at once.
                self.regs.insert(off, val & !GRC_RX_CPU_DRIVER_EVENT);
            }
            _ => self.set_reg(off, val),
        }
    }

    fn mii_frame(&mut self, frame: u32) {
        let reg = ((frame & MI_COM_REG_ADDR_MASK) >> MI_COM_REG_ADDR_SHIFT) as usize;
        if self.mii_stuck || self.mii_stuck_reg == Some(reg as u32) {
            self.regs.insert(MAC_MI_COM, frame | MI_COM_BUSY);
            return;
        }
        if frame & MI_COM_CMD_READ != 0 {
            let data = self.phy[reg] as u32;
            self.regs.insert(MAC_MI_COM, (frame & !(MI_COM_BUSY | MI_COM_DATA_MASK)) | data);
        } else {
            let mut data = (frame & MI_COM_DATA_MASK) as u16;
            if reg == MII_BMCR as usize {
                data &= !(BMCR_RESET as u16);
            }
            self.phy[reg] = data;
            self.regs.insert(MAC_MI_COM, frame & !MI_COM_BUSY);
        }
    }

    fn read_sram(&mut self, off: u32) -> u32 {
        let v = self.sram(off);
        if off == NIC_SRAM_FIRMWARE_MBOX && v == NIC_SRAM_FIRMWARE_MBOX_MAGIC1 {
            self.fw_polls += 1;
            if let Some(n) = self.fw_ack_after {
                if self.fw_polls >= n {
                    self.sram.insert(off, !NIC_SRAM_FIRMWARE_MBOX_MAGIC1);
                    return !NIC_SRAM_FIRMWARE_MBOX_MAGIC1;
                }
            }
        }
        v
    }

    fn write_sram(&mut self, off: u32, val: u32) {
        if off == NIC_SRAM_FIRMWARE_MBOX {
            self.fw_polls = 0;
        }
        self.sram.insert(off, val);
    }
}

/// Shared handle to a simulated device.
#[derive(Clone)]
pub struct Sim {
    state: Rc<RefCell<SimState>>,
    delays: Rc<RefCell<DelayLog>>,
}

impl Sim {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState::new())),
            delays: Rc::new(RefCell::new(DelayLog::default())),
        }
    }

    pub fn state(&self) -> Ref<'_, SimState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, SimState> {
        self.state.borrow_mut()
    }

    pub fn delays(&self) -> Ref<'_, DelayLog> {
        self.delays.borrow()
    }

    pub fn bus(&self) -> SimBus {
        SimBus { state: self.state.clone() }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay { log: self.delays.clone() }
    }

    pub fn regs(&self) -> Tg3Regs<SimBus, SimDelay> {
        Tg3Regs::new(self.bus(), self.delay())
    }
}

pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl PciConfig for SimBus {
    fn read_config32(&mut self, offset: u8) -> u32 {
        let mut s = self.state.borrow_mut();
        match offset & !3 {
            TG3PCI_REG_DATA => {
                let off = s.reg_base;
                s.read_reg(off)
            }
            TG3PCI_MEM_WIN_DATA => {
                let off = s.mem_win;
                s.read_sram(off)
            }
            o => s.config[o as usize / 4],
        }
    }

    fn write_config32(&mut self, offset: u8, value: u32) {
        let mut s = self.state.borrow_mut();
        match offset & !3 {
            TG3PCI_REG_DATA => {
                let off = s.reg_base;
                s.log.push(Access::Reg { off, val: value });
                s.write_reg(off, value);
            }
            TG3PCI_MEM_WIN_DATA => {
                let off = s.mem_win;
                s.log.push(Access::Sram { off, val: value });
                s.write_sram(off, value);
            }
            o => {
                s.log.push(Access::Config { off: o, val: value });
                if o == TG3PCI_REG_BASE_ADDR {
                    s.reg_base = value;
                } else if o == TG3PCI_MEM_WIN_BASE_ADDR {
                    s.mem_win = value;
                }
                if o == TG3PCI_MISC_HOST_CTRL {
                    s.write_reg(o as u32, value);
                } else {
                    s.config[o as usize / 4] = value;
                }
            }
        }
    }

    fn function(&self) -> u8 {
        self.state.borrow().function
    }
}

impl Tg3Bus for SimBus {
    fn mmio_read32(&mut self, offset: u32) -> u32 {
        self.state.borrow_mut().read_reg(offset)
    }

    fn mmio_write32(&mut self, offset: u32, value: u32) {
        let mut s = self.state.borrow_mut();
        s.log.push(Access::Mmio { off: offset, val: value });
        s.write_reg(offset, value);
    }

    fn mmio_read16(&mut self, offset: u32) -> u16 {
        let v = self.state.borrow_mut().read_reg(offset & !3);
        (v >> ((offset & 2) * 8)) as u16
    }

    fn mmio_write16(&mut self, offset: u32, value: u16) {
        let mut s = self.state.borrow_mut();
        let shift = (offset & 2) * 8;
        let merged = (s.reg(offset & !3) & !(0xffff << shift)) | (value as u32) << shift;
        s.log.push(Access::Mmio { off: offset & !3, val: merged });
        s.write_reg(offset & !3, merged);
    }

    fn mmio_read8(&mut self, offset: u32) -> u8 {
        let v = self.state.borrow_mut().read_reg(offset & !3);
        (v >> ((offset & 3) * 8)) as u8
    }

    fn mmio_write8(&mut self, offset: u32, value: u8) {
        let mut s = self.state.borrow_mut();
        let shift = (offset & 3) * 8;
        let merged = (s.reg(offset & !3) & !(0xff << shift)) | (value as u32) << shift;
        s.log.push(Access::Mmio { off: offset & !3, val: merged });
        s.write_reg(offset & !3, merged);
    }
}

/// Recorded delays.
#[derive(Default)]
pub struct DelayLog {
    pub total_us: u64,
    by_interval: HashMap<u32, u64>,
}

impl DelayLog {
    /// Number of `udelay(us)` calls seen.
    pub fn count(&self, us: u32) -> u64 {
        self.by_interval.get(&us).copied().unwrap_or(0)
    }
}

pub struct SimDelay {
    log: Rc<RefCell<DelayLog>>,
}

impl Delay for SimDelay {
    fn udelay(&mut self, us: u32) {
        let mut log = self.log.borrow_mut();
        log.total_us += us as u64;
        *log.by_interval.entry(us).or_insert(0) += 1;
    }
}
