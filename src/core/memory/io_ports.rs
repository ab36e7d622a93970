// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Hardware window operations
//!
//! Pages 0x1F80, 0x9F80 and 0xBF80 bypass the page tables. The first 1KB is
//! the scratchpad, stored at the start of the hardware window buffer in guest
//! byte order. Everything above it is forwarded to the attached
//! [`HardwareRegisters`] collaborator with the full guest address.
//!
//! When no collaborator is attached, register reads return zero and writes
//! are dropped, each with a warning.

use super::endian::{self, GuestWord};
use super::io_device::HardwareRegisters;
use super::region::SCRATCHPAD_SIZE;
use super::Memory;
use std::cell::RefCell;
use std::rc::Rc;

/// Hardware register collaborator shared with the rest of the system
pub type SharedRegisters = Rc<RefCell<dyn HardwareRegisters>>;

/// Forward a register read of width `T`
pub(super) fn read_register<T: GuestWord>(registers: Option<&SharedRegisters>, addr: u32) -> T {
    let Some(registers) = registers else {
        log::warn!(
            "Hardware register read{} at 0x{:08X} before registers attached",
            T::SIZE * 8,
            addr
        );
        return T::default();
    };

    let mut regs = registers.borrow_mut();
    let value = match T::SIZE {
        1 => regs.read8(addr) as u32,
        2 => regs.read16(addr) as u32,
        _ => regs.read32(addr),
    };
    log::trace!(
        "{} read{} at 0x{:08X} -> 0x{:08X}",
        regs.name(),
        T::SIZE * 8,
        addr,
        value
    );
    T::from_u32(value)
}

/// Forward a register write of width `T`
pub(super) fn write_register<T: GuestWord>(
    registers: Option<&SharedRegisters>,
    addr: u32,
    value: T,
) {
    let Some(registers) = registers else {
        log::warn!(
            "Hardware register write{} at 0x{:08X} = 0x{:X} before registers attached",
            T::SIZE * 8,
            addr,
            value
        );
        return;
    };

    let mut regs = registers.borrow_mut();
    let raw = value.to_u32();
    log::trace!(
        "{} write{} at 0x{:08X} = 0x{:08X}",
        regs.name(),
        T::SIZE * 8,
        addr,
        raw
    );
    match T::SIZE {
        1 => regs.write8(addr, raw as u8),
        2 => regs.write16(addr, raw as u16),
        _ => regs.write32(addr, raw),
    }
}

impl Memory {
    /// Read from the hardware window (scratchpad or registers)
    #[inline(always)]
    pub(super) fn read_hardware_window<T: GuestWord>(&self, addr: u32) -> T {
        let offset = addr & 0xFFFF;
        if offset < SCRATCHPAD_SIZE {
            endian::load(&self.hardware, offset as usize, false)
        } else {
            read_register(self.hardware_registers.as_ref(), addr)
        }
    }

    /// Write to the hardware window (scratchpad or registers)
    #[inline(always)]
    pub(super) fn write_hardware_window<T: GuestWord>(&mut self, addr: u32, value: T) {
        let offset = addr & 0xFFFF;
        if offset < SCRATCHPAD_SIZE {
            endian::store(&mut self.hardware, offset as usize, value, false);
        } else {
            write_register(self.hardware_registers.as_ref(), addr, value);
        }
    }
}
