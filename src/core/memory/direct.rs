// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table-free access path used by the translating backend
//!
//! Translated code reaches RAM through its own base pointers and only calls
//! back here for the parallel port, the hardware window and the BIOS. These
//! accessors decode the physical page directly:
//!
//! | Page    | Read                                   | Write                   |
//! |---------|----------------------------------------|-------------------------|
//! | 0x1F80  | offset < 0x1000: hardware buffer, else registers | same          |
//! | 0x1F00  | parallel port                          | parallel port           |
//! | other   | BIOS at `offset \| (addr & 0x70000)`   | parallel port           |
//!
//! Values are stored in host byte order and the cache control register is
//! not decoded. Accesses that would run past the end of a buffer read zero
//! and are dropped on write.

use super::endian::GuestWord;
use super::io_ports::{read_register, write_register, SharedRegisters};
use super::region::PARALLEL_PAGE;
use super::Memory;

/// Hardware window page recognised by the direct path
const HARDWARE_PAGE: u32 = 0x1F80;

/// Part of the hardware window served from the buffer
const HARDWARE_BUFFER_LIMIT: usize = 0x1000;

/// Buffers borrowed from [`Memory`] for direct access
pub struct DirectHandle<'a> {
    parallel: &'a mut [u8],
    hardware: &'a mut [u8],
    bios: &'a [u8],
    registers: Option<SharedRegisters>,
}

impl Memory {
    /// Borrow the buffers used by the direct path
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::{direct, Memory};
    ///
    /// let mut memory = Memory::new(&MemoryConfig::default()).unwrap();
    /// let mut handle = memory.direct_handle();
    ///
    /// direct::write16(0x1F00_0010, 0xBEEF, &mut handle);
    /// assert_eq!(direct::read16(0x1F00_0010, &handle), 0xBEEF);
    /// ```
    pub fn direct_handle(&mut self) -> DirectHandle<'_> {
        DirectHandle {
            parallel: &mut self.parallel,
            hardware: &mut self.hardware,
            bios: &self.bios,
            registers: self.hardware_registers.clone(),
        }
    }
}

/// Read 8-bit value through the direct path
pub fn read8(addr: u32, handle: &DirectHandle) -> u8 {
    read(addr, handle)
}

/// Read 16-bit value through the direct path
pub fn read16(addr: u32, handle: &DirectHandle) -> u16 {
    read(addr, handle)
}

/// Read 32-bit value through the direct path
pub fn read32(addr: u32, handle: &DirectHandle) -> u32 {
    read(addr, handle)
}

/// Write 8-bit value through the direct path
pub fn write8(addr: u32, value: u8, handle: &mut DirectHandle) {
    write(addr, value, handle)
}

/// Write 16-bit value through the direct path
pub fn write16(addr: u32, value: u16, handle: &mut DirectHandle) {
    write(addr, value, handle)
}

/// Write 32-bit value through the direct path
pub fn write32(addr: u32, value: u32, handle: &mut DirectHandle) {
    write(addr, value, handle)
}

fn read<T: GuestWord>(addr: u32, handle: &DirectHandle) -> T {
    let page = addr >> 16;
    let offset = (addr & 0xFFFF) as usize;

    match page {
        HARDWARE_PAGE if offset < HARDWARE_BUFFER_LIMIT => load_host(handle.hardware, offset),
        HARDWARE_PAGE => read_register(handle.registers.as_ref(), addr),
        PARALLEL_PAGE => load_host(handle.parallel, offset),
        _ => load_host(handle.bios, offset | (addr & 0x7_0000) as usize),
    }
}

fn write<T: GuestWord>(addr: u32, value: T, handle: &mut DirectHandle) {
    let page = addr >> 16;
    let offset = (addr & 0xFFFF) as usize;

    match page {
        HARDWARE_PAGE if offset < HARDWARE_BUFFER_LIMIT => {
            store_host(handle.hardware, offset, value)
        }
        HARDWARE_PAGE => write_register(handle.registers.as_ref(), addr, value),
        _ => store_host(handle.parallel, offset, value),
    }
}

#[inline(always)]
fn load_host<T: GuestWord>(buf: &[u8], index: usize) -> T {
    buf.get(index..index + T::SIZE)
        .map(T::load_host)
        .unwrap_or_default()
}

#[inline(always)]
fn store_host<T: GuestWord>(buf: &mut [u8], index: usize, value: T) {
    match buf.get_mut(index..index + T::SIZE) {
        Some(bytes) => value.store_host(bytes),
        None => log::trace!("Direct write past end of buffer at 0x{:04X} dropped", index),
    }
}
