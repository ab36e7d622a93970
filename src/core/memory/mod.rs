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

//! Memory subsystem for the PlayStation 1
//!
//! [`Memory`] owns every backing buffer and the two page tables, and is the
//! entry point for all guest loads and stores issued by the interpreter.
//! Translated code uses the guard-relative accessors or the table-free
//! [`direct`] path instead.
//!
//! # Memory Map
//!
//! | Guest Address Range     | Region            | Size   | Access |
//! |-------------------------|-------------------|--------|--------|
//! | 0x00000000-0x001FFFFF   | RAM               | 2MB    | R/W    |
//! | 0x80000000-0x801FFFFF   | RAM (KSEG0)       | 2MB    | R/W    |
//! | 0xA0000000-0xA01FFFFF   | RAM (KSEG1)       | 2MB    | R/W    |
//! | 0x1F000000-0x1F00FFFF   | Parallel port     | 64KB   | R/W    |
//! | 0x1F800000-0x1F8003FF   | Scratchpad        | 1KB    | R/W    |
//! | 0x1F801000-0x1F802FFF   | Hardware regs     | 8KB    | R/W    |
//! | 0x1FC00000-0x1FC7FFFF   | BIOS ROM          | 512KB  | R only |
//! | 0xFFFE0130              | Cache control     | 4B     | W only |
//!
//! The BIOS is also mirrored at 0x9FC00000 and 0xBFC00000, and the 2MB RAM
//! image repeats through the first 8MB of each segment.
//!
//! # Dispatch
//!
//! Every address is decoded into a 16-bit page and a 16-bit offset. The
//! hardware window pages are routed to the scratchpad or to the attached
//! [`HardwareRegisters`]; everything else goes through the read or write
//! page table. Unmapped reads return zero, unmapped writes are dropped.
//!
//! # Example
//!
//! ```
//! use psxmem::core::config::MemoryConfig;
//! use psxmem::core::memory::Memory;
//!
//! let mut memory = Memory::new(&MemoryConfig::default()).unwrap();
//!
//! // Write to RAM via KSEG0
//! memory.write32(0x80000000, 0x12345678);
//!
//! // Read from same location via different segment (should mirror)
//! assert_eq!(memory.read32(0x00000000), 0x12345678);
//! assert_eq!(memory.read32(0xA0000000), 0x12345678);
//! ```

use crate::core::config::MemoryConfig;
use crate::core::error::{EmulatorError, Result};

// Sub-modules
mod bios;
mod cache;
pub mod direct;
mod endian;
mod io_device;
mod io_ports;
mod mirror;
mod page_table;
mod region;
#[cfg(test)]
mod tests;

// Re-export public types
pub use bios::{BootOutcome, HleReason};
pub use cache::{CacheState, SharedInvalidator};
pub use direct::DirectHandle;
pub use endian::{Endian, GuestWord, GUEST_ENDIAN};
pub use io_device::{CodeInvalidator, HardwareRegisters};
pub use io_ports::SharedRegisters;
#[cfg(feature = "aliased-ram")]
pub use mirror::MappedRam;
pub use mirror::{create_backing, HeapRam, RamBacking};
pub use region::{
    identify_region, MemoryRegion, Segment, BIOS_SIZE, CACHE_CONTROL, GUARD_SIZE, HARDWARE_SIZE,
    PARALLEL_SIZE, RAM_SIZE, SCRATCHPAD_SIZE,
};

use page_table::{Buffer, PageTables};
use region::{is_hardware_page, PAGE_SIZE, RAM_MASK};

/// PlayStation memory subsystem
///
/// Owns main RAM (through a [`RamBacking`]), the parallel port window, the
/// hardware window, the BIOS ROM and the zero sink used for unmapped reads.
/// Loads and stores never fail.
pub struct Memory {
    /// Main RAM (2MB), viewed per segment
    ram: Box<dyn RamBacking>,

    /// Parallel port window (64KB)
    ///
    /// Guest address: 0x1F000000-0x1F00FFFF
    parallel: Vec<u8>,

    /// Hardware window (64KB)
    ///
    /// The first 1KB is the scratchpad. The direct path also uses the rest
    /// of the first 4KB as plain storage.
    hardware: Vec<u8>,

    /// BIOS ROM (512KB)
    ///
    /// Guest address: 0x1FC00000-0x1FC7FFFF
    bios: Vec<u8>,

    /// All-zero page backing every unmapped read
    null_sink: Vec<u8>,

    /// Read and write page tables
    tables: PageTables,

    /// RAM write state driven by the cache control register
    cache_state: CacheState,

    /// Last value written to 0xFFFE0130
    cache_control: u32,

    /// Hardware register collaborator (DMA, timers, GPU, SPU, ...)
    hardware_registers: Option<SharedRegisters>,

    /// Translated code cache notified on every store
    code_invalidator: Option<SharedInvalidator>,
}

impl Memory {
    /// Allocate all buffers and build the page tables
    ///
    /// The RAM mirroring strategy is taken from `config.mirror`. A failed
    /// aliased mapping degrades to table mirrors with a warning.
    ///
    /// # Arguments
    ///
    /// * `config` - Memory configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Memory)` with every buffer zeroed and RAM write-enabled
    /// - `Err(EmulatorError::AllocationFailure)` if any buffer or table
    ///   cannot be allocated
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::Memory;
    ///
    /// let memory = Memory::new(&MemoryConfig::default()).unwrap();
    /// assert!(memory.is_write_enabled());
    /// ```
    pub fn new(config: &MemoryConfig) -> Result<Self> {
        let ram = mirror::create_backing(config.mirror)?;

        let memory = Self {
            ram,
            parallel: alloc_buffer("parallel port", PARALLEL_SIZE)?,
            hardware: alloc_buffer("hardware window", HARDWARE_SIZE)?,
            bios: alloc_buffer("BIOS", BIOS_SIZE)?,
            null_sink: alloc_buffer("null sink", PAGE_SIZE)?,
            tables: PageTables::new()?,
            cache_state: CacheState::WriteEnabled,
            cache_control: 0,
            hardware_registers: None,
            code_invalidator: None,
        };

        log::info!("Memory initialized ({} mirrors)", memory.mirror_name());
        Ok(memory)
    }

    /// Release all buffers and mappings
    ///
    /// Equivalent to dropping the instance; aliased mappings are unmapped
    /// before their backing file is closed.
    pub fn shutdown(self) {
        log::debug!("Memory shut down ({} mirrors)", self.mirror_name());
    }

    /// Attach the hardware register collaborator
    ///
    /// Accesses above the scratchpad in the hardware window are forwarded
    /// to it. Until one is attached they read zero and are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::{HardwareRegisters, Memory};
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// struct Status;
    ///
    /// impl HardwareRegisters for Status {
    ///     fn read32(&mut self, _addr: u32) -> u32 {
    ///         0x1C00_0000
    ///     }
    ///     fn write32(&mut self, _addr: u32, _value: u32) {}
    /// }
    ///
    /// let mut memory = Memory::new(&MemoryConfig::default()).unwrap();
    /// memory.set_hardware_registers(Rc::new(RefCell::new(Status)));
    /// assert_eq!(memory.read32(0x1F80_1814), 0x1C00_0000);
    /// ```
    pub fn set_hardware_registers(&mut self, registers: SharedRegisters) {
        self.hardware_registers = Some(registers);
    }

    /// Attach the code invalidation collaborator
    pub fn set_code_invalidator(&mut self, invalidator: SharedInvalidator) {
        self.code_invalidator = Some(invalidator);
    }

    /// Name of the active RAM mirroring strategy
    pub fn mirror_name(&self) -> &'static str {
        self.ram.name()
    }

    /// Read 8-bit value from memory
    #[inline(always)]
    pub fn read8(&self, addr: u32) -> u8 {
        self.read(addr)
    }

    /// Read 16-bit value from memory
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::Memory;
    ///
    /// let mut memory = Memory::new(&MemoryConfig::default()).unwrap();
    /// memory.write16(0x80000000, 0x1234);
    /// assert_eq!(memory.read16(0x80000000), 0x1234);
    /// assert_eq!(memory.read8(0x80000000), 0x34);
    /// ```
    #[inline(always)]
    pub fn read16(&self, addr: u32) -> u16 {
        self.read(addr)
    }

    /// Read 32-bit value from memory
    #[inline(always)]
    pub fn read32(&self, addr: u32) -> u32 {
        self.read(addr)
    }

    /// Write 8-bit value to memory
    #[inline(always)]
    pub fn write8(&mut self, addr: u32, value: u8) {
        self.write(addr, value)
    }

    /// Write 16-bit value to memory
    #[inline(always)]
    pub fn write16(&mut self, addr: u32, value: u16) {
        self.write(addr, value)
    }

    /// Write 32-bit value to memory
    ///
    /// A 32-bit write to [`CACHE_CONTROL`] drives cache isolation.
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::Memory;
    ///
    /// let mut memory = Memory::new(&MemoryConfig::default()).unwrap();
    /// memory.write32(0xFFFE0130, 0x800);
    /// memory.write32(0x00001000, 0xDEADBEEF);
    /// assert_eq!(memory.read32(0x00001000), 0);
    /// ```
    #[inline(always)]
    pub fn write32(&mut self, addr: u32, value: u32) {
        self.write(addr, value)
    }

    #[inline(always)]
    fn read<T: GuestWord>(&self, addr: u32) -> T {
        let page = addr >> 16;
        if is_hardware_page(page) {
            return self.read_hardware_window(addr);
        }

        let entry = self.tables.read_entry(page);
        let index = (entry.base + (addr & 0xFFFF)) as usize;
        match entry.buffer {
            Buffer::Ram => endian::load(self.ram.view(Segment::of_page(page)), index, true),
            Buffer::Parallel => endian::load(&self.parallel, index, false),
            Buffer::Hardware => endian::load(&self.hardware, index, false),
            Buffer::Rom => endian::load(&self.bios, index, false),
            Buffer::NullSink => {
                log::trace!("Unmapped read{} at 0x{:08X}", T::SIZE * 8, addr);
                endian::load(&self.null_sink, index, false)
            }
        }
    }

    #[inline(always)]
    fn write<T: GuestWord>(&mut self, addr: u32, value: T) {
        let page = addr >> 16;
        if is_hardware_page(page) {
            self.write_hardware_window(addr, value);
            return;
        }

        let Some(entry) = self.tables.write_entry(page) else {
            self.write_unmapped(addr, value);
            return;
        };

        let index = (entry.base + (addr & 0xFFFF)) as usize;
        match entry.buffer {
            Buffer::Ram => {
                endian::store(self.ram.view_mut(Segment::of_page(page)), index, value, true)
            }
            Buffer::Parallel => endian::store(&mut self.parallel, index, value, false),
            Buffer::Hardware => endian::store(&mut self.hardware, index, value, false),
            Buffer::Rom | Buffer::NullSink => {
                log::trace!("Write to read-only page at 0x{:08X} ignored", addr);
                return;
            }
        }

        let word = if T::SIZE == 4 { addr } else { addr & !3 };
        self.notify_code_write(word, 1);
    }

    #[cold]
    fn write_unmapped<T: GuestWord>(&mut self, addr: u32, value: T) {
        if T::SIZE == 4 && addr == CACHE_CONTROL {
            self.write_cache_control(value.to_u32());
            return;
        }

        log::trace!(
            "Unmapped write{} at 0x{:08X} = 0x{:X} dropped",
            T::SIZE * 8,
            addr,
            value
        );

        // Translated code may still hold the value the store would have replaced
        if T::SIZE == 4 && !self.is_write_enabled() {
            self.notify_code_write(addr, 1);
        }
    }

    /// Read a word relative to a RAM mirror base address
    ///
    /// `base + disp` may leave the segment by up to 64KB on either side; such
    /// accesses resolve into the opposite end of RAM, the way a guard mapping
    /// would. Anything further away goes through the page tables.
    ///
    /// # Arguments
    ///
    /// * `base` - Guest address inside a RAM mirror (e.g. 0x80000000)
    /// * `disp` - Signed displacement from `base`
    pub fn read32_ram_relative(&self, base: u32, disp: i32) -> u32 {
        if self.tables.read_entry(base >> 16).buffer == Buffer::Ram {
            let offset = (base & RAM_MASK) as i64 + disp as i64;
            let mut raw = [0u8; 4];
            if self.ram.read_guarded(Segment::of_addr(base), offset, &mut raw) {
                return u32::load_guest(&raw);
            }
        }
        self.read32(base.wrapping_add(disp as u32))
    }

    /// Write a word relative to a RAM mirror base address
    ///
    /// Same addressing as [`Memory::read32_ram_relative`]. Stores are dropped
    /// while the cache is isolated. A store resolved through a guard is
    /// reported to the code invalidator at the RAM address it landed on.
    pub fn write32_ram_relative(&mut self, base: u32, disp: i32, value: u32) {
        let addr = base.wrapping_add(disp as u32);
        if let Some(entry) = self.tables.write_entry(base >> 16) {
            if entry.buffer == Buffer::Ram {
                let segment = Segment::of_addr(base);
                let offset = (base & RAM_MASK) as i64 + disp as i64;
                let mut raw = [0u8; 4];
                value.store_guest(&mut raw);
                if self.ram.write_guarded(segment, offset, &raw) {
                    // Report the in-segment RAM word, not the wrapped address
                    let written = segment.base() | offset.rem_euclid(RAM_SIZE as i64) as u32;
                    self.notify_code_write(written, 1);
                    return;
                }
            }
        }
        self.write32(addr, value)
    }

    /// Write a byte slice directly to RAM
    ///
    /// Used for loading executables and other bulk transfers. The address is
    /// masked to physical RAM and the cache control state is not consulted.
    /// The written range is reported to the code invalidator.
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::InvalidMemoryAccess` if the data does not fit
    /// before the end of RAM.
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::Memory;
    ///
    /// let mut memory = Memory::new(&MemoryConfig::default()).unwrap();
    /// memory.write_ram_slice(0x80010000, &[0x01, 0x02, 0x03, 0x04]).unwrap();
    /// assert_eq!(memory.read32(0x00010000), 0x04030201);
    /// ```
    pub fn write_ram_slice(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let start = (address & RAM_MASK) as usize;
        let end = start + data.len();
        if end > RAM_SIZE {
            return Err(EmulatorError::InvalidMemoryAccess { address });
        }

        self.ram.view_mut(Segment::Kuseg)[start..end].copy_from_slice(data);

        if !data.is_empty() {
            let first = start & !3;
            let words = ((end + 3) & !3).saturating_sub(first) / 4;
            self.notify_code_write(address & !3, words as u32);
        }

        log::trace!("Wrote {} bytes to RAM at 0x{:08X}", data.len(), address);
        Ok(())
    }

    /// Main RAM contents
    pub fn ram(&self) -> &[u8] {
        self.ram.view(Segment::Kuseg)
    }

    /// Mutable main RAM contents
    pub fn ram_mut(&mut self) -> &mut [u8] {
        self.ram.view_mut(Segment::Kuseg)
    }

    /// BIOS ROM contents
    pub fn bios(&self) -> &[u8] {
        &self.bios
    }

    /// Parallel port window contents
    pub fn parallel(&self) -> &[u8] {
        &self.parallel
    }

    /// Hardware window contents (scratchpad first)
    pub fn hardware(&self) -> &[u8] {
        &self.hardware
    }
}

/// Allocate a zeroed buffer, reporting failure instead of aborting
fn alloc_buffer(region: &'static str, size: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| EmulatorError::AllocationFailure { region, size })?;
    buffer.resize(size, 0);
    Ok(buffer)
}
