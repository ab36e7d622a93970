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

//! Collaborator interfaces
//!
//! The memory subsystem does not emulate peripherals or translate code. It
//! forwards hardware-register accesses (0x1F801000 and up inside the hardware
//! window) to a [`HardwareRegisters`] implementation and reports RAM stores to
//! a [`CodeInvalidator`] so a translating backend can drop stale blocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Memory                      │
//! ├─────────────────────────────────────────────┤
//! │  page 0x1F80 / 0x9F80 / 0xBF80:             │
//! │    offset <  0x400 -> scratchpad bytes      │
//! │    offset >= 0x400 -> HardwareRegisters     │
//! │                                             │
//! │  store hits a table page:                   │
//! │    CodeInvalidator::clear(word, 1)          │
//! └─────────────────────────────────────────────┘
//!           │                   │
//!    ┌──────┴──────┐    ┌──────┴──────┐
//!    │ DMA/GPU/... │    │ Recompiler  │
//!    └─────────────┘    └─────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use psxmem::core::memory::HardwareRegisters;
//!
//! struct Latch {
//!     value: u32,
//! }
//!
//! impl HardwareRegisters for Latch {
//!     fn read32(&mut self, _addr: u32) -> u32 {
//!         self.value
//!     }
//!
//!     fn write32(&mut self, _addr: u32, value: u32) {
//!         self.value = value;
//!     }
//! }
//!
//! let mut latch = Latch { value: 0 };
//! latch.write16(0x1F801072, 0xBEEF);
//! assert_eq!(latch.read32(0x1F801070), 0xBEEF_0000);
//! ```

/// Hardware register window collaborator
///
/// Receives the full guest address of every hardware-register access. Only
/// the 32-bit methods are required; the narrow accessors default to
/// operating on the aligned 32-bit word.
///
/// # Thread Safety
///
/// Implementations do not need to be `Send` or `Sync`: memory accesses are
/// confined to the emulation thread.
pub trait HardwareRegisters {
    /// Read a 32-bit register
    fn read32(&mut self, addr: u32) -> u32;

    /// Write a 32-bit register
    fn write32(&mut self, addr: u32, value: u32);

    /// Read a 16-bit register
    ///
    /// Default implementation reads the aligned 32-bit word and extracts the
    /// addressed half.
    fn read16(&mut self, addr: u32) -> u16 {
        let value = self.read32(addr & !0x03);
        let shift = (addr & 0x02) * 8;
        ((value >> shift) & 0xFFFF) as u16
    }

    /// Write a 16-bit register
    ///
    /// Default implementation performs read-modify-write on the aligned
    /// 32-bit word, updating only the targeted half.
    fn write16(&mut self, addr: u32, value: u16) {
        let aligned = addr & !0x03;
        let shift = (addr & 0x02) * 8;
        let mask = !(0xFFFFu32 << shift);
        let current = self.read32(aligned);
        self.write32(aligned, (current & mask) | ((value as u32) << shift));
    }

    /// Read an 8-bit register
    fn read8(&mut self, addr: u32) -> u8 {
        let value = self.read32(addr & !0x03);
        let shift = (addr & 0x03) * 8;
        ((value >> shift) & 0xFF) as u8
    }

    /// Write an 8-bit register
    fn write8(&mut self, addr: u32, value: u8) {
        let aligned = addr & !0x03;
        let shift = (addr & 0x03) * 8;
        let mask = !(0xFFu32 << shift);
        let current = self.read32(aligned);
        self.write32(aligned, (current & mask) | ((value as u32) << shift));
    }

    /// Device name for logging
    fn name(&self) -> &str {
        "Hardware Registers"
    }
}

/// Translated-code invalidation collaborator
///
/// Called after every store that lands in a table-mapped page (and after
/// 32-bit stores dropped while the cache is isolated). `addr` is the guest
/// address of the first affected word and `words` the number of 32-bit words
/// that may now hold stale translated code.
pub trait CodeInvalidator {
    fn clear(&mut self, addr: u32, words: u32);
}
