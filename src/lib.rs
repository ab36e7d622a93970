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

//! psxmem: PlayStation (PSX) memory subsystem
//!
//! This crate maps the 32-bit R3000A address space onto host buffers for an
//! emulator: RAM and its segment mirrors, the BIOS ROM, the parallel port and
//! hardware windows, and the cache control register used by the BIOS to
//! isolate the data cache.
//!
//! # Architecture
//!
//! - [`core::memory`]: the [`Memory`](core::memory::Memory) aggregate, page
//!   table dispatch, mirroring strategies, reset and BIOS loading, and the
//!   direct access path
//! - [`core::config`]: TOML and environment configuration
//! - [`core::error`]: error types for setup paths
//!
//! Peripherals and the CPU are not part of this crate. They plug in through
//! the [`HardwareRegisters`](core::memory::HardwareRegisters) and
//! [`CodeInvalidator`](core::memory::CodeInvalidator) traits.
//!
//! # Example
//!
//! ```no_run
//! use psxmem::core::{Memory, MemoryConfig};
//!
//! let mut config = MemoryConfig::load("psxmem.toml")?;
//! let mut memory = Memory::new(&config)?;
//! let outcome = memory.reset(&mut config);
//! println!("boot: {}", outcome);
//!
//! let first_instruction = memory.read32(0xBFC0_0000);
//! # let _ = first_instruction;
//! # Ok::<(), psxmem::core::error::EmulatorError>(())
//! ```
//!
//! # Error Handling
//!
//! Setup operations return [`core::error::Result<T>`] which is an alias for
//! `Result<T, EmulatorError>`. Guest loads and stores are infallible.

pub mod core;

// Re-export commonly used types
pub use core::error::{EmulatorError, Result};
