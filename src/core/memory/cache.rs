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

//! Cache control and code invalidation
//!
//! # Cache Isolation
//!
//! The BIOS and kernel isolate the R3000A data cache by writing to the cache
//! control register at 0xFFFE0130 and then clearing memory; with the cache
//! isolated those stores must never reach RAM. The emulation removes every
//! RAM mirror from the write table while isolated, so the stores fall through
//! to the "unmapped" path and are dropped.
//!
//! | Value              | Effect                                  |
//! |--------------------|-----------------------------------------|
//! | 0x800, 0x804       | isolate: RAM write pages removed        |
//! | 0x000, 0x1E988     | release: RAM write pages restored       |
//! | anything else      | ignored                                 |
//!
//! # Code Invalidation
//!
//! A translating backend caches compiled blocks per guest address. Every
//! store that lands in a mapped page is reported to the attached
//! [`CodeInvalidator`](super::CodeInvalidator).

use super::io_device::CodeInvalidator;
use super::Memory;
use std::cell::RefCell;
use std::rc::Rc;

/// Code invalidation collaborator shared with the translating backend
pub type SharedInvalidator = Rc<RefCell<dyn CodeInvalidator>>;

/// Cache control values that isolate the data cache
const ISOLATE_VALUES: [u32; 2] = [0x800, 0x804];

/// Cache control values that release the isolation
const RELEASE_VALUES: [u32; 2] = [0x000, 0x1E988];

/// RAM write state driven by the cache control register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// RAM pages present in the write table (reset state)
    WriteEnabled,
    /// Cache isolated: RAM writes are dropped
    WriteDisabled,
}

impl Memory {
    /// Handle a 32-bit write to the cache control register
    pub(super) fn write_cache_control(&mut self, value: u32) {
        self.cache_control = value;

        if ISOLATE_VALUES.contains(&value) {
            if self.cache_state == CacheState::WriteDisabled {
                return;
            }
            self.cache_state = CacheState::WriteDisabled;
            self.tables.unmap_ram_writes();
            log::debug!("Cache control 0x{:05X}: RAM writes disabled", value);
        } else if RELEASE_VALUES.contains(&value) {
            if self.cache_state == CacheState::WriteEnabled {
                return;
            }
            self.cache_state = CacheState::WriteEnabled;
            self.tables.map_ram_writes();
            log::debug!("Cache control 0x{:05X}: RAM writes enabled", value);
        } else {
            log::debug!(
                "Unrecognized cache control value 0x{:08X} (ignored)",
                value
            );
        }
    }

    /// Current RAM write state
    pub fn cache_state(&self) -> CacheState {
        self.cache_state
    }

    /// Whether stores to RAM currently take effect
    pub fn is_write_enabled(&self) -> bool {
        self.cache_state == CacheState::WriteEnabled
    }

    /// Last value written to the cache control register
    pub fn cache_control(&self) -> u32 {
        self.cache_control
    }

    /// Report `words` possibly-stale 32-bit words starting at `addr`
    #[inline(always)]
    pub(super) fn notify_code_write(&self, addr: u32, words: u32) {
        if let Some(invalidator) = &self.code_invalidator {
            invalidator.borrow_mut().clear(addr, words);
        }
    }
}
