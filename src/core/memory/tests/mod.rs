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

//! Memory subsystem tests

use super::*;
use crate::core::config::MirrorMode;
use std::cell::RefCell;
use std::rc::Rc;

mod direct_path;

/// Both mirroring strategies; every behavioural test runs against each
const MODES: [MirrorMode; 2] = [MirrorMode::Table, MirrorMode::Aliased];

fn memory_with(mirror: MirrorMode) -> Memory {
    let config = MemoryConfig {
        mirror,
        ..MemoryConfig::default()
    };
    Memory::new(&config).unwrap()
}

fn memory() -> Memory {
    memory_with(MirrorMode::Table)
}

/// Code invalidator recording every notification
#[derive(Default)]
struct ClearLog {
    cleared: Vec<(u32, u32)>,
}

impl CodeInvalidator for ClearLog {
    fn clear(&mut self, addr: u32, words: u32) {
        self.cleared.push((addr, words));
    }
}

fn attach_log(memory: &mut Memory) -> Rc<RefCell<ClearLog>> {
    let log = Rc::new(RefCell::new(ClearLog::default()));
    memory.set_code_invalidator(log.clone());
    log
}

/// Hardware registers backed by a word map, recording accesses
#[derive(Default)]
struct FakeRegisters {
    words: std::collections::HashMap<u32, u32>,
    writes: Vec<(u32, u32)>,
}

impl HardwareRegisters for FakeRegisters {
    fn read32(&mut self, addr: u32) -> u32 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.writes.push((addr, value));
        self.words.insert(addr, value);
    }
}

fn attach_registers(memory: &mut Memory) -> Rc<RefCell<FakeRegisters>> {
    let regs = Rc::new(RefCell::new(FakeRegisters::default()));
    memory.set_hardware_registers(regs.clone());
    regs
}
