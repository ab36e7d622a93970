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

//! Unit tests for the direct access path

use super::*;

#[test]
fn test_parallel_round_trip_host_order() {
    let mut mem = memory();
    {
        let mut handle = mem.direct_handle();
        direct::write32(0x1F00_0100, 0x1122_3344, &mut handle);
        assert_eq!(direct::read32(0x1F00_0100, &handle), 0x1122_3344);
        assert_eq!(direct::read8(0x1F00_0100, &handle), 0x1122_3344u32.to_ne_bytes()[0]);
    }
    assert_eq!(&mem.parallel()[0x100..0x104], &0x1122_3344u32.to_ne_bytes());
}

#[test]
fn test_hardware_buffer_covers_first_4k() {
    let mut mem = memory();
    let regs = attach_registers(&mut mem);
    {
        let mut handle = mem.direct_handle();
        direct::write16(0x1F80_0010, 0xA5A5, &mut handle);
        direct::write32(0x1F80_0800, 0xFEED_F00D, &mut handle);
        assert_eq!(direct::read16(0x1F80_0010, &handle), 0xA5A5);
        assert_eq!(direct::read32(0x1F80_0800, &handle), 0xFEED_F00D);
    }
    assert!(regs.borrow().writes.is_empty());
    assert_eq!(&mem.hardware()[0x800..0x804], &0xFEED_F00Du32.to_ne_bytes());
}

#[test]
fn test_registers_above_4k() {
    let mut mem = memory();
    let regs = attach_registers(&mut mem);
    regs.borrow_mut().words.insert(0x1F80_1814, 0x1480_2000);

    let mut handle = mem.direct_handle();
    assert_eq!(direct::read32(0x1F80_1814, &handle), 0x1480_2000);
    direct::write32(0x1F80_1810, 0xE300_0000, &mut handle);
    assert_eq!(regs.borrow().writes, vec![(0x1F80_1810, 0xE300_0000)]);
}

#[test]
fn test_bios_read_uses_upper_offset_bits() {
    let mut mem = memory();
    mem.bios[0x1_2345] = 0x9C;
    mem.bios[0x7_FFF0..0x7_FFF4].copy_from_slice(&0xCAFE_D00Du32.to_ne_bytes());

    let handle = mem.direct_handle();
    assert_eq!(direct::read8(0x1FC1_2345, &handle), 0x9C);
    assert_eq!(direct::read8(0xBFC1_2345, &handle), 0x9C);
    assert_eq!(direct::read32(0x1FC7_FFF0, &handle), 0xCAFE_D00D);
}

#[test]
fn test_non_hardware_writes_land_in_parallel() {
    let mut mem = memory();
    {
        let mut handle = mem.direct_handle();
        direct::write8(0x1FC0_0020, 0x42, &mut handle);
        direct::write8(0x8000_0021, 0x43, &mut handle);
    }
    assert_eq!(mem.parallel()[0x20], 0x42);
    assert_eq!(mem.parallel()[0x21], 0x43);
    assert!(mem.bios().iter().all(|&b| b == 0));
    assert!(mem.ram().iter().all(|&b| b == 0));
}

#[test]
fn test_truncated_access() {
    let mut mem = memory();
    mem.parallel[0xFFFE] = 0xFF;

    let mut handle = mem.direct_handle();
    assert_eq!(direct::read32(0x1F00_FFFE, &handle), 0);
    direct::write32(0x1F00_FFFE, 0x1234_5678, &mut handle);
    assert_eq!(
        direct::read16(0x1F00_FFFE, &handle),
        u16::from_ne_bytes([0xFF, 0x00])
    );
}

#[test]
fn test_cache_control_not_decoded() {
    let mut mem = memory();
    {
        let mut handle = mem.direct_handle();
        direct::write32(CACHE_CONTROL, 0x800, &mut handle);
    }
    assert!(mem.is_write_enabled());
    // Page 0xFFFE is not special: the write went to the parallel buffer
    assert_eq!(&mem.parallel()[0x130..0x134], &0x800u32.to_ne_bytes());
}
