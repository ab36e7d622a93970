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

//! Address map and region identification
//!
//! Guest addresses are decoded as a 16-bit page index (`addr >> 16`) and a
//! 16-bit offset. The PSX uses MIPS memory segments, so the same physical RAM
//! and BIOS pages appear three times:
//! - KUSEG (0x00000000-0x7FFFFFFF): user space, cached
//! - KSEG0 (0x80000000-0x9FFFFFFF): kernel space, cached
//! - KSEG1 (0xA0000000-0xBFFFFFFF): kernel space, uncached

/// Main RAM size (2MB)
pub const RAM_SIZE: usize = 0x0020_0000;

/// Guard mirror size on either side of RAM (64KB)
pub const GUARD_SIZE: usize = 0x0001_0000;

/// Parallel port window size (64KB)
pub const PARALLEL_SIZE: usize = 0x0001_0000;

/// Hardware window size (64KB), scratchpad included
pub const HARDWARE_SIZE: usize = 0x0001_0000;

/// Scratchpad size at the start of the hardware window (1KB)
pub const SCRATCHPAD_SIZE: u32 = 0x400;

/// BIOS ROM size (512KB)
pub const BIOS_SIZE: usize = 0x0008_0000;

/// Size of one page and of the zero sink (64KB)
pub const PAGE_SIZE: usize = 0x0001_0000;

/// Number of entries in each page table
pub const PAGE_COUNT: usize = 0x10000;

/// Pages covered by one RAM mirror window (8MB, RAM repeats every 0x20 pages)
pub const RAM_PAGES: usize = 0x80;

/// Pages covered by the BIOS
pub const BIOS_PAGES: usize = 0x08;

/// First page of each RAM segment window
pub const RAM_SEGMENT_PAGES: [usize; 3] = [0x0000, 0x8000, 0xA000];

/// First page of each BIOS mirror
pub const BIOS_SEGMENT_PAGES: [usize; 3] = [0x1FC0, 0x9FC0, 0xBFC0];

/// Parallel port page
pub const PARALLEL_PAGE: u32 = 0x1F00;

/// Hardware window page in each segment
pub const HARDWARE_PAGES: [u32; 3] = [0x1F80, 0x9F80, 0xBF80];

/// Cache control pseudo-register (write-only, 32-bit)
pub const CACHE_CONTROL: u32 = 0xFFFE_0130;

/// Mask from any RAM mirror address to its physical RAM offset
pub const RAM_MASK: u32 = (RAM_SIZE as u32) - 1;

/// RAM segment a mirror page belongs to
///
/// Each segment may be backed by its own host mapping; see
/// [`RamBacking`](super::RamBacking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Kuseg,
    Kseg0,
    Kseg1,
}

impl Segment {
    /// All segments in page-table order
    pub const ALL: [Segment; 3] = [Segment::Kuseg, Segment::Kseg0, Segment::Kseg1];

    /// Segment containing a page index
    #[inline(always)]
    pub fn of_page(page: u32) -> Segment {
        match page & 0xE000 {
            0x8000 => Segment::Kseg0,
            0xA000 => Segment::Kseg1,
            _ => Segment::Kuseg,
        }
    }

    /// Segment containing a guest address
    #[inline(always)]
    pub fn of_addr(addr: u32) -> Segment {
        Self::of_page(addr >> 16)
    }

    /// Position in [`Segment::ALL`]
    pub fn index(self) -> usize {
        match self {
            Segment::Kuseg => 0,
            Segment::Kseg0 => 1,
            Segment::Kseg1 => 2,
        }
    }

    /// Base guest address of the segment
    pub fn base(self) -> u32 {
        (RAM_SEGMENT_PAGES[self.index()] as u32) << 16
    }
}

/// Memory region identification
///
/// Used by diagnostics to name the region an address decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM or one of its mirrors
    RAM,
    /// Parallel port window
    Parallel,
    /// Scratchpad (first 1KB of the hardware window)
    Scratchpad,
    /// Hardware registers (rest of the hardware window)
    IO,
    /// BIOS ROM or one of its mirrors
    BIOS,
    /// Cache control pseudo-register
    CacheControl,
    /// Unmapped region (reads zero, writes dropped)
    Unmapped,
}

/// Check whether a page is one of the three hardware window pages
#[inline(always)]
pub fn is_hardware_page(page: u32) -> bool {
    page == HARDWARE_PAGES[0] || page == HARDWARE_PAGES[1] || page == HARDWARE_PAGES[2]
}

/// Identify the region an address decodes to
///
/// Follows the same decoding as the table dispatcher, so RAM mirrors cover
/// the full 8MB window of each segment.
///
/// # Example
///
/// ```
/// use psxmem::core::memory::{identify_region, MemoryRegion};
///
/// assert_eq!(identify_region(0x0000_0000), MemoryRegion::RAM);
/// assert_eq!(identify_region(0x1F80_0000), MemoryRegion::Scratchpad);
/// assert_eq!(identify_region(0x1F80_1810), MemoryRegion::IO);
/// assert_eq!(identify_region(0xBFC0_0000), MemoryRegion::BIOS);
/// assert_eq!(identify_region(0x2000_0000), MemoryRegion::Unmapped);
/// ```
pub fn identify_region(addr: u32) -> MemoryRegion {
    let page = addr >> 16;
    let offset = addr & 0xFFFF;

    if is_hardware_page(page) {
        return if offset < SCRATCHPAD_SIZE {
            MemoryRegion::Scratchpad
        } else {
            MemoryRegion::IO
        };
    }
    if addr == CACHE_CONTROL {
        return MemoryRegion::CacheControl;
    }
    if page == PARALLEL_PAGE {
        return MemoryRegion::Parallel;
    }

    let page = page as usize;
    if RAM_SEGMENT_PAGES
        .iter()
        .any(|&start| (start..start + RAM_PAGES).contains(&page))
    {
        MemoryRegion::RAM
    } else if BIOS_SEGMENT_PAGES
        .iter()
        .any(|&start| (start..start + BIOS_PAGES).contains(&page))
    {
        MemoryRegion::BIOS
    } else {
        MemoryRegion::Unmapped
    }
}
