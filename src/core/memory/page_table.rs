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

//! Read and write page tables
//!
//! Both tables have one entry per 64KB guest page. The read table never has
//! a hole: pages without a backing buffer point at the zero sink. The write
//! table leaves read-only pages (BIOS, hardware window) unmapped, and drops
//! the RAM pages while the data cache is isolated.
//!
//! Mirrors are produced by copying the KUSEG entries into the KSEG0 and
//! KSEG1 windows; entries carry no segment, the dispatcher picks the RAM view
//! from the page index.

use super::region::{
    BIOS_PAGES, BIOS_SEGMENT_PAGES, HARDWARE_PAGES, PAGE_COUNT, PARALLEL_PAGE, RAM_PAGES,
    RAM_SEGMENT_PAGES,
};
use crate::core::error::{EmulatorError, Result};

/// Backing buffer a page resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
    /// Main RAM, viewed through the segment of the accessed page
    Ram,
    /// Parallel port window
    Parallel,
    /// Hardware window (scratchpad and register shadow)
    Hardware,
    /// BIOS ROM
    Rom,
    /// Shared all-zero sink for unmapped reads
    NullSink,
}

/// One page table entry: a buffer and the byte offset of the page within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    pub buffer: Buffer,
    pub base: u32,
}

impl PageEntry {
    const NULL_SINK: PageEntry = PageEntry {
        buffer: Buffer::NullSink,
        base: 0,
    };

    const fn new(buffer: Buffer, base: u32) -> Self {
        Self { buffer, base }
    }

    /// Entry for RAM page `i` of a segment window
    ///
    /// The 2MB image repeats every 0x20 pages inside the 8MB window.
    fn ram(i: usize) -> Self {
        Self::new(Buffer::Ram, ((i & 0x1F) << 16) as u32)
    }
}

/// The pair of page tables
pub struct PageTables {
    read: Vec<PageEntry>,
    write: Vec<Option<PageEntry>>,
}

impl PageTables {
    /// Allocate and populate both tables
    ///
    /// RAM starts write-enabled.
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::AllocationFailure` if a table cannot be
    /// allocated.
    pub fn new() -> Result<Self> {
        let mut read = try_table("read page table")?;
        read.resize(PAGE_COUNT, PageEntry::NULL_SINK);
        let mut write = try_table("write page table")?;
        write.resize(PAGE_COUNT, None);

        // Read table: RAM, then mirrors
        for i in 0..RAM_PAGES {
            read[i] = PageEntry::ram(i);
        }
        for &start in &RAM_SEGMENT_PAGES[1..] {
            read.copy_within(0..RAM_PAGES, start);
        }

        read[PARALLEL_PAGE as usize] = PageEntry::new(Buffer::Parallel, 0);
        read[HARDWARE_PAGES[0] as usize] = PageEntry::new(Buffer::Hardware, 0);

        let bios = BIOS_SEGMENT_PAGES[0];
        for i in 0..BIOS_PAGES {
            read[bios + i] = PageEntry::new(Buffer::Rom, (i << 16) as u32);
        }
        for &start in &BIOS_SEGMENT_PAGES[1..] {
            read.copy_within(bios..bios + BIOS_PAGES, start);
        }

        // Write table: RAM and the parallel port only
        write[PARALLEL_PAGE as usize] = Some(PageEntry::new(Buffer::Parallel, 0));

        let mut tables = Self { read, write };
        tables.map_ram_writes();
        Ok(tables)
    }

    /// Read table entry for a page
    #[inline(always)]
    pub fn read_entry(&self, page: u32) -> PageEntry {
        self.read[page as usize]
    }

    /// Write table entry for a page
    #[inline(always)]
    pub fn write_entry(&self, page: u32) -> Option<PageEntry> {
        self.write[page as usize]
    }

    /// Restore every RAM mirror in the write table
    pub fn map_ram_writes(&mut self) {
        for i in 0..RAM_PAGES {
            self.write[i] = Some(PageEntry::ram(i));
        }
        for &start in &RAM_SEGMENT_PAGES[1..] {
            self.write.copy_within(0..RAM_PAGES, start);
        }
    }

    /// Remove every RAM mirror from the write table
    ///
    /// Non-RAM entries are left untouched.
    pub fn unmap_ram_writes(&mut self) {
        for &start in &RAM_SEGMENT_PAGES {
            self.write[start..start + RAM_PAGES].fill(None);
        }
    }
}

fn try_table<T>(region: &'static str) -> Result<Vec<T>> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(PAGE_COUNT)
        .map_err(|_| EmulatorError::AllocationFailure {
            region,
            size: PAGE_COUNT * std::mem::size_of::<T>(),
        })?;
    Ok(table)
}
