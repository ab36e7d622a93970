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

//! RAM backing and mirroring strategies
//!
//! The three RAM segments (KUSEG, KSEG0, KSEG1) must show the same 2MB image.
//! Two strategies are available behind [`RamBacking`]:
//!
//! - [`HeapRam`]: one heap buffer returned for every segment. Guard offsets
//!   are resolved by masking.
//! - [`MappedRam`] (feature `aliased-ram`): a file-backed RAM object mapped
//!   once per segment, so each segment has its own host address range that
//!   the OS keeps coherent. Two extra 64KB views alias the tail and the head
//!   of RAM. They are separate mappings, not placed next to the segment
//!   views, so guard offsets are routed to them by index.
//!
//! Both strategies produce byte-identical results for every access.

use super::region::{Segment, GUARD_SIZE, RAM_SIZE};
use crate::core::config::MirrorMode;
use crate::core::error::{EmulatorError, Result};

/// Storage for main RAM, viewed per segment
pub trait RamBacking {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// The 2MB RAM image as seen through a segment
    fn view(&self, segment: Segment) -> &[u8];

    /// Mutable 2MB RAM image as seen through a segment
    fn view_mut(&mut self, segment: Segment) -> &mut [u8];

    /// Read `out.len()` bytes at `offset` relative to the segment's RAM base
    ///
    /// `offset` may reach up to 64KB below the base or past the end; such
    /// bytes come from the opposite end of RAM. Returns `false` without
    /// touching `out` if the access leaves the guard window.
    fn read_guarded(&self, segment: Segment, offset: i64, out: &mut [u8]) -> bool {
        if !in_guard_window(offset, out.len()) {
            return false;
        }
        let view = self.view(segment);
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = view[wrap_offset(offset + i as i64)];
        }
        true
    }

    /// Write `data` at `offset` relative to the segment's RAM base
    ///
    /// Same addressing as [`RamBacking::read_guarded`].
    fn write_guarded(&mut self, segment: Segment, offset: i64, data: &[u8]) -> bool {
        if !in_guard_window(offset, data.len()) {
            return false;
        }
        let view = self.view_mut(segment);
        for (i, byte) in data.iter().enumerate() {
            view[wrap_offset(offset + i as i64)] = *byte;
        }
        true
    }

    /// Zero the whole RAM image
    fn clear(&mut self) {
        self.view_mut(Segment::Kuseg).fill(0);
    }
}

/// Check that `[offset, offset + len)` stays within the guard window
pub(super) fn in_guard_window(offset: i64, len: usize) -> bool {
    offset >= -(GUARD_SIZE as i64) && offset + len as i64 <= (RAM_SIZE + GUARD_SIZE) as i64
}

#[inline(always)]
fn wrap_offset(offset: i64) -> usize {
    offset.rem_euclid(RAM_SIZE as i64) as usize
}

/// Heap-allocated RAM shared by all segments
pub struct HeapRam {
    ram: Vec<u8>,
}

impl HeapRam {
    /// Allocate a zeroed 2MB RAM buffer
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::AllocationFailure` if the buffer cannot be
    /// allocated.
    pub fn new() -> Result<Self> {
        Ok(Self {
            ram: super::alloc_buffer("RAM", RAM_SIZE)?,
        })
    }
}

impl RamBacking for HeapRam {
    fn name(&self) -> &'static str {
        "table"
    }

    #[inline(always)]
    fn view(&self, _segment: Segment) -> &[u8] {
        &self.ram
    }

    #[inline(always)]
    fn view_mut(&mut self, _segment: Segment) -> &mut [u8] {
        &mut self.ram
    }
}

#[cfg(feature = "aliased-ram")]
pub use mapped::MappedRam;

#[cfg(feature = "aliased-ram")]
mod mapped {
    use super::*;
    use memmap2::{MmapMut, MmapOptions};
    use std::fs::File;

    /// File-backed RAM with one shared mapping per segment
    pub struct MappedRam {
        // Fields drop in declaration order, which releases the mappings in
        // reverse order of acquisition: guards, segment views, then the file.
        upper_guard: MmapMut,
        lower_guard: MmapMut,
        segments: [MmapMut; 3],
        _file: File,
    }

    impl MappedRam {
        /// Create the RAM object and map all views
        ///
        /// # Errors
        ///
        /// Returns `EmulatorError::MappingFailed` if the backing file cannot
        /// be created or any view cannot be mapped.
        pub fn new() -> Result<Self> {
            let file = tempfile::tempfile()
                .map_err(|e| EmulatorError::MappingFailed(format!("backing file: {}", e)))?;
            file.set_len(RAM_SIZE as u64)
                .map_err(|e| EmulatorError::MappingFailed(format!("resize backing file: {}", e)))?;

            let map = |offset: usize, len: usize| -> Result<MmapMut> {
                // SAFETY: the file is an unlinked temporary owned by this
                // struct and is never resized or accessed other than through
                // these mappings.
                unsafe {
                    MmapOptions::new()
                        .offset(offset as u64)
                        .len(len)
                        .map_mut(&file)
                }
                .map_err(|e| {
                    EmulatorError::MappingFailed(format!(
                        "map 0x{:X} bytes at offset 0x{:X}: {}",
                        len, offset, e
                    ))
                })
            };

            let segments = [map(0, RAM_SIZE)?, map(0, RAM_SIZE)?, map(0, RAM_SIZE)?];
            let lower_guard = map(RAM_SIZE - GUARD_SIZE, GUARD_SIZE)?;
            let upper_guard = map(0, GUARD_SIZE)?;

            Ok(Self {
                upper_guard,
                lower_guard,
                segments,
                _file: file,
            })
        }

        fn guard_byte(&self, segment: Segment, pos: i64) -> u8 {
            if pos < 0 {
                self.lower_guard[(pos + GUARD_SIZE as i64) as usize]
            } else if pos >= RAM_SIZE as i64 {
                self.upper_guard[(pos - RAM_SIZE as i64) as usize]
            } else {
                self.segments[segment.index()][pos as usize]
            }
        }

        fn guard_byte_mut(&mut self, segment: Segment, pos: i64) -> &mut u8 {
            if pos < 0 {
                &mut self.lower_guard[(pos + GUARD_SIZE as i64) as usize]
            } else if pos >= RAM_SIZE as i64 {
                &mut self.upper_guard[(pos - RAM_SIZE as i64) as usize]
            } else {
                &mut self.segments[segment.index()][pos as usize]
            }
        }
    }

    impl RamBacking for MappedRam {
        fn name(&self) -> &'static str {
            "aliased"
        }

        #[inline(always)]
        fn view(&self, segment: Segment) -> &[u8] {
            &self.segments[segment.index()]
        }

        #[inline(always)]
        fn view_mut(&mut self, segment: Segment) -> &mut [u8] {
            &mut self.segments[segment.index()]
        }

        fn read_guarded(&self, segment: Segment, offset: i64, out: &mut [u8]) -> bool {
            if !in_guard_window(offset, out.len()) {
                return false;
            }
            for (i, byte) in out.iter_mut().enumerate() {
                *byte = self.guard_byte(segment, offset + i as i64);
            }
            true
        }

        fn write_guarded(&mut self, segment: Segment, offset: i64, data: &[u8]) -> bool {
            if !in_guard_window(offset, data.len()) {
                return false;
            }
            for (i, byte) in data.iter().enumerate() {
                *self.guard_byte_mut(segment, offset + i as i64) = *byte;
            }
            true
        }
    }
}

/// Build the RAM backing for a mirror mode
///
/// A failed aliased mapping is not fatal: it is logged and the portable
/// heap strategy is used instead.
///
/// # Errors
///
/// Returns `EmulatorError::AllocationFailure` if even the heap buffer cannot
/// be allocated.
pub fn create_backing(mode: MirrorMode) -> Result<Box<dyn RamBacking>> {
    match mode {
        MirrorMode::Table => Ok(Box::new(HeapRam::new()?)),
        MirrorMode::Aliased => aliased_backing(),
    }
}

#[cfg(feature = "aliased-ram")]
fn aliased_backing() -> Result<Box<dyn RamBacking>> {
    match MappedRam::new() {
        Ok(mapped) => {
            log::info!("Mapped and mirrored RAM through shared file mappings");
            Ok(Box::new(mapped))
        }
        Err(e) => {
            log::warn!("{}; falling back to table mirrors", e);
            Ok(Box::new(HeapRam::new()?))
        }
    }
}

#[cfg(not(feature = "aliased-ram"))]
fn aliased_backing() -> Result<Box<dyn RamBacking>> {
    log::warn!("Aliased RAM not compiled in; falling back to table mirrors");
    Ok(Box::new(HeapRam::new()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_guards(ram: &mut dyn RamBacking) {
        ram.view_mut(Segment::Kuseg)[RAM_SIZE - 4..].copy_from_slice(&[1, 2, 3, 4]);
        ram.view_mut(Segment::Kuseg)[..4].copy_from_slice(&[5, 6, 7, 8]);

        // Just below the KSEG0 base lands on the tail of RAM
        let mut out = [0u8; 4];
        assert!(ram.read_guarded(Segment::Kseg0, -4, &mut out));
        assert_eq!(out, [1, 2, 3, 4]);

        // Straddling the top of RAM
        assert!(ram.read_guarded(Segment::Kseg1, RAM_SIZE as i64 - 2, &mut out));
        assert_eq!(out, [3, 4, 5, 6]);

        // Writes through the guard reach the head of RAM
        assert!(ram.write_guarded(Segment::Kseg0, RAM_SIZE as i64, &[9, 9]));
        assert_eq!(&ram.view(Segment::Kuseg)[..2], &[9, 9]);

        // Outside the guard window
        assert!(!ram.read_guarded(Segment::Kuseg, -(GUARD_SIZE as i64) - 1, &mut out));
        assert!(!ram.write_guarded(Segment::Kuseg, (RAM_SIZE + GUARD_SIZE) as i64 - 1, &[0, 0]));
    }

    #[test]
    fn test_guard_window_bounds() {
        assert!(in_guard_window(-(GUARD_SIZE as i64), 4));
        assert!(!in_guard_window(-(GUARD_SIZE as i64) - 1, 1));
        assert!(in_guard_window((RAM_SIZE + GUARD_SIZE) as i64 - 4, 4));
        assert!(!in_guard_window((RAM_SIZE + GUARD_SIZE) as i64 - 3, 4));
    }

    #[test]
    fn test_heap_ram_views_share_storage() {
        let mut ram = HeapRam::new().unwrap();
        ram.view_mut(Segment::Kseg0)[0x1234] = 0xAB;
        assert_eq!(ram.view(Segment::Kuseg)[0x1234], 0xAB);
        assert_eq!(ram.view(Segment::Kseg1)[0x1234], 0xAB);
        assert_eq!(ram.view(Segment::Kuseg).len(), RAM_SIZE);
    }

    #[test]
    fn test_heap_ram_guards() {
        let mut ram = HeapRam::new().unwrap();
        exercise_guards(&mut ram);
    }

    #[test]
    fn test_clear() {
        let mut ram = HeapRam::new().unwrap();
        ram.view_mut(Segment::Kuseg)[100] = 1;
        ram.clear();
        assert!(ram.view(Segment::Kuseg).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_table_mode_backing() {
        let backing = create_backing(MirrorMode::Table).unwrap();
        assert_eq!(backing.name(), "table");
    }

    #[cfg(feature = "aliased-ram")]
    #[test]
    fn test_mapped_ram_views_alias() {
        let mut ram = MappedRam::new().unwrap();
        ram.view_mut(Segment::Kseg1)[0x1F_FFFC] = 0x5A;
        assert_eq!(ram.view(Segment::Kuseg)[0x1F_FFFC], 0x5A);
        assert_eq!(ram.view(Segment::Kseg0)[0x1F_FFFC], 0x5A);
    }

    #[cfg(feature = "aliased-ram")]
    #[test]
    fn test_mapped_ram_guards() {
        let mut ram = MappedRam::new().unwrap();
        exercise_guards(&mut ram);
    }

    #[cfg(feature = "aliased-ram")]
    #[test]
    fn test_aliased_mode_backing() {
        // Either the mapping works or we degrade; both are usable
        let backing = create_backing(MirrorMode::Aliased).unwrap();
        assert!(matches!(backing.name(), "aliased" | "table"));
    }
}
