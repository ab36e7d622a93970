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

//! Machine reset and BIOS image loading
//!
//! On every reset RAM, the parallel port window and the BIOS ROM are zeroed
//! and the BIOS image named by the configuration is looked up in the BIOS
//! directory (file names compared case-insensitively). When no usable image
//! is found the emulator switches to HLE BIOS functions.

use super::region::BIOS_SIZE;
use super::Memory;
use crate::core::config::MemoryConfig;
use crate::core::error::{EmulatorError, Result};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Why HLE BIOS functions are in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HleReason {
    /// HLE was already selected by the configuration
    Requested,
    /// The BIOS directory could not be opened
    MissingDirectory,
    /// No matching, non-empty image was found
    NotFound,
}

/// Result of a reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// A full 512KB image was loaded
    Loaded { path: PathBuf },
    /// A short image was loaded; the rest of the ROM stays zero
    Truncated { path: PathBuf, bytes: usize },
    /// No image loaded, HLE BIOS functions in use
    Hle(HleReason),
}

impl BootOutcome {
    /// Whether the reset ended in HLE mode
    pub fn is_hle(&self) -> bool {
        matches!(self, BootOutcome::Hle(_))
    }
}

impl fmt::Display for BootOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootOutcome::Loaded { path } => write!(f, "loaded {}", path.display()),
            BootOutcome::Truncated { path, bytes } => write!(
                f,
                "loaded {} ({} of {} bytes)",
                path.display(),
                bytes,
                BIOS_SIZE
            ),
            BootOutcome::Hle(HleReason::Requested) => write!(f, "HLE (requested)"),
            BootOutcome::Hle(HleReason::MissingDirectory) => {
                write!(f, "HLE (BIOS directory not found)")
            }
            BootOutcome::Hle(HleReason::NotFound) => write!(f, "HLE (BIOS image not found)"),
        }
    }
}

impl Memory {
    /// Reset memory and load the BIOS image
    ///
    /// Clears RAM, the parallel port window and the BIOS ROM, then looks up
    /// `config.bios` in `config.bios_dir`. `config.hle` is updated to reflect
    /// the outcome. The scratchpad and the cache control state are left as
    /// they are.
    ///
    /// Never fails: every problem ends in an HLE outcome.
    ///
    /// # Example
    ///
    /// ```
    /// use psxmem::core::config::MemoryConfig;
    /// use psxmem::core::memory::{BootOutcome, HleReason, Memory};
    ///
    /// let mut config = MemoryConfig {
    ///     bios_dir: "/nonexistent/bios".into(),
    ///     ..MemoryConfig::default()
    /// };
    /// let mut memory = Memory::new(&config).unwrap();
    ///
    /// let outcome = memory.reset(&mut config);
    /// assert_eq!(outcome, BootOutcome::Hle(HleReason::MissingDirectory));
    /// assert!(config.hle);
    /// ```
    pub fn reset(&mut self, config: &mut MemoryConfig) -> BootOutcome {
        self.ram.clear();
        self.parallel.fill(0);
        self.bios.fill(0);

        let outcome = self.find_bios(config);
        config.hle = outcome.is_hle();
        if config.hle {
            log::info!("Using HLE emulated BIOS functions. Expect incompatibilities.");
        }
        outcome
    }

    fn find_bios(&mut self, config: &MemoryConfig) -> BootOutcome {
        if config.hle {
            return BootOutcome::Hle(HleReason::Requested);
        }

        let entries = match fs::read_dir(&config.bios_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::info!(
                    "Could not open BIOS directory \"{}\" ({}). Enabling HLE BIOS",
                    config.bios_dir.display(),
                    e
                );
                return BootOutcome::Hle(HleReason::MissingDirectory);
            }
        };

        for entry in entries.flatten() {
            if !entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(&config.bios)
            {
                continue;
            }

            let path = entry.path();
            match self.load_bios(&path) {
                Ok(0) => {
                    log::warn!("Skipping empty BIOS file {}", path.display());
                }
                Ok(bytes) if bytes < BIOS_SIZE => {
                    log::warn!(
                        "BIOS file {} is smaller than expected ({} of {} bytes)",
                        path.display(),
                        bytes,
                        BIOS_SIZE
                    );
                    return BootOutcome::Truncated { path, bytes };
                }
                Ok(_) => {
                    log::info!("Loaded BIOS image: {}", path.display());
                    return BootOutcome::Loaded { path };
                }
                Err(EmulatorError::BiosNotFound(_)) => {
                    log::debug!("Could not open BIOS candidate {}", path.display());
                }
                Err(e) => {
                    log::warn!("Failed to read BIOS file {}: {}", path.display(), e);
                }
            }
        }

        log::info!(
            "Could not locate BIOS \"{}\". Enabling HLE BIOS",
            config.bios
        );
        BootOutcome::Hle(HleReason::NotFound)
    }

    /// Load a BIOS image file into the ROM buffer
    ///
    /// Reads up to 512KB; a shorter file leaves the rest of the ROM as it
    /// was. On a read error the ROM is zeroed.
    ///
    /// # Returns
    ///
    /// - `Ok(bytes)` with the number of bytes read
    /// - `Err(EmulatorError::BiosNotFound)` if the file cannot be opened
    /// - `Err(EmulatorError::Io)` if reading fails
    pub fn load_bios(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let mut file =
            File::open(path).map_err(|_| EmulatorError::BiosNotFound(path.display().to_string()))?;

        match read_up_to(&mut file, &mut self.bios) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.bios.fill(0);
                Err(e.into())
            }
        }
    }
}

/// Fill `buf` from `reader` until it is full or the reader is exhausted
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
