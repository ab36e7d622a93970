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

//! Error types for the memory subsystem
//!
//! Only setup paths are fallible. Guest loads and stores never fail: unmapped
//! reads return zero and unmapped writes are dropped.

use thiserror::Error;

/// Memory subsystem error
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// A backing buffer or page table could not be allocated
    ///
    /// Fatal: the caller must abort startup.
    #[error("failed to allocate {size} bytes for {region}")]
    AllocationFailure {
        /// Name of the buffer being allocated
        region: &'static str,
        /// Requested size in bytes
        size: usize,
    },

    /// Configuration could not be read, parsed or written
    #[error("configuration error: {0}")]
    Config(String),

    /// The named BIOS image could not be found
    #[error("BIOS not found: {0}")]
    BiosNotFound(String),

    /// An aliased RAM mapping could not be established
    #[error("RAM mapping failed: {0}")]
    MappingFailed(String),

    /// A bulk access did not fit in main RAM
    #[error("invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess {
        /// Guest address of the first byte
        address: u32,
    },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used by fallible memory subsystem operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_failure_message() {
        let err = EmulatorError::AllocationFailure {
            region: "RAM",
            size: 0x200000,
        };
        assert_eq!(err.to_string(), "failed to allocate 2097152 bytes for RAM");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EmulatorError = io.into();
        assert!(matches!(err, EmulatorError::Io(_)));
    }
}
