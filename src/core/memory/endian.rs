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

//! Typed load/store primitives
//!
//! The R3000A is little-endian. Every byte-order decision of the table path
//! goes through [`GuestWord::load_guest`] and [`GuestWord::store_guest`]; the
//! direct path uses the host-order variants instead.

use std::fmt;

/// Guest byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Byte order of every multi-byte value stored in guest memory
pub const GUEST_ENDIAN: Endian = Endian::Little;

/// A value that can be loaded from and stored to a guest buffer
pub trait GuestWord: Copy + Default + PartialEq + fmt::Debug + fmt::UpperHex {
    /// Access width in bytes
    const SIZE: usize;

    /// Build a value from exactly `SIZE` bytes in guest order
    fn load_guest(bytes: &[u8]) -> Self;

    /// Write the value as exactly `SIZE` bytes in guest order
    fn store_guest(self, bytes: &mut [u8]);

    /// Build a value from exactly `SIZE` bytes in host order
    fn load_host(bytes: &[u8]) -> Self;

    /// Write the value as exactly `SIZE` bytes in host order
    fn store_host(self, bytes: &mut [u8]);

    /// Zero-extend to 32 bits
    fn to_u32(self) -> u32;

    /// Truncate from 32 bits
    fn from_u32(value: u32) -> Self;
}

macro_rules! impl_guest_word {
    ($t:ty) => {
        impl GuestWord for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline(always)]
            fn load_guest(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                match GUEST_ENDIAN {
                    Endian::Little => <$t>::from_le_bytes(raw),
                    Endian::Big => <$t>::from_be_bytes(raw),
                }
            }

            #[inline(always)]
            fn store_guest(self, bytes: &mut [u8]) {
                let raw = match GUEST_ENDIAN {
                    Endian::Little => self.to_le_bytes(),
                    Endian::Big => self.to_be_bytes(),
                };
                bytes.copy_from_slice(&raw);
            }

            #[inline(always)]
            fn load_host(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_ne_bytes(raw)
            }

            #[inline(always)]
            fn store_host(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_ne_bytes());
            }

            #[inline(always)]
            fn to_u32(self) -> u32 {
                self as u32
            }

            #[inline(always)]
            fn from_u32(value: u32) -> Self {
                value as $t
            }
        }
    };
}

impl_guest_word!(u8);
impl_guest_word!(u16);
impl_guest_word!(u32);

/// Load a guest-order value at `index`
///
/// Bytes past the end of `buf` wrap to its start when `wrap` is set and read
/// as zero otherwise.
#[inline(always)]
pub(super) fn load<T: GuestWord>(buf: &[u8], index: usize, wrap: bool) -> T {
    if let Some(bytes) = buf.get(index..index + T::SIZE) {
        return T::load_guest(bytes);
    }
    let mut raw = [0u8; 4];
    for (i, byte) in raw.iter_mut().take(T::SIZE).enumerate() {
        *byte = if wrap {
            buf[(index + i) % buf.len()]
        } else {
            buf.get(index + i).copied().unwrap_or(0)
        };
    }
    T::load_guest(&raw[..T::SIZE])
}

/// Store a guest-order value at `index`
///
/// Bytes past the end of `buf` wrap to its start when `wrap` is set and are
/// dropped otherwise.
#[inline(always)]
pub(super) fn store<T: GuestWord>(buf: &mut [u8], index: usize, value: T, wrap: bool) {
    if let Some(bytes) = buf.get_mut(index..index + T::SIZE) {
        value.store_guest(bytes);
        return;
    }
    let mut raw = [0u8; 4];
    value.store_guest(&mut raw[..T::SIZE]);
    let len = buf.len();
    for (i, byte) in raw.iter().take(T::SIZE).enumerate() {
        if wrap {
            buf[(index + i) % len] = *byte;
        } else if let Some(slot) = buf.get_mut(index + i) {
            *slot = *byte;
        }
    }
}
