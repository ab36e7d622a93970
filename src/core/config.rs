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

//! Memory subsystem configuration
//!
//! The configuration is owned by the caller. [`Memory::new`] reads the mirror
//! mode from it, and [`Memory::reset`] reads the BIOS location and may flip
//! `hle` on when no usable image is found.
//!
//! ```toml
//! bios_dir = "bios"
//! bios = "scph1001.bin"
//! hle = false
//! mirror = "table"
//! ```
//!
//! [`Memory::new`]: crate::core::memory::Memory::new
//! [`Memory::reset`]: crate::core::memory::Memory::reset

use super::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding [`MemoryConfig::bios_dir`]
pub const ENV_BIOS_DIR: &str = "PSXMEM_BIOS_DIR";
/// Environment variable overriding [`MemoryConfig::bios`]
pub const ENV_BIOS: &str = "PSXMEM_BIOS";
/// Environment variable overriding [`MemoryConfig::hle`]
pub const ENV_HLE: &str = "PSXMEM_HLE";
/// Environment variable overriding [`MemoryConfig::mirror`]
pub const ENV_MIRROR: &str = "PSXMEM_MIRROR";

/// How the three RAM segments are made to share one 2MB image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorMode {
    /// One heap buffer, mirrors produced by duplicating page-table entries
    #[default]
    Table,
    /// File-backed RAM mapped once per segment plus 64KB guard views
    ///
    /// Falls back to [`MirrorMode::Table`] when the mapping cannot be made.
    Aliased,
}

impl fmt::Display for MirrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorMode::Table => write!(f, "table"),
            MirrorMode::Aliased => write!(f, "aliased"),
        }
    }
}

impl FromStr for MirrorMode {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(MirrorMode::Table),
            "aliased" => Ok(MirrorMode::Aliased),
            other => Err(EmulatorError::Config(format!(
                "unknown mirror mode '{}' (expected 'table' or 'aliased')",
                other
            ))),
        }
    }
}

/// Memory subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Directory scanned for the BIOS image
    pub bios_dir: PathBuf,

    /// BIOS file name, matched case-insensitively
    pub bios: String,

    /// Skip the BIOS image and use high-level BIOS emulation
    ///
    /// Set by the caller to request HLE, and forced on by reset when no
    /// usable image is found.
    pub hle: bool,

    /// RAM mirroring strategy
    pub mirror: MirrorMode,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            bios_dir: PathBuf::from("bios"),
            bios: "scph1001.bin".to_string(),
            hle: false,
            mirror: MirrorMode::Table,
        }
    }
}

impl MemoryConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EmulatorError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| {
            EmulatorError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| EmulatorError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, contents).map_err(|e| {
            EmulatorError::Config(format!("failed to write {}: {}", path.display(), e))
        })
    }

    /// Apply `PSXMEM_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// `hle` accepts `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_BIOS_DIR) {
            self.bios_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(ENV_BIOS) {
            self.bios = name;
        }
        if let Some(flag) = lookup(ENV_HLE) {
            self.hle = parse_flag(&flag).ok_or_else(|| {
                EmulatorError::Config(format!("invalid value '{}' for {}", flag, ENV_HLE))
            })?;
        }
        if let Some(mode) = lookup(ENV_MIRROR) {
            self.mirror = mode.parse()?;
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MemoryConfig::default();
        assert_eq!(config.bios_dir, PathBuf::from("bios"));
        assert_eq!(config.bios, "scph1001.bin");
        assert!(!config.hle);
        assert_eq!(config.mirror, MirrorMode::Table);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = MemoryConfig {
            bios_dir: PathBuf::from("/opt/psx/bios"),
            bios: "SCPH7502.BIN".to_string(),
            hle: true,
            mirror: MirrorMode::Aliased,
        };
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: MemoryConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MemoryConfig = toml::from_str("hle = true\n").unwrap();
        assert!(config.hle);
        assert_eq!(config.bios, "scph1001.bin");
        assert_eq!(config.mirror, MirrorMode::Table);
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory.toml");

        let mut config = MemoryConfig::default();
        config.bios = "scph5501.bin".to_string();
        config.save(&path).unwrap();

        let loaded = MemoryConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = MemoryConfig::load(dir.path().join("nope.toml"));
        assert!(matches!(result, Err(EmulatorError::Config(_))));
    }

    #[test]
    fn test_mirror_mode_parse() {
        assert_eq!("table".parse::<MirrorMode>().unwrap(), MirrorMode::Table);
        assert_eq!("ALIASED".parse::<MirrorMode>().unwrap(), MirrorMode::Aliased);
        assert!("mmap".parse::<MirrorMode>().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BIOS_DIR, "/tmp/bios"),
            (ENV_BIOS, "SCPH1001.BIN"),
            (ENV_HLE, "yes"),
            (ENV_MIRROR, "aliased"),
        ]
        .into_iter()
        .collect();

        let mut config = MemoryConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bios_dir, PathBuf::from("/tmp/bios"));
        assert_eq!(config.bios, "SCPH1001.BIN");
        assert!(config.hle);
        assert_eq!(config.mirror, MirrorMode::Aliased);
    }

    #[test]
    fn test_invalid_hle_override() {
        let mut config = MemoryConfig::default();
        let result = config.apply_overrides(|key| (key == ENV_HLE).then(|| "maybe".to_string()));
        assert!(result.is_err());
        assert!(!config.hle);
    }
}
