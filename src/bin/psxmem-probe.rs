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

//! psxmem-probe entry point
//!
//! Initializes the memory subsystem, performs a reset (BIOS lookup) and
//! prints the 32-bit words at the requested guest addresses.

use clap::Parser;
use psxmem::core::memory::{identify_region, Memory};
use psxmem::core::{MemoryConfig, MirrorMode};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "psxmem-probe",
    about = "Initialize PSX memory, load the BIOS and peek at guest addresses."
)]
struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory scanned for the BIOS image
    #[arg(long, value_name = "DIR")]
    bios_dir: Option<PathBuf>,

    /// BIOS file name (matched case-insensitively)
    #[arg(long, value_name = "NAME")]
    bios: Option<String>,

    /// Skip the BIOS image and use HLE BIOS functions
    #[arg(long)]
    hle: bool,

    /// RAM mirroring strategy (table or aliased)
    #[arg(long, value_name = "MODE")]
    mirror: Option<MirrorMode>,

    /// Guest address to read (hex, repeatable)
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    peek: Vec<u32>,
}

fn parse_address(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits = digits.replace('_', "");
    u32::from_str_radix(&digits, 16).map_err(|e| format!("invalid address '{}': {}", raw, e))
}

fn build_config(args: &Args) -> psxmem::Result<MemoryConfig> {
    let mut config = match &args.config {
        Some(path) => MemoryConfig::load(path)?,
        None => MemoryConfig::default(),
    };
    config.apply_env()?;

    if let Some(dir) = &args.bios_dir {
        config.bios_dir = dir.clone();
    }
    if let Some(name) = &args.bios {
        config.bios = name.clone();
    }
    if args.hle {
        config.hle = true;
    }
    if let Some(mode) = args.mirror {
        config.mirror = mode;
    }
    Ok(config)
}

fn main() -> ExitCode {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let mut config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut memory = match Memory::new(&config) {
        Ok(memory) => memory,
        Err(e) => {
            log::error!("Memory initialization failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = memory.reset(&mut config);
    println!("mirror: {}", memory.mirror_name());
    println!("boot:   {}", outcome);

    for &addr in &args.peek {
        println!(
            "0x{:08X}  {:<12}  0x{:08X}",
            addr,
            format!("{:?}", identify_region(addr)),
            memory.read32(addr)
        );
    }

    memory.shutdown();
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0xBFC00000"), Ok(0xBFC0_0000));
        assert_eq!(parse_address("1f801810"), Ok(0x1F80_1810));
        assert_eq!(parse_address("0x8000_0000"), Ok(0x8000_0000));
        assert!(parse_address("0xZZ").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "psxmem-probe",
            "--bios-dir",
            "/tmp/bios",
            "--hle",
            "--mirror",
            "aliased",
            "--peek",
            "0x0",
            "--peek",
            "bfc00000",
        ]);
        assert_eq!(args.peek, vec![0, 0xBFC0_0000]);

        let config = build_config(&args).unwrap();
        assert_eq!(config.bios_dir, PathBuf::from("/tmp/bios"));
        assert!(config.hle);
        assert_eq!(config.mirror, MirrorMode::Aliased);
    }
}
