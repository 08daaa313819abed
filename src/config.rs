// config.rs
//
// Configuration and CLI argument parsing for the emulator monitor

use crate::memory::DEFAULT_MEMORY_SIZE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "riscmon", version, about = "RV32 emulator with an interactive debug monitor")]
pub struct Config {
    /// Raw program image loaded at the reset vector (built-in image if omitted)
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// Run the program to completion without entering the command loop
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub batch: bool,

    /// Write log output to FILE instead of stderr
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Guest memory size in bytes (decimal or 0x-prefixed hex)
    #[arg(long, value_name = "BYTES", value_parser = parse_address, default_value_t = DEFAULT_MEMORY_SIZE)]
    pub memory_size: u32,

    /// Stop `c` after this many instructions
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u64>,
}

/// Parse an address string (decimal or hex with 0x prefix)
pub fn parse_address(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex value: {}", s))
    } else {
        s.parse::<u32>().map_err(|_| format!("invalid value: {}", s))
    }
}
