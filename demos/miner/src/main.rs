// Copyright (C) 2019  Braiins Systems s.r.o.
//
// This file is part of Braiins Open-Source Initiative (BOSI).
//
// BOSI is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// Please, keep in mind that we may also license BOSI or any part thereof
// under a proprietary license. For more information on the terms and conditions
// of such proprietary license or if you have any other questions, please
// contact us at opensource@braiins.com.

//! Reference CLI exercising `btc-core`: build a header from the command
//! line, verify it, or search for a nonce that satisfies its target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use btc_core::header::Header;
use btc_core::target::compact_export;
use btc_logging::{info, warn};

/// Number of nonce attempts per call to `Header::mine` between checks of
/// the Ctrl-C flag. Keeps the search responsive to cancellation without
/// paying a syscall per attempt.
const ATTEMPTS_PER_SLICE: u64 = 200_000;

#[derive(Debug, Parser)]
#[command(
    name = "btc-miner-demo",
    about = "Build, verify, or mine a Bitcoin-style block header"
)]
struct Cli {
    /// Header version
    #[arg(long, default_value_t = 1)]
    version: i32,

    /// Previous block hash, 32 bytes as hex (little-endian field order)
    #[arg(long, default_value = "0000000000000000000000000000000000000000000000000000000000000000")]
    prev_block: String,

    /// Merkle root, 32 bytes as hex (little-endian field order)
    #[arg(long, default_value = "0000000000000000000000000000000000000000000000000000000000000000")]
    merkle_root: String,

    /// Compact target (`nBits`), as hex, e.g. 0x207fffff
    #[arg(long, default_value = "0x207fffff")]
    bits: String,

    /// Starting nonce
    #[arg(long, default_value_t = 0)]
    nonce: u32,

    /// Maximum total nonce attempts before giving up (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    limit: u64,
}

fn parse_hash_hex(field_name: &str, s: &str) -> Result<[u8; 32]> {
    let s = s.trim_start_matches("0x");
    let bytes = hex_decode(s).with_context(|| format!("invalid hex in --{}", field_name))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("--{} must be exactly 32 bytes", field_name))
}

fn parse_bits_hex(s: &str) -> Result<u32> {
    let s = s.trim_start_matches("0x");
    u32::from_str_radix(s, 16).with_context(|| format!("invalid hex in --bits: {}", s))
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(anyhow!("hex string has odd length"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| anyhow!(e)))
        .collect()
}

fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the Unix epoch")
        .as_secs() as u32
}

fn main() -> Result<()> {
    let _guard = btc_logging::setup_for_app(
        btc_logging::LoggingConfig::ASYNC_LOGGER_DRAIN_CHANNEL_SIZE,
    );
    let cli = Cli::parse();

    let mut header = Header {
        version: cli.version,
        prev_block: parse_hash_hex("prev-block", &cli.prev_block)?,
        merkle_root: parse_hash_hex("merkle-root", &cli.merkle_root)?,
        time: unix_timestamp(),
        bits: parse_bits_hex(&cli.bits)?,
        nonce: cli.nonce,
    };

    let target = compact_export(header.bits)
        .map_err(|e| anyhow!(e))
        .context("header's bits field does not decode to a valid target")?;

    info!("starting search"; "bits" => format!("{:#010x}", header.bits), "nonce" => header.nonce);

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            cancelled.store(true, Ordering::SeqCst);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    let mut attempts_so_far: u64 = 0;
    let found = loop {
        if cancelled.load(Ordering::SeqCst) {
            warn!("search cancelled by user");
            break false;
        }

        if cli.limit > 0 && attempts_so_far >= cli.limit {
            break false;
        }

        let slice_limit = match cli.limit {
            0 => ATTEMPTS_PER_SLICE,
            limit => ATTEMPTS_PER_SLICE.min(limit - attempts_so_far),
        };

        if header.mine(&target, slice_limit, unix_timestamp) {
            break true;
        }
        attempts_so_far += slice_limit;
    };

    if found {
        let hash = header.block_hash();
        let mut display_hash = hash;
        display_hash.reverse();
        info!(
            "found a valid header";
            "nonce" => header.nonce,
            "time" => header.time,
            "hash" => hex_encode(&display_hash),
        );
        println!("{}", hex_encode(&display_hash));
        Ok(())
    } else {
        warn!("search did not find a satisfying nonce");
        Err(anyhow!("no satisfying nonce found within the given limit"))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
