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

//! The 80-byte block header: serialization, block hashing, proof-of-work
//! verification, and the mining search loop.

use std::cmp::Ordering;

use crate::codec::{Reader, Writer};
use crate::error::TargetError;
use crate::hash::DoubleSha256;
use crate::target::{compact_export, hash_compare};

/// Canonical on-wire size of a block header, in bytes.
pub const HEADER_SIZE: usize = 80;

/// A Bitcoin block header. Every field is consensus-critical and serialized
/// little-endian, in field-declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub version: i32,
    pub prev_block: [u8; 32],
    pub merkle_root: [u8; 32],
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical wire size; always [`HEADER_SIZE`].
    pub fn size(&self) -> usize {
        HEADER_SIZE
    }

    /// Serialize to the canonical 80-byte little-endian encoding.
    pub fn write(&self) -> [u8; HEADER_SIZE] {
        let mut w = Writer::with_capacity(HEADER_SIZE);
        w.write_i32(self.version);
        w.write_raw(&self.prev_block);
        w.write_raw(&self.merkle_root);
        w.write_u32(self.time);
        w.write_u32(self.bits);
        w.write_u32(self.nonce);

        let bytes = w.into_inner();
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&bytes);
        out
    }

    /// Parse a header from its canonical 80-byte encoding.
    ///
    /// Returns `None` on a short or malformed buffer rather than mutating a
    /// caller-supplied header in place and reporting success separately -
    /// there is no partially-read state to leave behind.
    pub fn read(buf: &[u8]) -> Option<Self> {
        let mut r = Reader::new(buf);

        let version = r.read_i32()?;
        let prev_block = r.read_raw(32)?.try_into().expect("checked length");
        let merkle_root = r.read_raw(32)?.try_into().expect("checked length");
        let time = r.read_u32()?;
        let bits = r.read_u32()?;
        let nonce = r.read_u32()?;

        Some(Self {
            version,
            prev_block,
            merkle_root,
            time,
            bits,
            nonce,
        })
    }

    /// Double-SHA256 of the canonical encoding: the block identity hash.
    pub fn block_hash(&self) -> [u8; 32] {
        let mut engine = DoubleSha256::new();
        engine.update_i32(self.version);
        engine.update(&self.prev_block);
        engine.update(&self.merkle_root);
        engine.update_u32(self.time);
        engine.update_u32(self.bits);
        engine.update_u32(self.nonce);
        engine.finalize()
    }

    /// Check whether this header's hash meets its own `bits` target.
    ///
    /// Fails with [`TargetError`] if `bits` itself doesn't decode to a valid
    /// target - an invalid `bits` encoding can never be "met", but the
    /// caller needs to be able to tell that case apart from a hash that
    /// simply falls short.
    pub fn verify(&self) -> Result<bool, TargetError> {
        let target = compact_export(self.bits)?;
        let hash = self.block_hash();
        Ok(hash_compare(&hash, &target) != Ordering::Greater)
    }

    /// Search for a nonce (and, on nonce wraparound, a fresh timestamp) that
    /// makes [`block_hash`](Self::block_hash) meet `target`.
    ///
    /// `clock` is polled for a new timestamp at the start of every pass over
    /// the nonce space, mirroring how real miners re-stamp a block once
    /// they've exhausted 2^32 nonces without a hit. The version, previous
    /// block, merkle root, time, and bits fields are hashed once per clock
    /// tick into a snapshot, and every nonce attempt forks that snapshot
    /// instead of re-hashing the whole header - this is the optimization
    /// real mining hardware relies on to avoid re-absorbing a static prefix
    /// millions of times a second.
    ///
    /// `limit` bounds the number of nonce attempts across the whole call (0
    /// means unbounded); it exists so a caller can cooperatively cancel a
    /// long search by calling `mine` repeatedly with a small `limit` and
    /// checking some external condition (a Ctrl-C flag, a deadline) between
    /// calls. Returns `true` and leaves `self.time`/`self.nonce` set to the
    /// winning values on success, `false` if `limit` was reached first.
    pub fn mine(&mut self, target: &[u8; 32], limit: u64, mut clock: impl FnMut() -> u32) -> bool {
        let mut attempt: u64 = 0;

        loop {
            self.time = clock();

            let mut prefix = DoubleSha256::new();
            prefix.update_i32(self.version);
            prefix.update(&self.prev_block);
            prefix.update(&self.merkle_root);
            prefix.update_u32(self.time);
            prefix.update_u32(self.bits);

            loop {
                let mut attempt_engine = prefix.snapshot();
                attempt_engine.update_u32(self.nonce);
                let hash = attempt_engine.finalize();

                if hash_compare(&hash, target) != Ordering::Greater {
                    return true;
                }

                self.nonce = self.nonce.wrapping_add(1);

                if limit > 0 {
                    attempt += 1;
                    if attempt == limit {
                        return false;
                    }
                }

                if self.nonce == 0 {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bitcoin mainnet genesis block header.
    fn genesis() -> Header {
        let prev_block = [0u8; 32];

        // Displayed (big-endian) merkle root, flipped to the field's
        // little-endian storage order.
        let mut merkle_root =
            hex_decode("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b");
        merkle_root.reverse();

        Header {
            version: 1,
            prev_block,
            merkle_root,
            time: 1231006505,
            bits: 0x1d00ffff,
            nonce: 2083236893,
        }
    }

    fn hex_decode(s: &str) -> [u8; 32] {
        let bytes: Vec<u8> = (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect();
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        out
    }

    #[test]
    fn write_then_read_round_trips() {
        let hdr = genesis();
        let encoded = hdr.write();
        assert_eq!(encoded.len(), HEADER_SIZE);

        let decoded = Header::read(&encoded).unwrap();
        assert_eq!(decoded, hdr);
    }

    #[test]
    fn read_rejects_short_buffer() {
        let hdr = genesis();
        let encoded = hdr.write();
        assert!(Header::read(&encoded[..HEADER_SIZE - 1]).is_none());
    }

    #[test]
    fn genesis_block_hash_matches_known_value() {
        let hdr = genesis();
        let mut hash = hdr.block_hash();
        // Stored hash is little-endian; flip to the conventional display order.
        hash.reverse();

        let expected = hex_decode("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f");
        assert_eq!(hash, expected);
    }

    #[test]
    fn genesis_header_verifies_against_its_own_bits() {
        let hdr = genesis();
        assert!(hdr.verify().unwrap());
    }

    #[test]
    fn verify_propagates_invalid_bits() {
        let mut hdr = genesis();
        hdr.bits = 0x0000_0000;
        assert!(hdr.verify().is_err());
    }

    #[test]
    fn mine_finds_a_nonce_under_an_easy_target() {
        let mut hdr = genesis();
        hdr.nonce = 0;

        // Target with the top byte zeroed: roughly 1-in-256 hashes qualify.
        let mut easy_target = [0xffu8; 32];
        easy_target[0] = 0x00;

        let mut tick = 1231006505u32;
        let found = hdr.mine(&easy_target, 0, || {
            let t = tick;
            tick += 1;
            t
        });

        assert!(found);
        assert!(hdr.verify().is_ok());
    }

    #[test]
    fn mine_respects_the_attempt_limit() {
        let mut hdr = genesis();
        hdr.nonce = 0;

        // An effectively unreachable target: only a limit stops the search.
        let impossible_target = [0u8; 32];

        let found = hdr.mine(&impossible_target, 16, || 1231006505);
        assert!(!found);
        assert_eq!(hdr.nonce, 16);
    }
}
