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

//! Streaming double-SHA256, the digest used for block identity.
//!
//! The engine is a plain, cheaply cloneable value with no heap state - this
//! is what lets [`mine`](crate::header::Header::mine) hash the 76-byte prefix
//! of a header once per timestamp tick and fork that state for every nonce
//! it tries, instead of re-hashing the whole header on every attempt.

use bitcoin_hashes::{sha256, Hash as HashTrait, HashEngine};

/// Streaming double-SHA256 engine: `init`, any number of `update`s, then
/// [`finalize`](Self::finalize).
#[derive(Clone)]
pub struct DoubleSha256 {
    engine: sha256::HashEngine,
}

impl DoubleSha256 {
    pub fn new() -> Self {
        Self {
            engine: sha256::Hash::engine(),
        }
    }

    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.engine.input(bytes);
    }

    #[inline]
    pub fn update_u32(&mut self, v: u32) {
        self.update(&v.to_le_bytes());
    }

    #[inline]
    pub fn update_i32(&mut self, v: i32) {
        self.update_u32(v as u32);
    }

    /// Copy the current state so the copy can be extended independently of
    /// `self`. This is the "prefix snapshot" the mining loop relies on.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Consume the engine and produce `SHA256(SHA256(absorbed bytes))`.
    pub fn finalize(self) -> [u8; 32] {
        let first: [u8; 32] = sha256::Hash::from_engine(self.engine).into_inner();
        sha256::Hash::hash(&first).into_inner()
    }
}

impl Default for DoubleSha256 {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience one-shot double-SHA256 over a single buffer.
pub fn double_sha256(bytes: &[u8]) -> [u8; 32] {
    let mut engine = DoubleSha256::new();
    engine.update(bytes);
    engine.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_two_independent_sha256_passes() {
        let data = b"libsatoshi";
        let once = double_sha256(data);

        let first = sha256::Hash::hash(data).into_inner();
        let twice = sha256::Hash::hash(&first).into_inner();
        assert_eq!(once, twice);
    }

    #[test]
    fn integer_updates_are_byte_identical_to_raw_updates() {
        let mut via_helper = DoubleSha256::new();
        via_helper.update_u32(0xdead_beef);

        let mut via_raw = DoubleSha256::new();
        via_raw.update(&0xdead_beef_u32.to_le_bytes());

        assert_eq!(via_helper.finalize(), via_raw.finalize());
    }

    #[test]
    fn snapshot_forks_independently_of_parent() {
        let mut prefix = DoubleSha256::new();
        prefix.update(b"shared-prefix");

        let mut fork_a = prefix.snapshot();
        fork_a.update(b"-a");

        let mut fork_b = prefix.snapshot();
        fork_b.update(b"-b");

        assert_ne!(fork_a.finalize(), fork_b.finalize());
    }
}
