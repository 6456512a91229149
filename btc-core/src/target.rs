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

//! Compact (`nBits`) target encoding, decoding, and the orientation-aware
//! comparison `verify`/`mine` are built on.
//!
//! `bits` is a 32-bit floating-point-like encoding: the top byte is a byte
//! count (`size`), the low 3 bytes are a mantissa, and bit 23 of the
//! mantissa doubles as a sign flag. The decoded target is always written out
//! as a 32-byte **big-endian** integer, matching the hex string Bitcoin
//! tooling prints for a target. A header's block hash, by contrast, is the
//! raw double-SHA256 digest read as a **little-endian** 256-bit integer
//! (§3/§4.3 of the design). [`hash_compare`] is the one place that has to
//! know about both orientations at once.

use std::cmp::Ordering;

use primitive_types::U256;

use crate::error::TargetError;

const MANTISSA_MASK: u32 = 0x007f_ffff;
const SIGN_MASK: u32 = 0x0080_0000;

/// Decode a compact `bits` value into a 32-byte big-endian target.
///
/// Mirrors `arith_uint256::SetCompact` bit-for-bit, with one deliberate
/// deviation: a zero mantissa is rejected outright rather than decoded to an
/// all-zero target. A target of zero can never be met by any hash, so
/// treating it as a decode failure (rather than a target nothing can ever
/// satisfy) is this crate's resolution of the open question in the design.
pub fn compact_export(bits: u32) -> Result<[u8; 32], TargetError> {
    let size = bits >> 24;
    let mantissa = bits & MANTISSA_MASK;

    if mantissa == 0 {
        return Err(TargetError::Negative(bits));
    }

    if (bits & SIGN_MASK) != 0 {
        return Err(TargetError::Negative(bits));
    }

    if size > 34 {
        return Err(TargetError::ExponentOutOfRange(bits));
    }

    // Bit-exact with Bitcoin Core's overflow guard: a mantissa occupying more
    // than 8 significant bits can't be shifted left 248 bits (size 34) and
    // stay under 256 bits; more than 16 significant bits can't survive a
    // 240-bit shift (size 33) either.
    if (mantissa > 0xff && size > 33) || (mantissa > 0xffff && size > 32) {
        return Err(TargetError::Overflow(bits));
    }

    let value = if size <= 3 {
        U256::from(mantissa >> (8 * (3 - size)))
    } else {
        U256::from(mantissa) << (8 * (size - 3))
    };

    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    Ok(out)
}

/// Encode a 32-byte big-endian target into its minimal compact `bits` form.
///
/// Inverse of [`compact_export`]: picks the smallest `size` that lets the
/// mantissa fit in 23 unsigned bits, bumping `size` by one and shifting the
/// mantissa down a byte whenever the natural encoding would set the sign
/// bit (the same normalization `arith_uint256::GetCompact` performs).
pub fn compact_import(target_be: &[u8; 32]) -> u32 {
    let value = U256::from_big_endian(target_be);

    if value.is_zero() {
        return 0;
    }

    let mut size = (value.bits() as u32 + 7) / 8;
    let mut mantissa = if size <= 3 {
        (value.low_u64() << (8 * (3 - size))) as u32
    } else {
        (value >> (8 * (size - 3))).low_u32()
    };

    if (mantissa & SIGN_MASK) != 0 {
        mantissa >>= 8;
        size += 1;
    }

    mantissa | (size << 24)
}

/// Three-way comparison of a block hash (little-endian bytes) against a
/// target (big-endian bytes, as produced by [`compact_export`]).
///
/// `hash_compare(hash, target) != Ordering::Greater` is the proof-of-work
/// predicate: the hash meets the target.
pub fn hash_compare(hash_le: &[u8; 32], target_be: &[u8; 32]) -> Ordering {
    let hash = U256::from_little_endian(hash_le);
    let target = U256::from_big_endian(target_be);
    hash.cmp(&target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex32(s: &str) -> [u8; 32] {
        let bytes = hex_decode(s);
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        out
    }

    // Minimal hex decoder so tests don't need an extra dependency.
    fn hex_decode(s: &str) -> Vec<u8> {
        assert_eq!(s.len() % 2, 0);
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn decodes_difficulty_1_target() {
        let target = compact_export(0x1d00_ffff).unwrap();
        assert_eq!(
            target,
            hex32("00000000ffff0000000000000000000000000000000000000000000000000000")
        );
    }

    #[test]
    fn rejects_zero_mantissa() {
        assert_eq!(
            compact_export(0x0000_0000),
            Err(TargetError::Negative(0x0000_0000))
        );
    }

    #[test]
    fn rejects_sign_bit() {
        assert!(matches!(
            compact_export(0x01fe_dcba),
            Err(TargetError::Negative(_))
        ));
    }

    #[test]
    fn rejects_oversize_exponent() {
        assert!(matches!(
            compact_export(0xff00_0001),
            Err(TargetError::ExponentOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_overflowing_mantissa_at_size_34() {
        // size = 34, mantissa > 0xff: would need more than 256 bits.
        assert!(matches!(
            compact_export(0x2201_0000),
            Err(TargetError::Overflow(_))
        ));
    }

    #[test]
    fn accepts_size_32_with_top_mantissa_bit() {
        // size = 32 never overflows, regardless of mantissa.
        assert!(compact_export(0x2000_ffff).is_ok());
    }

    #[test]
    fn compact_round_trips_for_difficulty_1() {
        let target = compact_export(0x1d00_ffff).unwrap();
        assert_eq!(compact_import(&target), 0x1d00_ffff);
    }

    #[test]
    fn compact_round_trips_with_sign_bump() {
        // A mantissa whose top bit would be set after minimal-size encoding
        // must bump the size and shift down a byte to stay non-negative.
        let target = compact_export(0x0400_8000).unwrap();
        assert_eq!(compact_import(&target), 0x0400_8000);
    }

    #[test]
    fn hash_compare_orders_by_numeric_value_not_bytes() {
        // target: 0x00...00 ff (big-endian) == 255
        let mut target = [0u8; 32];
        target[31] = 0xff;

        // hash: 0x01 followed by zeros, little-endian == 1
        let mut hash = [0u8; 32];
        hash[0] = 0x01;

        assert_eq!(hash_compare(&hash, &target), Ordering::Less);
    }
}
