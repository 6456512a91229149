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

//! Typed rejection reasons for compact-target decoding.

/// Why a `bits` value was rejected by [`crate::target::compact_export`].
///
/// These three rules are consensus-critical: a node that accepts a `bits`
/// encoding the rest of the network rejects (or vice versa) can fork itself
/// off the real chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    /// The sign bit (bit 23 of the mantissa) was set.
    #[error("compact target {0:#010x} has the sign bit set")]
    Negative(u32),

    /// `size` exceeded the largest value that could ever fit in 256 bits.
    #[error("compact target {0:#010x} has exponent out of range")]
    ExponentOutOfRange(u32),

    /// The decoded value does not fit in a 32-byte big-endian integer.
    #[error("compact target {0:#010x} overflows 256 bits")]
    Overflow(u32),
}
