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

//! Consensus-critical Bitcoin block header primitives: the 80-byte wire
//! format, double-SHA256 block hashing, compact (`nBits`) target encoding,
//! proof-of-work verification, and a mining search loop.
//!
//! This crate deliberately stops at the header. It has no opinion on
//! transactions, the UTXO set, script evaluation, or networking - those are
//! a full node's job. What it guarantees is bit-exactness with the deployed
//! protocol for the handful of primitives every one of those higher layers
//! eventually calls down into.

pub mod codec;
pub mod error;
pub mod hash;
pub mod header;
pub mod target;

pub use error::TargetError;
pub use hash::{double_sha256, DoubleSha256};
pub use header::{Header, HEADER_SIZE};
pub use target::{compact_export, compact_import, hash_compare};
