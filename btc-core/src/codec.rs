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

//! Primitive little-endian integer and raw-byte serialization.
//!
//! This is the lowest layer the rest of the crate composes: a [`Writer`] that
//! never fails (callers size their buffers up front) and a [`Reader`] that
//! fails atomically - a short read never advances the cursor and never
//! leaves a partially consumed field behind.

/// Appends bytes to an in-memory buffer. Writing never fails; callers that
/// care about the final size call [`Writer::with_capacity`] first.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_i32(&mut self, v: i32) {
        self.write_u32(v as u32);
    }

    #[inline]
    pub fn write_raw(&mut self, src: &[u8]) {
        self.buf.extend_from_slice(src);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads primitive fields out of a borrowed byte slice, tracking how many
/// bytes remain. Every `read_*` method either consumes exactly its field and
/// advances the cursor, or consumes nothing and returns `None`.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Current position of the cursor within the original buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_raw(4)?;
        Some(u32::from_le_bytes(bytes.try_into().expect("checked above")))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_u32().map(|v| v as i32)
    }

    #[inline]
    pub fn read_raw(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut w = Writer::with_capacity(10);
        w.write_u32(0x0102_0304);
        w.write_raw(&[0xaa, 0xbb]);
        let bytes = w.into_inner();
        assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01, 0xaa, 0xbb]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u32(), Some(0x0102_0304));
        assert_eq!(r.read_raw(2), Some(&[0xaa, 0xbb][..]));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn short_read_does_not_advance_cursor() {
        let bytes = [0x01, 0x02, 0x03];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u32(), None);
        // cursor untouched: the 3 bytes are all still there
        assert_eq!(r.remaining(), 3);
        assert_eq!(r.read_raw(3), Some(&bytes[..]));
    }

    #[test]
    fn negative_i32_round_trips_unsigned_little_endian() {
        let mut w = Writer::new();
        w.write_i32(-1);
        assert_eq!(w.into_inner(), vec![0xff, 0xff, 0xff, 0xff]);
    }
}
