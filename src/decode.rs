// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Decoding of the primitive constituents of the
//! [Avro binary encoding](https://avro.apache.org/docs/++version++/specification/#binary-encoding):
//! zig-zag varints, IEEE-754 floats, length-prefixed bytes and strings, fixed
//! byte runs, and the block structure of arrays and maps.

use crate::AvroResult;
use crate::error::Details;
use crate::util::{decode_variable, safe_len};

/// Maximum number of bytes of a zig-zag encoded `long`.
const MAX_LONG_VARINT_BYTES: usize = 10;
/// Maximum number of bytes of a zig-zag encoded `int`.
const MAX_INT_VARINT_BYTES: usize = 5;

/// A cursor over a single Avro-encoded datum held in memory.
///
/// Every `read_*` operation decodes at the current position and advances past
/// the consumed bytes. A decoder is driven through exactly one datum and has
/// no meaning beyond it; decoding failures leave the position unspecified.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True when every byte of the input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> AvroResult<&'a [u8]> {
        match self.buf.get(self.pos..self.pos + n) {
            Some(bytes) => {
                self.pos += n;
                Ok(bytes)
            }
            None => Err(Details::UnexpectedEof.into()),
        }
    }

    fn zag(&mut self, max_bytes: usize) -> AvroResult<i64> {
        let (unsigned, consumed) = decode_variable(&self.buf[self.pos..], max_bytes)?;
        self.pos += consumed;
        Ok(((unsigned >> 1) as i64) ^ -((unsigned & 1) as i64))
    }

    /// Read a `null`. Nothing is consumed; a null occupies no bytes.
    pub fn read_null(&mut self) -> AvroResult<()> {
        Ok(())
    }

    /// Read a `boolean`: one byte that must be 0 or 1.
    pub fn read_boolean(&mut self) -> AvroResult<bool> {
        match self.take(1)? {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(Details::BoolValue(*other).into()),
            _ => unreachable!("take(1) returns exactly one byte"),
        }
    }

    /// Read an `int`: a zig-zag varint of at most 5 bytes.
    pub fn read_int(&mut self) -> AvroResult<i32> {
        let n = self.zag(MAX_INT_VARINT_BYTES)?;
        i32::try_from(n).map_err(|_| Details::ZagI32(n).into())
    }

    /// Read a `long`: a zig-zag varint of at most 10 bytes.
    pub fn read_long(&mut self) -> AvroResult<i64> {
        self.zag(MAX_LONG_VARINT_BYTES)
    }

    /// Read a `float`: 4 bytes, little-endian IEEE-754.
    pub fn read_float(&mut self) -> AvroResult<f32> {
        let bytes = self.buf[self.pos..]
            .first_chunk()
            .copied()
            .ok_or(Details::UnexpectedEof)?;
        self.pos += 4;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Read a `double`: 8 bytes, little-endian IEEE-754.
    pub fn read_double(&mut self) -> AvroResult<f64> {
        let bytes = self.buf[self.pos..]
            .first_chunk()
            .copied()
            .ok_or(Details::UnexpectedEof)?;
        self.pos += 8;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Read `bytes`: a long length prefix followed by that many bytes.
    pub fn read_bytes(&mut self) -> AvroResult<Vec<u8>> {
        let len = self.read_long()?;
        let len = usize::try_from(len).map_err(|_| Details::NegativeLength(len))?;
        safe_len(len)?;
        Ok(self.take(len)?.to_vec())
    }

    /// Read a `string`: like [`read_bytes`](Self::read_bytes), with the
    /// content validated as UTF-8.
    pub fn read_string(&mut self) -> AvroResult<String> {
        String::from_utf8(self.read_bytes()?).map_err(|e| Details::ConvertToUtf8(e).into())
    }

    /// Read exactly `buf.len()` bytes of a `fixed` datum into `buf`.
    pub fn read_fixed(&mut self, buf: &mut [u8]) -> AvroResult<()> {
        let bytes = self.take(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn read_fixed_vec(&mut self, size: usize) -> AvroResult<Vec<u8>> {
        safe_len(size)?;
        Ok(self.take(size)?.to_vec())
    }

    /// Read an `enum` index. The caller is responsible for validating the
    /// index against the writer's symbol list.
    pub fn read_enum(&mut self) -> AvroResult<i32> {
        self.read_int()
    }

    /// Read the tag of a `union`: the zero-based index of the chosen branch.
    pub fn read_union_index(&mut self) -> AvroResult<i64> {
        self.read_long()
    }

    /// Read the count of the first block of an `array`.
    ///
    /// Returns the number of items in the block, or 0 at end-of-array. A
    /// negative wire count is normalized: its absolute value is returned and
    /// the block byte-size that follows it is consumed.
    pub fn read_array_start(&mut self) -> AvroResult<i64> {
        self.read_block_header()
    }

    /// Read the count of the next block of an `array`.
    pub fn read_array_next(&mut self) -> AvroResult<i64> {
        self.read_block_header()
    }

    /// Read the count of the first block of a `map`.
    pub fn read_map_start(&mut self) -> AvroResult<i64> {
        self.read_block_header()
    }

    /// Read the count of the next block of a `map`.
    pub fn read_map_next(&mut self) -> AvroResult<i64> {
        self.read_block_header()
    }

    fn read_block_header(&mut self) -> AvroResult<i64> {
        let count = self.read_long()?;
        if count < 0 {
            // A negative count means |count| items follow, preceded by the
            // byte size of the block for skip support. We read items one by
            // one, so the size is only consumed and sanity checked.
            let byte_size = self.read_long()?;
            let byte_size =
                usize::try_from(byte_size).map_err(|_| Details::NegativeLength(byte_size))?;
            safe_len(byte_size)?;
            count.checked_neg().ok_or_else(|| Details::NegativeLength(count).into())
        } else {
            Ok(count)
        }
    }
}
