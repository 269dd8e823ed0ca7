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

//! The binary layout shared by in-memory and persisted filters.
//!
//! ```text
//! offset 0   : u32      size        (number of bits)
//! offset 4   : u32      num_hashes  (1..=30)
//! offset 8   : u32[30]  seeds       (only the first num_hashes are meaningful)
//! offset 128 : u64[ceil(size / 64)] bit-array words
//! ```
//!
//! Every field is little-endian and there is no padding. Fields are decoded
//! with explicit byte-order routines, so the buffer itself needs no particular
//! alignment.

use byteorder::ByteOrder;
use byteorder::LittleEndian;

use crate::error::Error;

/// Capacity of the seed array in the header.
pub const MAX_SEEDS: usize = 30;

/// Byte offset of the `size` field.
pub const SIZE_OFFSET: usize = 0;
/// Byte offset of the `num_hashes` field.
pub const NUM_HASHES_OFFSET: usize = 4;
/// Byte offset of the first seed.
pub const SEEDS_OFFSET: usize = 8;
/// Byte offset of the first bit-array word.
pub const WORDS_OFFSET: usize = SEEDS_OFFSET + MAX_SEEDS * 4;
/// Length of the fixed header, in bytes.
pub const HEADER_SIZE: usize = WORDS_OFFSET;

const BITS_PER_WORD: u64 = 64;
const BYTES_PER_WORD: usize = 8;

/// Returns the number of 64-bit words needed to hold `num_bits` bits.
pub fn num_words(num_bits: u32) -> usize {
    (num_bits as usize).div_ceil(BITS_PER_WORD as usize)
}

/// Returns the total buffer length for a filter of `num_bits` bits.
///
/// # Examples
///
/// ```
/// # use seeded_bloom::layout;
/// assert_eq!(layout::total_size(64), 136);
/// assert_eq!(layout::total_size(65), 144);
/// ```
pub fn total_size(num_bits: u32) -> usize {
    HEADER_SIZE + num_words(num_bits) * BYTES_PER_WORD
}

/// The fixed fields of a decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub num_bits: u32,
    pub num_hashes: u32,
}

impl Header {
    /// Decodes and validates the header of `buf`.
    ///
    /// The header is trusted as ground truth for the layout, but it must be
    /// structurally consistent with the buffer holding it.
    pub fn decode(buf: &[u8]) -> Result<Header, Error> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short("header", HEADER_SIZE, buf.len()));
        }

        let num_bits = read_num_bits(buf);
        let num_hashes = read_num_hashes(buf);

        if num_bits == 0 {
            return Err(Error::contract_violation("declared size must be positive")
                .with_context("size", num_bits));
        }
        if num_hashes == 0 || num_hashes as usize > MAX_SEEDS {
            return Err(Error::contract_violation(format!(
                "num_hashes must be in [1, {MAX_SEEDS}]"
            ))
            .with_context("num_hashes", num_hashes));
        }

        let expected = total_size(num_bits);
        if buf.len() < expected {
            return Err(Error::buffer_too_short("bit array", expected, buf.len())
                .with_context("size", num_bits));
        }

        Ok(Header {
            num_bits,
            num_hashes,
        })
    }

    /// Writes the fixed fields into `buf`.
    pub fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[SIZE_OFFSET..], self.num_bits);
        LittleEndian::write_u32(&mut buf[NUM_HASHES_OFFSET..], self.num_hashes);
    }
}

pub(crate) fn read_num_bits(buf: &[u8]) -> u32 {
    LittleEndian::read_u32(&buf[SIZE_OFFSET..])
}

pub(crate) fn read_num_hashes(buf: &[u8]) -> u32 {
    LittleEndian::read_u32(&buf[NUM_HASHES_OFFSET..])
}

pub(crate) fn read_seed(buf: &[u8], i: usize) -> u32 {
    debug_assert!(i < MAX_SEEDS);
    LittleEndian::read_u32(&buf[SEEDS_OFFSET + i * 4..])
}

pub(crate) fn write_seed(buf: &mut [u8], i: usize, seed: u32) {
    debug_assert!(i < MAX_SEEDS);
    LittleEndian::write_u32(&mut buf[SEEDS_OFFSET + i * 4..], seed);
}

fn word_offset(word_index: usize) -> usize {
    WORDS_OFFSET + word_index * BYTES_PER_WORD
}

pub(crate) fn read_word(buf: &[u8], word_index: usize) -> u64 {
    LittleEndian::read_u64(&buf[word_offset(word_index)..])
}

pub(crate) fn write_word(buf: &mut [u8], word_index: usize, word: u64) {
    LittleEndian::write_u64(&mut buf[word_offset(word_index)..], word);
}

/// Gets the value of a single bit of a filter with `num_bits` bits.
pub(crate) fn get_bit(buf: &[u8], num_bits: u32, bit_index: u64) -> bool {
    debug_assert!(
        bit_index < u64::from(num_bits),
        "bit index {bit_index} out of range for {num_bits} bits"
    );
    let word_index = (bit_index / BITS_PER_WORD) as usize;
    let mask = 1u64 << (bit_index % BITS_PER_WORD);
    (read_word(buf, word_index) & mask) != 0
}

/// Sets a single bit of a filter with `num_bits` bits, returning whether it
/// was previously unset.
pub(crate) fn set_bit(buf: &mut [u8], num_bits: u32, bit_index: u64) -> bool {
    debug_assert!(
        bit_index < u64::from(num_bits),
        "bit index {bit_index} out of range for {num_bits} bits"
    );
    let word_index = (bit_index / BITS_PER_WORD) as usize;
    let mask = 1u64 << (bit_index % BITS_PER_WORD);

    let word = read_word(buf, word_index);
    if (word & mask) == 0 {
        write_word(buf, word_index, word | mask);
        true
    } else {
        false
    }
}

/// Zeroes the whole bit-array region of a filter with `num_bits` bits.
pub(crate) fn clear_words(buf: &mut [u8], num_bits: u32) {
    buf[WORDS_OFFSET..total_size(num_bits)].fill(0);
}

/// Counts set bits among the first `num_bits` bits of the bit-array region.
pub(crate) fn count_ones(buf: &[u8], num_bits: u32) -> u64 {
    let words = num_words(num_bits);
    // Mask off excess bits in the last word
    let excess_bits = u64::from(num_bits) % BITS_PER_WORD;
    (0..words)
        .map(|w| {
            let mut word = read_word(buf, w);
            if w + 1 == words && excess_bits != 0 {
                word &= (1u64 << excess_bits) - 1;
            }
            u64::from(word.count_ones())
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn blank(num_bits: u32, num_hashes: u32) -> Vec<u8> {
        let mut buf = vec![0u8; total_size(num_bits)];
        Header {
            num_bits,
            num_hashes,
        }
        .encode(&mut buf);
        buf
    }

    #[test]
    fn test_offsets_match_packed_layout() {
        assert_eq!(SIZE_OFFSET, 0);
        assert_eq!(NUM_HASHES_OFFSET, 4);
        assert_eq!(SEEDS_OFFSET, 8);
        assert_eq!(WORDS_OFFSET, 128);
        assert_eq!(HEADER_SIZE, 128);
    }

    #[test]
    fn test_total_size() {
        assert_eq!(total_size(1), 136);
        assert_eq!(total_size(64), 136);
        assert_eq!(total_size(128), 144);
        assert_eq!(total_size(9600), 128 + 150 * 8);
    }

    #[test]
    fn test_header_is_little_endian() {
        let mut buf = blank(0x0102_0304, 7);
        write_seed(&mut buf, 0, 0xAABB_CCDD);
        assert_eq!(&buf[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[4..8], &[7, 0, 0, 0]);
        assert_eq!(&buf[8..12], &[0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn test_bit_zero_of_word_is_lowest_byte_bit() {
        let mut buf = blank(128, 1);
        assert!(set_bit(&mut buf, 128, 0));
        assert!(set_bit(&mut buf, 128, 65));
        assert_eq!(buf[WORDS_OFFSET], 0b0000_0001);
        assert_eq!(buf[WORDS_OFFSET + 8], 0b0000_0010);
        assert_eq!(read_word(&buf, 0), 1);
        assert_eq!(read_word(&buf, 1), 2);
    }

    #[test]
    fn test_set_and_get_bit() {
        let mut buf = blank(192, 3);
        for index in [0, 1, 63, 64, 127, 191] {
            assert!(!get_bit(&buf, 192, index));
            assert!(set_bit(&mut buf, 192, index));
            assert!(get_bit(&buf, 192, index));
            assert!(!set_bit(&mut buf, 192, index));
        }
        assert_eq!(count_ones(&buf, 192), 6);

        clear_words(&mut buf, 192);
        assert_eq!(count_ones(&buf, 192), 0);
        assert_eq!(read_num_bits(&buf), 192);
        assert_eq!(read_num_hashes(&buf), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_set_bit_past_size_panics() {
        // bit 120 lives in the padding of the second word of a 100-bit filter
        let mut buf = blank(100, 1);
        set_bit(&mut buf, 100, 120);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_get_bit_past_size_panics() {
        let buf = blank(100, 1);
        get_bit(&buf, 100, 100);
    }

    #[test]
    fn test_count_ones_ignores_bits_past_size() {
        let mut buf = blank(100, 1);
        write_word(&mut buf, 1, u64::MAX);
        assert_eq!(count_ones(&buf, 100), 36);
    }

    #[test]
    fn test_decode_valid_header() {
        let buf = blank(256, 5);
        let header = Header::decode(&buf).unwrap();
        assert_eq!(header.num_bits, 256);
        assert_eq!(header.num_hashes, 5);
    }

    #[test]
    fn test_decode_rejects_short_header() {
        let err = Header::decode(&[0u8; 64]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }

    #[test]
    fn test_decode_rejects_bad_fields() {
        let err = Header::decode(&blank(0, 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);

        let err = Header::decode(&blank(64, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);

        let err = Header::decode(&blank(64, 31)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }

    #[test]
    fn test_decode_rejects_truncated_bit_array() {
        let buf = blank(1024, 4);
        let err = Header::decode(&buf[..buf.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }
}
