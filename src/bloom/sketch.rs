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

use std::fmt;

use super::BloomFilterBuilder;
use super::FalsePositiveRate;
use crate::common::RandomSource;
use crate::error::Error;
use crate::hash::hash_bytes;
use crate::layout;
use crate::layout::Header;

/// A Bloom filter whose storage is exactly its serialized form.
///
/// Provides fast membership queries with:
/// - No false negatives (added items always return `true`)
/// - Tunable false positive rate
/// - Constant space usage
///
/// The type parameter is the storage. [`OwnedBloomFilter`] owns a buffer it
/// allocated itself, [`BorrowedBloomFilter`] works in place on memory the
/// caller owns, and `BloomFilter<&[u8]>` is a read-only view.
///
/// No internal synchronization exists. Shared references only read, so
/// concurrent [`has()`](Self::has) calls are fine; mutation needs `&mut self`.
pub struct BloomFilter<B> {
    /// Header, seeds and bit words, laid out as described in [`crate::layout`]
    buf: B,
    /// Number of bits in the filter (m), read from the header
    num_bits: u32,
    /// Number of hash functions to use (k), read from the header
    num_hashes: u32,
    /// Length of the filter's bytes; `buf` may be longer
    total_size: usize,
}

/// A filter that owns its buffer.
pub type OwnedBloomFilter = BloomFilter<Vec<u8>>;

/// A filter adopted in place over a caller-owned buffer.
pub type BorrowedBloomFilter<'a> = BloomFilter<&'a mut [u8]>;

impl OwnedBloomFilter {
    /// Creates a filter sized for `capacity` items at the target `fpr`.
    ///
    /// `max_hashes` caps the number of hash functions; `0` means no explicit
    /// cap. The cap is never more than 30.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument)
    /// if `capacity` is 0 or the filter would not fit the 32-bit size field.
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilter;
    /// # use seeded_bloom::bloom::FalsePositiveRate;
    /// let fpr = FalsePositiveRate::new(0.01).unwrap();
    /// let mut filter = BloomFilter::new(1000, fpr, 0).unwrap();
    ///
    /// filter.add("alpha");
    /// assert!(filter.has("alpha"));
    /// ```
    pub fn new(capacity: u64, fpr: FalsePositiveRate, max_hashes: u32) -> Result<Self, Error> {
        BloomFilterBuilder::with_accuracy(capacity, fpr.value())
            .max_hashes(max_hashes)
            .build()
    }

    /// Allocates a zeroed buffer and writes the header with fresh seeds.
    pub(super) fn with_params<R: RandomSource>(
        num_bits: u32,
        num_hashes: u32,
        rng: &mut R,
    ) -> Self {
        debug_assert!(num_bits > 0);
        debug_assert!(num_hashes >= 1 && num_hashes as usize <= layout::MAX_SEEDS);

        let total_size = layout::total_size(num_bits);
        let mut buf = vec![0u8; total_size];

        Header {
            num_bits,
            num_hashes,
        }
        .encode(&mut buf);
        for i in 0..num_hashes as usize {
            layout::write_seed(&mut buf, i, rng.next_u32());
        }

        tracing::debug!(num_bits, num_hashes, total_size, "created bloom filter");

        BloomFilter {
            buf,
            num_bits,
            num_hashes,
            total_size,
        }
    }
}

impl<B: AsRef<[u8]>> BloomFilter<B> {
    /// Adopts an existing buffer without copying it.
    ///
    /// The header's `size`, `num_hashes` and seeds are taken as ground truth.
    /// A buffer longer than the declared total is accepted; only the first
    /// [`total_size()`](Self::total_size) bytes belong to the filter.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ContractViolation`](crate::error::ErrorKind::ContractViolation)
    /// if:
    /// - The buffer is shorter than the 128-byte header
    /// - The declared size is 0
    /// - The declared hash count is outside `[1, 30]`
    /// - The buffer is shorter than the length the header declares
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilter;
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    /// filter.add("test");
    ///
    /// let mut bytes = filter.as_bytes().to_vec();
    /// let mut restored = BloomFilter::adopt(bytes.as_mut_slice()).unwrap();
    /// assert!(restored.has("test"));
    /// restored.add("more");
    /// ```
    pub fn adopt(buf: B) -> Result<Self, Error> {
        let header = Header::decode(buf.as_ref()).inspect_err(|err| {
            tracing::warn!(len = buf.as_ref().len(), %err, "rejected bloom filter buffer");
        })?;

        let total_size = layout::total_size(header.num_bits);
        tracing::debug!(
            num_bits = header.num_bits,
            num_hashes = header.num_hashes,
            total_size,
            "adopted bloom filter buffer"
        );

        Ok(BloomFilter {
            buf,
            num_bits: header.num_bits,
            num_hashes: header.num_hashes,
            total_size,
        })
    }

    // ========================================================================
    // Query Operations
    // ========================================================================

    /// Tests whether a value is possibly in the set.
    ///
    /// Returns:
    /// - `true`: Value was **possibly** added (or false positive)
    /// - `false`: Value was **definitely not** added
    pub fn has(&self, value: impl AsRef<[u8]>) -> bool {
        let value = value.as_ref();
        (0..self.num_hashes as usize)
            .all(|i| layout::get_bit(self.bytes(), self.num_bits, self.bit_index(value, i)))
    }

    // ========================================================================
    // Statistics and Properties
    // ========================================================================

    /// Returns the fraction of bits set, in `[0, 1]`.
    pub fn fill_rate(&self) -> f64 {
        self.bits_used() as f64 / f64::from(self.num_bits)
    }

    /// Returns the number of bits set to 1.
    pub fn bits_used(&self) -> u64 {
        layout::count_ones(self.bytes(), self.num_bits)
    }

    /// Returns whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits_used() == 0
    }

    /// Estimates the current false positive probability.
    ///
    /// Based on the formula: `load^k`
    /// where k = num_hashes and load = [`fill_rate()`](Self::fill_rate).
    /// This is approximate and assumes uniform bit distribution.
    pub fn estimated_fpp(&self) -> f64 {
        self.fill_rate().powi(self.num_hashes as i32)
    }

    /// Returns the number of bits in the filter.
    pub fn size(&self) -> u32 {
        self.num_bits
    }

    /// Returns the number of hash functions used.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Returns the length of the filter's bytes: header plus bit words.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Returns the seeds of the active hash functions.
    pub fn seeds(&self) -> Vec<u32> {
        (0..self.num_hashes as usize)
            .map(|i| layout::read_seed(self.bytes(), i))
            .collect()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Returns the filter's bytes, ready to be persisted or sent.
    ///
    /// The slice is exactly [`total_size()`](Self::total_size) long.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes()
    }

    /// Copies the filter's bytes into a new filter that owns them.
    pub fn to_owned_filter(&self) -> OwnedBloomFilter {
        BloomFilter {
            buf: self.bytes().to_vec(),
            num_bits: self.num_bits,
            num_hashes: self.num_hashes,
            total_size: self.total_size,
        }
    }

    /// Releases the storage.
    pub fn into_inner(self) -> B {
        self.buf
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn bytes(&self) -> &[u8] {
        &self.buf.as_ref()[..self.total_size]
    }

    /// Computes the bit index of `value` for the `i`-th hash function.
    fn bit_index(&self, value: &[u8], i: usize) -> u64 {
        let seed = layout::read_seed(self.bytes(), i);
        u64::from(hash_bytes(value, seed) % self.num_bits)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BloomFilter<B> {
    // ========================================================================
    // Update Operations
    // ========================================================================

    /// Adds a value to the filter.
    ///
    /// After adding, `has(value)` will return `true` until the next
    /// [`clear()`](Self::clear).
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    ///
    /// filter.add("apple");
    /// filter.add(b"raw bytes");
    ///
    /// assert!(filter.has("apple"));
    /// ```
    pub fn add(&mut self, value: impl AsRef<[u8]>) {
        let value = value.as_ref();
        let num_bits = self.num_bits;
        for i in 0..self.num_hashes as usize {
            let bit_index = self.bit_index(value, i);
            layout::set_bit(self.bytes_mut(), num_bits, bit_index);
        }
    }

    /// Tests and adds a value in a single operation.
    ///
    /// Returns whether the value was possibly already in the set before adding.
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// let mut filter = BloomFilterBuilder::with_accuracy(100, 0.01).build().unwrap();
    ///
    /// assert!(!filter.has_and_add("apple")); // First insertion
    /// assert!(filter.has_and_add("apple")); // Now it's in the set
    /// ```
    pub fn has_and_add(&mut self, value: impl AsRef<[u8]>) -> bool {
        let value = value.as_ref();
        let num_bits = self.num_bits;
        let mut was_present = true;
        for i in 0..self.num_hashes as usize {
            let bit_index = self.bit_index(value, i);
            if layout::set_bit(self.bytes_mut(), num_bits, bit_index) {
                was_present = false;
            }
        }
        was_present
    }

    /// Zeroes every bit. Size, hash count and seeds are kept.
    pub fn clear(&mut self) {
        let num_bits = self.num_bits;
        layout::clear_words(self.bytes_mut(), num_bits);
    }

    /// Returns the filter's bytes for in-place transfer, e.g. reading a
    /// persisted image directly into them.
    ///
    /// The slice is exactly [`total_size()`](Self::total_size) long. Size and
    /// hash count are fixed at construction; rewriting them here has no effect
    /// on this filter, while rewritten seeds and bits take effect immediately.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.bytes_mut()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let total_size = self.total_size;
        &mut self.buf.as_mut()[..total_size]
    }
}

impl<B: AsRef<[u8]>, C: AsRef<[u8]>> PartialEq<BloomFilter<C>> for BloomFilter<B> {
    fn eq(&self, other: &BloomFilter<C>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<B: AsRef<[u8]>> Eq for BloomFilter<B> {}

impl<B: Clone> Clone for BloomFilter<B> {
    fn clone(&self) -> Self {
        BloomFilter {
            buf: self.buf.clone(),
            num_bits: self.num_bits,
            num_hashes: self.num_hashes,
            total_size: self.total_size,
        }
    }
}

impl<B: AsRef<[u8]>> fmt::Debug for BloomFilter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("total_size", &self.total_size)
            .field("bits_used", &self.bits_used())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::XorShift64;
    use crate::error::ErrorKind;

    fn filter(num_bits: u32, num_hashes: u32) -> OwnedBloomFilter {
        BloomFilter::with_params(num_bits, num_hashes, &mut XorShift64::seeded(1))
    }

    #[test]
    fn test_fresh_buffer_layout() {
        let f = filter(128, 3);
        let bytes = f.as_bytes();
        assert_eq!(bytes.len(), 128 + 2 * 8);
        assert_eq!(layout::read_num_bits(bytes), 128);
        assert_eq!(layout::read_num_hashes(bytes), 3);
        assert!(bytes[layout::WORDS_OFFSET..].iter().all(|&b| b == 0));
        // unused seed slots stay zeroed
        assert!(bytes[layout::SEEDS_OFFSET + 3 * 4..layout::WORDS_OFFSET]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_seeds_come_from_generator() {
        let f = filter(64, 4);
        let mut rng = XorShift64::seeded(1);
        let expected: Vec<u32> = (0..4).map(|_| rng.next_u32()).collect();
        assert_eq!(f.seeds(), expected);
    }

    #[test]
    fn test_add_sets_one_bit_per_distinct_index() {
        let mut f = filter(1 << 16, 5);
        f.add("value");

        let mut indexes: Vec<u64> = (0..5).map(|i| f.bit_index(b"value", i)).collect();
        indexes.sort_unstable();
        indexes.dedup();
        assert_eq!(f.bits_used(), indexes.len() as u64);
        for index in indexes {
            assert!(layout::get_bit(f.as_bytes(), f.size(), index));
        }
    }

    #[test]
    fn test_has_short_circuits_on_missing_bit() {
        let mut f = filter(1 << 16, 4);
        f.add("x");
        let first = f.bit_index(b"x", 0);
        let word = (first / 64) as usize;
        let cleared = layout::read_word(f.as_bytes(), word) & !(1u64 << (first % 64));
        layout::write_word(f.as_bytes_mut(), word, cleared);
        assert!(!f.has("x"));
    }

    #[test]
    fn test_has_and_add() {
        let mut f = filter(1024, 6);
        assert!(!f.has_and_add("a"));
        assert!(f.has_and_add("a"));
        assert!(f.has("a"));
    }

    #[test]
    fn test_clear_keeps_header() {
        let mut f = filter(256, 7);
        let seeds = f.seeds();
        f.add("a");
        f.add("b");
        assert!(!f.is_empty());

        f.clear();
        assert!(f.is_empty());
        assert_eq!(f.fill_rate(), 0.0);
        assert_eq!(f.size(), 256);
        assert_eq!(f.num_hashes(), 7);
        assert_eq!(f.seeds(), seeds);
    }

    #[test]
    fn test_estimated_fpp() {
        let mut f = filter(1 << 12, 4);
        assert_eq!(f.estimated_fpp(), 0.0);
        for i in 0..200 {
            f.add(format!("item{i}"));
        }
        let fpp = f.estimated_fpp();
        assert!(fpp > 0.0 && fpp < 1.0);
    }

    #[test]
    fn test_adopt_longer_buffer_uses_declared_length() {
        let f = filter(64, 2);
        let mut bytes = f.as_bytes().to_vec();
        bytes.extend_from_slice(&[0xFF; 24]);

        let adopted = BloomFilter::adopt(bytes.as_slice()).unwrap();
        assert_eq!(adopted.total_size(), 136);
        assert_eq!(adopted.as_bytes().len(), 136);
        assert!(adopted.is_empty());
        assert_eq!(adopted, f);
    }

    #[test]
    fn test_adopt_rejects_truncated_buffer() {
        let f = filter(1024, 2);
        let err = BloomFilter::adopt(&f.as_bytes()[..200]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }

    #[test]
    fn test_header_rewrite_does_not_change_cached_shape() {
        let mut f = filter(64, 2);
        f.as_bytes_mut()[layout::NUM_HASHES_OFFSET] = 99;
        f.add("still fine");
        assert!(f.has("still fine"));
        assert_eq!(f.num_hashes(), 2);
    }

    #[test]
    fn test_to_owned_filter_and_into_inner() {
        let mut f = filter(192, 3);
        f.add("k");
        let mut bytes = f.as_bytes().to_vec();
        let borrowed = BloomFilter::adopt(bytes.as_mut_slice()).unwrap();
        let owned = borrowed.to_owned_filter();
        assert_eq!(owned, f);
        assert_eq!(owned.clone().into_inner(), f.as_bytes());
    }
}
