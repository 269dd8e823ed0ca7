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

use super::BloomFilter;
use super::FalsePositiveRate;
use super::OwnedBloomFilter;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;
use crate::layout::MAX_SEEDS;

/// Smallest filter size, one 64-bit word.
pub const MIN_NUM_BITS: u64 = 64;
/// Largest multiple of 64 that fits the 32-bit `size` header field.
pub const MAX_NUM_BITS: u64 = u32::MAX as u64 & !63;
/// Fewest hash functions a filter uses.
pub const MIN_NUM_HASHES: u32 = 1;
/// Most hash functions a filter uses, bounded by the seed array in the header.
pub const MAX_NUM_HASHES: u32 = MAX_SEEDS as u32;

#[derive(Debug, Clone, Copy)]
enum Sizing {
    Accuracy { max_items: u64, fpp: f64 },
    Size { num_bits: u64, num_hashes: u32 },
}

/// Builder for creating [`OwnedBloomFilter`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): Specify target items and false positive rate
///   (recommended)
/// - [`with_size()`](Self::with_size): Specify requested bit count and hash functions (manual)
///
/// Filters adopted from an existing buffer do not go through the builder, see
/// [`BloomFilter::adopt()`].
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder {
    sizing: Sizing,
    max_hashes: Option<u32>,
    seed: Option<u64>,
}

impl BloomFilterBuilder {
    /// Creates a builder with optimal parameters for a target accuracy.
    ///
    /// The number of bits and hash functions are calculated at
    /// [`build()`](Self::build) time from:
    ///
    /// - `max_items`: Maximum expected number of distinct items
    /// - `fpp`: Target false positive probability (e.g., 0.01 for 1%)
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// // Optimal for 10,000 items with 1% FPP
    /// let filter = BloomFilterBuilder::with_accuracy(10_000, 0.01)
    ///     .seed(42)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(filter.size(), 95_872);
    /// assert_eq!(filter.num_hashes(), 7);
    /// ```
    pub fn with_accuracy(max_items: u64, fpp: f64) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Accuracy { max_items, fpp },
            max_hashes: None,
            seed: None,
        }
    }

    /// Creates a builder with manual size specification.
    ///
    /// `num_bits` is rounded up to a multiple of 64 and `num_hashes` is
    /// clamped to `[1, 30]`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// let filter = BloomFilterBuilder::with_size(1000, 5).build().unwrap();
    /// assert_eq!(filter.size(), 1024);
    /// assert_eq!(filter.num_hashes(), 5);
    /// ```
    pub fn with_size(num_bits: u64, num_hashes: u32) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Size {
                num_bits,
                num_hashes,
            },
            max_hashes: None,
            seed: None,
        }
    }

    /// Caps the number of hash functions chosen by [`with_accuracy()`](Self::with_accuracy).
    ///
    /// `0` means no explicit cap. A cap above 30 is clamped to 30, the capacity
    /// of the seed array.
    pub fn max_hashes(mut self, max_hashes: u32) -> Self {
        self.max_hashes = if max_hashes == 0 {
            None
        } else {
            Some(max_hashes)
        };
        self
    }

    /// Makes seed generation deterministic.
    ///
    /// By default hash seeds are drawn from a time-seeded generator, so two
    /// filters built with the same parameters hash differently.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the Bloom filter, drawing hash seeds from the configured generator.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if:
    /// - `fpp` is not in (0, 1)
    /// - `max_items` or `num_bits` is 0
    /// - the required number of bits does not fit the 32-bit `size` field
    pub fn build(self) -> Result<OwnedBloomFilter, Error> {
        let mut rng = match self.seed {
            Some(seed) => XorShift64::seeded(seed),
            None => XorShift64::default(),
        };
        self.build_with(&mut rng)
    }

    /// Builds the Bloom filter, drawing hash seeds from `rng`.
    ///
    /// Any [`seed()`](Self::seed) set on the builder is ignored.
    pub fn build_with<R: RandomSource>(self, rng: &mut R) -> Result<OwnedBloomFilter, Error> {
        let (num_bits, num_hashes) = self.resolve()?;
        Ok(BloomFilter::with_params(num_bits, num_hashes, rng))
    }

    fn resolve(&self) -> Result<(u32, u32), Error> {
        let (num_bits, num_hashes) = match self.sizing {
            Sizing::Accuracy { max_items, fpp } => {
                let fpr = FalsePositiveRate::new(fpp)?;
                if max_items == 0 {
                    return Err(Error::invalid_argument("max_items must be greater than 0"));
                }
                let num_bits = Self::suggest_num_bits(max_items, fpr.value());
                let num_hashes = Self::suggest_num_hashes(max_items, num_bits, self.max_hashes);
                (num_bits, num_hashes)
            }
            Sizing::Size {
                num_bits,
                num_hashes,
            } => {
                if num_bits == 0 {
                    return Err(Error::invalid_argument("num_bits must be greater than 0"));
                }
                let num_bits = num_bits.min(u64::MAX - 63).div_ceil(64) * 64;
                (num_bits, num_hashes.clamp(MIN_NUM_HASHES, MAX_NUM_HASHES))
            }
        };

        if num_bits > MAX_NUM_BITS {
            return Err(Error::invalid_argument(format!(
                "filter would need {num_bits} bits, more than the maximum of {MAX_NUM_BITS}"
            ))
            .with_context("num_bits", num_bits));
        }

        Ok((num_bits as u32, num_hashes))
    }

    // ========================================================================
    // Static Suggestion Methods
    // ========================================================================

    /// Suggests optimal number of bits given max items and target FPP.
    ///
    /// Formula: `m = ceil(-n * ln(p) / (ln(2)^2))`
    /// where n = max_items, p = fpp, rounded up to a multiple of 64 and never
    /// below 64.
    ///
    /// The result is not bounded by [`MAX_NUM_BITS`]; [`build()`](Self::build)
    /// rejects sizes that do not fit.
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// let bits = BloomFilterBuilder::suggest_num_bits(1000, 0.01);
    /// assert_eq!(bits, 9600); // ~9585 bits rounded up
    /// ```
    pub fn suggest_num_bits(max_items: u64, fpp: f64) -> u64 {
        let n = max_items as f64;
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;

        // Float to int casts saturate, NaN becomes 0.
        let bits = (-n * fpp.ln() / ln2_squared).ceil() as u64;

        let bits = bits.min(u64::MAX - 63).div_ceil(64) * 64;
        bits.max(MIN_NUM_BITS)
    }

    /// Suggests optimal number of hash functions given max items and bit count.
    ///
    /// Formula: `k = round((m/n) * ln(2))`
    /// where m = num_bits, n = max_items, clamped to `[1, ceiling]`. The
    /// ceiling is `max_hashes` when given and non-zero, and never more than 30.
    ///
    /// # Examples
    ///
    /// ```
    /// # use seeded_bloom::bloom::BloomFilterBuilder;
    /// assert_eq!(BloomFilterBuilder::suggest_num_hashes(1000, 10000, None), 7); // k ≈ 6.93
    /// assert_eq!(BloomFilterBuilder::suggest_num_hashes(1000, 10000, Some(4)), 4);
    /// assert_eq!(BloomFilterBuilder::suggest_num_hashes(1, 1 << 20, None), 30);
    /// ```
    pub fn suggest_num_hashes(max_items: u64, num_bits: u64, max_hashes: Option<u32>) -> u32 {
        let ceiling = match max_hashes {
            None | Some(0) => MAX_NUM_HASHES,
            Some(max) => max.min(MAX_NUM_HASHES),
        };

        let m = num_bits as f64;
        let n = max_items as f64;
        let k = (m / n * std::f64::consts::LN_2).round();

        if k.is_nan() {
            return MIN_NUM_HASHES;
        }
        k.clamp(f64::from(MIN_NUM_HASHES), f64::from(ceiling)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_num_bits_multiple_of_64_and_floored() {
        for max_items in [1, 2, 3, 10, 100, 1000, 12_345, 1_000_000] {
            for fpp in [1e-9, 1e-4, 0.01, 0.1, 0.5, 0.9, 0.999] {
                let bits = BloomFilterBuilder::suggest_num_bits(max_items, fpp);
                assert_eq!(bits % 64, 0, "max_items={max_items}, fpp={fpp}");
                assert!(bits >= 64, "max_items={max_items}, fpp={fpp}");
            }
        }
    }

    #[test]
    fn test_num_bits_tiny_input() {
        assert_eq!(BloomFilterBuilder::suggest_num_bits(1, 0.5), 64);
    }

    #[test]
    fn test_num_bits_huge_input_saturates() {
        let bits = BloomFilterBuilder::suggest_num_bits(u64::MAX, 1e-12);
        assert_eq!(bits % 64, 0);
        assert!(bits > MAX_NUM_BITS);
    }

    #[test]
    fn test_num_hashes_bounds() {
        for max_items in [1, 5, 1000, 1 << 30] {
            for num_bits in [64, 1024, 1 << 20, MAX_NUM_BITS] {
                let k = BloomFilterBuilder::suggest_num_hashes(max_items, num_bits, None);
                assert!((MIN_NUM_HASHES..=MAX_NUM_HASHES).contains(&k));
            }
        }
        assert_eq!(BloomFilterBuilder::suggest_num_hashes(0, 64, None), MAX_NUM_HASHES);
    }

    #[test]
    fn test_num_hashes_explicit_ceiling() {
        let unbounded = BloomFilterBuilder::suggest_num_hashes(10, 64 * 100, None);
        assert_eq!(unbounded, 30);
        for max in 1..=30 {
            let k = BloomFilterBuilder::suggest_num_hashes(10, 64 * 100, Some(max));
            assert_eq!(k, max);
        }
    }

    #[test]
    fn test_num_hashes_ceiling_above_30_is_clamped() {
        assert_eq!(BloomFilterBuilder::suggest_num_hashes(1, 1 << 20, Some(31)), 30);
        assert_eq!(BloomFilterBuilder::suggest_num_hashes(1, 1 << 20, Some(1000)), 30);
        // zero means no explicit ceiling
        assert_eq!(BloomFilterBuilder::suggest_num_hashes(1, 1 << 20, Some(0)), 30);
        assert_eq!(BloomFilterBuilder::suggest_num_hashes(1000, 10000, Some(0)), 7);
    }

    #[test]
    fn test_resolve_accuracy() {
        let (bits, hashes) = BloomFilterBuilder::with_accuracy(1000, 0.01)
            .resolve()
            .unwrap();
        assert_eq!(bits, 9600);
        assert_eq!(hashes, 7);

        let (_, hashes) = BloomFilterBuilder::with_accuracy(1000, 0.01)
            .max_hashes(3)
            .resolve()
            .unwrap();
        assert_eq!(hashes, 3);

        let (_, hashes) = BloomFilterBuilder::with_accuracy(1000, 0.01)
            .max_hashes(0)
            .resolve()
            .unwrap();
        assert_eq!(hashes, 7);
    }

    #[test]
    fn test_resolve_rejects_invalid_arguments() {
        for builder in [
            BloomFilterBuilder::with_accuracy(100, 0.0),
            BloomFilterBuilder::with_accuracy(100, 1.0),
            BloomFilterBuilder::with_accuracy(0, 0.01),
            BloomFilterBuilder::with_accuracy(u64::MAX, 0.01),
            BloomFilterBuilder::with_size(0, 3),
            BloomFilterBuilder::with_size(MAX_NUM_BITS + 1, 3),
        ] {
            let err = builder.resolve().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_resolve_size() {
        assert_eq!(BloomFilterBuilder::with_size(1, 0).resolve().unwrap(), (64, 1));
        assert_eq!(BloomFilterBuilder::with_size(64, 31).resolve().unwrap(), (64, 30));
        assert_eq!(
            BloomFilterBuilder::with_size(MAX_NUM_BITS, 2).resolve().unwrap(),
            (MAX_NUM_BITS as u32, 2)
        );
    }
}
