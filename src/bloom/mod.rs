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

//! Bloom filter with a self-describing binary layout.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to test whether
//! an element is a member of a set. False positive matches are possible, but false negatives
//! are not. In other words, a query returns either "possibly in set" or "definitely not in set".
//!
//! # Properties
//!
//! - **No false negatives**: If a value was added, `has()` will always return `true`
//! - **Possible false positives**: `has()` may return `true` for values never added
//! - **Fixed size**: the filter never resizes after construction
//! - **Zero-copy persistence**: the in-memory buffer is byte-identical to the persisted form
//!
//! # Usage
//!
//! ```rust
//! use seeded_bloom::bloom::BloomFilterBuilder;
//!
//! // Create a filter optimized for 1000 items with 1% false positive rate
//! let mut filter = BloomFilterBuilder::with_accuracy(1000, 0.01).build().unwrap();
//!
//! filter.add("alpha");
//! filter.add("beta");
//!
//! assert!(filter.has("alpha"));
//! // filter.has("delta") is false unless it collides, with probability about 1%
//!
//! println!("Size: {} bits", filter.size());
//! println!("Fill rate: {:.4}", filter.fill_rate());
//! ```
//!
//! # Creating Filters
//!
//! A filter is either built fresh, owning a newly allocated zeroed buffer, or
//! adopted over an existing buffer whose header is trusted:
//!
//! ```rust
//! # use seeded_bloom::bloom::BloomFilter;
//! # use seeded_bloom::bloom::BloomFilterBuilder;
//! # use seeded_bloom::bloom::OwnedBloomFilter;
//! let mut fresh: OwnedBloomFilter = BloomFilterBuilder::with_accuracy(10_000, 0.01)
//!     .max_hashes(5)
//!     .build()
//!     .unwrap();
//! fresh.add("gamma");
//!
//! // Hand the bytes to storage, then adopt them in place later.
//! let mut stored = fresh.as_bytes().to_vec();
//! let adopted = BloomFilter::adopt(stored.as_mut_slice()).unwrap();
//! assert!(adopted.has("gamma"));
//! assert_eq!(adopted.num_hashes(), 5);
//! ```
//!
//! # Implementation Details
//!
//! - Sizing: `m = ceil(-n ln p / (ln 2)^2)` rounded up to whole 64-bit words, and
//!   `k = round((m / n) ln 2)` clamped to `[1, 30]`
//! - Each of the k hash functions is MurmurHash3 x86_32 with its own seed; seeds live in
//!   the header so persisted filters hash identically in later sessions
//! - Bits packed in little-endian `u64` words, see [`crate::layout`]

mod builder;
mod fpr;
mod sketch;

pub use self::builder::BloomFilterBuilder;
pub use self::builder::MAX_NUM_BITS;
pub use self::builder::MAX_NUM_HASHES;
pub use self::builder::MIN_NUM_BITS;
pub use self::builder::MIN_NUM_HASHES;
pub use self::fpr::FalsePositiveRate;
pub use self::sketch::BloomFilter;
pub use self::sketch::BorrowedBloomFilter;
pub use self::sketch::OwnedBloomFilter;
