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

//! Seeded string hashing for the filter's hash functions.
//!
//! Each of the `num_hashes` hash functions is MurmurHash3 (x86, 32-bit) keyed
//! by its own seed. The digest is stable across processes and platforms, which
//! persisted filters rely on.

/// Hashes `value` with the given `seed`.
///
/// # Examples
///
/// ```
/// # use seeded_bloom::hash::hash_bytes;
/// assert_eq!(hash_bytes("", 0), 0);
/// assert_eq!(hash_bytes("alpha", 7), hash_bytes(b"alpha", 7));
/// ```
#[inline]
pub fn hash_bytes(value: impl AsRef<[u8]>, seed: u32) -> u32 {
    mur3::murmurhash3_x86_32(value.as_ref(), seed)
}
