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

//! # Seeded Bloom Filter
//!
//! A Bloom filter sized from a target capacity and false positive rate, whose
//! in-memory buffer is exactly its persisted binary form. Hand
//! [`as_bytes()`](bloom::BloomFilter::as_bytes) to any storage or transport and
//! [`adopt()`](bloom::BloomFilter::adopt) the bytes back without copying.
//!
//! The filter performs no I/O and no internal locking.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

#[cfg(target_endian = "big")]
compile_error!("big-endian targets are not supported: the filter layout is little-endian only");

pub mod bloom;
pub mod common;
pub mod error;
pub mod hash;
pub mod layout;
