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

use crate::error::Error;

/// A target false positive probability, strictly between 0 and 1.
///
/// # Examples
///
/// ```
/// # use seeded_bloom::bloom::FalsePositiveRate;
/// let fpr = FalsePositiveRate::new(0.01).unwrap();
/// assert_eq!(fpr.value(), 0.01);
///
/// assert!(FalsePositiveRate::new(0.0).is_err());
/// assert!(FalsePositiveRate::new(1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FalsePositiveRate(f64);

impl FalsePositiveRate {
    /// Validates `value` as a false positive rate.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument)
    /// if `value` is not in the open interval (0, 1). NaN is rejected as well.
    pub fn new(value: f64) -> Result<Self, Error> {
        if value > 0.0 && value < 1.0 {
            Ok(FalsePositiveRate(value))
        } else {
            Err(
                Error::invalid_argument("false positive rate must be between 0 and 1 (exclusive)")
                    .with_context("fpr", value),
            )
        }
    }

    /// Returns the rate.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FalsePositiveRate {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        FalsePositiveRate::new(value)
    }
}

impl fmt::Display for FalsePositiveRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
