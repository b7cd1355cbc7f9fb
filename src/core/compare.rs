// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Output compare unit
//!
//! Compares the counter against OCRA and OCRB. Both channels are evaluated
//! independently; when both match on the same count, both are reported.

/// Result of comparing the counter against both compare registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMatch {
    None,
    A,
    B,
    Both,
}

impl CompareMatch {
    /// True if channel A matched
    #[inline(always)]
    pub fn a(self) -> bool {
        matches!(self, CompareMatch::A | CompareMatch::Both)
    }

    /// True if channel B matched
    #[inline(always)]
    pub fn b(self) -> bool {
        matches!(self, CompareMatch::B | CompareMatch::Both)
    }
}

/// Compare the counter against both compare registers
///
/// # Example
///
/// ```
/// use avr_timer8::core::compare::{matches, CompareMatch};
///
/// assert_eq!(matches(10, 10, 20), CompareMatch::A);
/// assert_eq!(matches(20, 10, 20), CompareMatch::B);
/// assert_eq!(matches(7, 7, 7), CompareMatch::Both);
/// assert_eq!(matches(0, 10, 20), CompareMatch::None);
/// ```
#[inline]
pub fn matches(counter: u8, compare_a: u8, compare_b: u8) -> CompareMatch {
    match (counter == compare_a, counter == compare_b) {
        (true, true) => CompareMatch::Both,
        (true, false) => CompareMatch::A,
        (false, true) => CompareMatch::B,
        (false, false) => CompareMatch::None,
    }
}
