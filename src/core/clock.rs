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

//! Clock divider (prescaler)
//!
//! The clock-select field (CS02:0, bits 2-0 of control register B) picks
//! the timer clock:
//!
//! ```text
//! CS | Source
//! ---|----------------------------
//! 0  | No clock (timer stopped)
//! 1  | clk/1
//! 2  | clk/8
//! 3  | clk/64
//! 4  | clk/256
//! 5  | clk/1024
//! 6  | External pin, falling edge
//! 7  | External pin, rising edge
//! ```
//!
//! External sources are accepted but not emulated; they behave as stopped.

use serde::{Deserialize, Serialize};

/// Nanoseconds per second, used for period computation
pub const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;

/// Timer clock source selected by CS02:0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClockSource {
    #[default]
    Stopped,
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
    ExternalFalling,
    ExternalRising,
}

impl ClockSource {
    /// Decode the clock-select bits (only the low 3 bits are used)
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => ClockSource::Stopped,
            1 => ClockSource::Div1,
            2 => ClockSource::Div8,
            3 => ClockSource::Div64,
            4 => ClockSource::Div256,
            5 => ClockSource::Div1024,
            6 => ClockSource::ExternalFalling,
            _ => ClockSource::ExternalRising,
        }
    }

    /// Encode back into the 3-bit clock-select field
    pub fn bits(self) -> u8 {
        match self {
            ClockSource::Stopped => 0,
            ClockSource::Div1 => 1,
            ClockSource::Div8 => 2,
            ClockSource::Div64 => 3,
            ClockSource::Div256 => 4,
            ClockSource::Div1024 => 5,
            ClockSource::ExternalFalling => 6,
            ClockSource::ExternalRising => 7,
        }
    }

    /// Number of base clock ticks per counter increment
    ///
    /// Returns `None` when the source does not count (stopped or external).
    ///
    /// # Example
    ///
    /// ```
    /// use avr_timer8::core::clock::ClockSource;
    ///
    /// assert_eq!(ClockSource::Div64.divider(), Some(64));
    /// assert_eq!(ClockSource::Stopped.divider(), None);
    /// assert_eq!(ClockSource::ExternalRising.divider(), None);
    /// ```
    pub fn divider(self) -> Option<u32> {
        match self {
            ClockSource::Div1 => Some(1),
            ClockSource::Div8 => Some(8),
            ClockSource::Div64 => Some(64),
            ClockSource::Div256 => Some(256),
            ClockSource::Div1024 => Some(1024),
            ClockSource::Stopped | ClockSource::ExternalFalling | ClockSource::ExternalRising => {
                None
            }
        }
    }

    #[inline(always)]
    pub fn is_external(self) -> bool {
        matches!(
            self,
            ClockSource::ExternalFalling | ClockSource::ExternalRising
        )
    }

    /// True if this source advances the counter
    #[inline(always)]
    pub fn is_counting(self) -> bool {
        self.divider().is_some()
    }
}

/// Effective counting frequency and period for a clock source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockRate {
    /// Counter increments per second (0 when stopped)
    pub frequency_hz: u64,

    /// Nanoseconds per counter increment (0 when stopped)
    pub period_ns: u64,
}

impl ClockRate {
    /// Derive the counting rate from the CPU clock and a clock source
    ///
    /// # Arguments
    ///
    /// * `cpu_frequency_hz` - Base clock frequency
    /// * `source` - Selected clock source
    pub fn new(cpu_frequency_hz: u64, source: ClockSource) -> Self {
        let Some(divider) = source.divider() else {
            return Self::default();
        };

        let frequency_hz = cpu_frequency_hz / divider as u64;
        let period_ns = if frequency_hz == 0 {
            0
        } else {
            NANOSECONDS_PER_SECOND / frequency_hz
        };

        Self {
            frequency_hz,
            period_ns,
        }
    }
}
