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

//! Base clock delivery
//!
//! The timer consumes one call per base clock edge. [`VirtualClock`] turns
//! elapsed virtual time into a number of edges and delivers them, keeping
//! the sub-edge remainder so repeated short advances never drift.
//!
//! # Example
//!
//! ```
//! use avr_timer8::core::timing::{Tickable, VirtualClock};
//!
//! struct Counter(u64);
//!
//! impl Tickable for Counter {
//!     fn on_tick(&mut self) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let mut clock = VirtualClock::new(1_000_000); // 1 MHz
//! let mut counter = Counter(0);
//!
//! // 2.5 us, then another 2.5 us
//! clock.run(2_500, &mut counter);
//! clock.run(2_500, &mut counter);
//! assert_eq!(counter.0, 5);
//! ```

use super::clock::NANOSECONDS_PER_SECOND;

/// Global tick counter type (base clock edges since creation)
pub type GlobalTicks = u64;

/// Receiver of base clock edges
pub trait Tickable {
    /// One base clock edge
    fn on_tick(&mut self);
}

/// Virtual base clock
#[derive(Debug, Clone)]
pub struct VirtualClock {
    frequency_hz: u64,

    /// Virtual time elapsed
    now_ns: u64,

    /// Fractional edge carried between advances, in Hz*ns units
    carry: u128,

    /// Edges delivered so far
    total_ticks: GlobalTicks,
}

impl VirtualClock {
    /// Create a clock at time zero
    ///
    /// A frequency of 0 produces no edges.
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            frequency_hz,
            now_ns: 0,
            carry: 0,
            total_ticks: 0,
        }
    }

    #[inline(always)]
    pub fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    /// Virtual time elapsed in nanoseconds
    #[inline(always)]
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Edges produced since creation
    #[inline(always)]
    pub fn total_ticks(&self) -> GlobalTicks {
        self.total_ticks
    }

    /// Advance virtual time without delivering edges
    ///
    /// # Returns
    ///
    /// Number of edges that elapsed
    pub fn advance_ns(&mut self, ns: u64) -> u64 {
        self.now_ns = self.now_ns.saturating_add(ns);

        let scaled = self.carry + ns as u128 * self.frequency_hz as u128;
        let per_second = NANOSECONDS_PER_SECOND as u128;
        self.carry = scaled % per_second;

        let ticks = (scaled / per_second).min(u64::MAX as u128) as u64;
        self.total_ticks = self.total_ticks.saturating_add(ticks);
        ticks
    }

    /// Advance virtual time, delivering each elapsed edge to `target`
    ///
    /// # Returns
    ///
    /// Number of edges delivered
    pub fn run<T: Tickable + ?Sized>(&mut self, ns: u64, target: &mut T) -> u64 {
        let ticks = self.advance_ns(ns);
        for _ in 0..ticks {
            target.on_tick();
        }
        log::trace!("VirtualClock: {} ticks over {} ns", ticks, ns);
        ticks
    }

    /// Duration of `ticks` edges in nanoseconds (rounded down)
    pub fn ticks_to_ns(&self, ticks: u64) -> u64 {
        if self.frequency_hz == 0 {
            return 0;
        }
        let ns = ticks as u128 * NANOSECONDS_PER_SECOND as u128 / self.frequency_hz as u128;
        ns.min(u64::MAX as u128) as u64
    }
}
