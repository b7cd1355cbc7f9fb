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

//! Timer Interrupt Flag/Mask Controller
//!
//! The timer owns two 1-byte interrupt registers, each mapped in its own
//! window at address 0:
//!
//! - **TIFR**: Interrupt flag register (R/W)
//!   - Flags are set by the counter engine
//!   - Writing replaces the whole register (no write-1-to-clear)
//!
//! - **TIMSK**: Interrupt mask register (R/W)
//!   - 1 = interrupt line enabled, 0 = flag recorded but line stays low
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit | Source     | Description
//! ----|------------|---------------------------------
//! 0   | TOV        | Counter overflow (0xFF -> 0x00)
//! 1   | OCFA       | Output compare A match
//! 2   | OCFB       | Output compare B match
//! 3-7 | -          | Not used
//! ```
//!
//! Lines are only ever asserted here. Deasserting is up to whoever owns
//! interrupt delivery, except on peripheral reset which lowers all three.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

#[cfg(test)]
mod tests;

bitflags! {
    /// Interrupt flag / mask bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterruptFlags: u8 {
        /// Counter overflow (bit 0)
        const OVERFLOW = 1 << 0;

        /// Output compare A match (bit 1)
        const COMPARE_A = 1 << 1;

        /// Output compare B match (bit 2)
        const COMPARE_B = 1 << 2;
    }
}

/// The three interrupt lines of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerIrq {
    Overflow,
    CompareA,
    CompareB,
}

impl TimerIrq {
    pub const ALL: [TimerIrq; 3] = [TimerIrq::Overflow, TimerIrq::CompareA, TimerIrq::CompareB];

    /// Flag/mask bit belonging to this line
    #[inline(always)]
    pub fn flag(self) -> InterruptFlags {
        match self {
            TimerIrq::Overflow => InterruptFlags::OVERFLOW,
            TimerIrq::CompareA => InterruptFlags::COMPARE_A,
            TimerIrq::CompareB => InterruptFlags::COMPARE_B,
        }
    }

    #[inline(always)]
    fn index(self) -> usize {
        match self {
            TimerIrq::Overflow => 0,
            TimerIrq::CompareA => 1,
            TimerIrq::CompareB => 2,
        }
    }
}

/// Interrupt-line delivery collaborator
///
/// Receives level changes for the timer's three interrupt lines.
pub trait InterruptSink: Send {
    /// Drive `line` to `level` (true = 1, false = 0)
    fn set_level(&mut self, line: TimerIrq, level: bool);
}

#[derive(Debug, Default)]
struct IrqLevelsInner {
    levels: [AtomicBool; 3],
    assertions: [AtomicU32; 3],
}

/// Latching interrupt sink
///
/// Records the current level of each line and how many times each line
/// was driven high. Clones share the same latches, so one clone can be
/// handed to the timer while the host keeps another for polling.
///
/// # Example
///
/// ```
/// use avr_timer8::core::interrupt::{InterruptSink, IrqLevels, TimerIrq};
///
/// let levels = IrqLevels::new();
/// let mut sink = levels.clone();
///
/// sink.set_level(TimerIrq::CompareA, true);
/// assert!(levels.level(TimerIrq::CompareA));
/// assert_eq!(levels.assertions(TimerIrq::CompareA), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IrqLevels {
    inner: Arc<IrqLevelsInner>,
}

impl IrqLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a line
    pub fn level(&self, line: TimerIrq) -> bool {
        self.inner.levels[line.index()].load(Ordering::SeqCst)
    }

    /// Number of times a line was driven high
    pub fn assertions(&self, line: TimerIrq) -> u32 {
        self.inner.assertions[line.index()].load(Ordering::SeqCst)
    }

    /// Lower a line from the host side (interrupt acknowledged)
    pub fn lower(&self, line: TimerIrq) {
        self.inner.levels[line.index()].store(false, Ordering::SeqCst);
    }
}

impl InterruptSink for IrqLevels {
    fn set_level(&mut self, line: TimerIrq, level: bool) {
        self.inner.levels[line.index()].store(level, Ordering::SeqCst);
        if level {
            self.inner.assertions[line.index()].fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Timer interrupt controller
///
/// Holds the flag and mask registers and drives the interrupt lines.
pub struct InterruptController {
    /// TIFR - Interrupt flag register (low 3 bits meaningful)
    flags: InterruptFlags,

    /// TIMSK - Interrupt mask register (low 3 bits meaningful)
    mask: InterruptFlags,

    /// Interrupt line collaborator
    sink: Box<dyn InterruptSink>,
}

impl InterruptController {
    /// Create a new controller with all flags cleared and all lines masked
    ///
    /// # Arguments
    ///
    /// * `sink` - Receiver of interrupt line levels
    pub fn new(sink: Box<dyn InterruptSink>) -> Self {
        Self {
            flags: InterruptFlags::empty(),
            mask: InterruptFlags::empty(),
            sink,
        }
    }

    /// Record an interrupt condition
    ///
    /// Sets the flag bit unconditionally. The line is asserted only if the
    /// matching mask bit is set.
    ///
    /// # Returns
    ///
    /// `true` if the line was asserted
    pub fn raise(&mut self, line: TimerIrq) -> bool {
        self.flags |= line.flag();

        let enabled = self.is_enabled(line);
        if enabled {
            self.sink.set_level(line, true);
        }

        log::trace!(
            "Timer IRQ {:?} flagged (enabled={}), flags=0x{:02X}",
            line,
            enabled,
            self.flags.bits()
        );

        enabled
    }

    /// Check whether a line is enabled in the mask register
    #[inline(always)]
    pub fn is_enabled(&self, line: TimerIrq) -> bool {
        self.mask.contains(line.flag())
    }

    /// Read TIFR
    #[inline(always)]
    pub fn read_flags(&self) -> u8 {
        self.flags.bits()
    }

    /// Write TIFR
    ///
    /// Replaces the flag register. Lines are left untouched.
    pub fn write_flags(&mut self, value: u8) {
        self.flags = InterruptFlags::from_bits_truncate(value);
        log::trace!("Timer flags set: 0x{:02X}", self.flags.bits());
    }

    /// Read TIMSK
    #[inline(always)]
    pub fn read_mask(&self) -> u8 {
        self.mask.bits()
    }

    /// Write TIMSK
    pub fn write_mask(&mut self, value: u8) {
        self.mask = InterruptFlags::from_bits_truncate(value);
        log::debug!("Timer IRQ mask set: 0x{:02X}", self.mask.bits());
    }

    /// Clear both registers and lower every line
    pub fn reset(&mut self) {
        self.flags = InterruptFlags::empty();
        self.mask = InterruptFlags::empty();
        for line in TimerIrq::ALL {
            self.sink.set_level(line, false);
        }
    }
}
