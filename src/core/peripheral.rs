// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Peripheral Capability Trait
//!
//! This module defines the interface a bus-dispatch layer uses to talk to an
//! AVR peripheral. The bus decodes addresses into a register window plus an
//! offset and forwards byte accesses; pin consumers ask whether a pin is
//! driven by the peripheral and fetch its serialized output.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Bus dispatch                   │
//! │  (address -> window + offset, 1-byte only)  │
//! └──────┬───────────────┬───────────────┬──────┘
//!        │ Control       │ Flags         │ Mask
//!        ▼               ▼               ▼
//! ┌─────────────────────────────────────────────┐
//! │          dyn Peripheral (Timer8)            │
//! └──────┬──────────────────────────────────────┘
//!        │ is_active / serialize_output
//!        ▼
//! ┌─────────────────────────────────────────────┐
//! │       Pin consumers (port, wire format)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use avr_timer8::core::error::Result;
//! use avr_timer8::core::peripheral::{check_access_size, Peripheral, RegisterWindow};
//! use avr_timer8::core::pin::PinId;
//!
//! struct Latch {
//!     value: u8,
//! }
//!
//! impl Peripheral for Latch {
//!     fn read(&self, _window: RegisterWindow, offset: u32, size: u32) -> Result<u64> {
//!         check_access_size(size)?;
//!         Ok(if offset == 0 { self.value as u64 } else { 0 })
//!     }
//!
//!     fn write(&mut self, _window: RegisterWindow, offset: u32, value: u64, size: u32) -> Result<()> {
//!         check_access_size(size)?;
//!         if offset == 0 {
//!             self.value = value as u8;
//!         }
//!         Ok(())
//!     }
//!
//!     fn reset(&mut self) {
//!         self.value = 0;
//!     }
//!
//!     fn is_active(&self, _pin: PinId) -> bool {
//!         false
//!     }
//!
//!     fn serialize_output(&self, _pin: PinId, _out: &mut Vec<u8>) -> usize {
//!         0
//!     }
//! }
//! ```

use std::fmt;

use crate::core::error::{Result, TimerError};
use crate::core::pin::PinId;

/// Register window of a peripheral
///
/// The main control block and the two interrupt registers are mapped
/// separately, so each access names the window it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterWindow {
    /// Main register block (control, counter, compare)
    Control,

    /// Interrupt flag register (offset 0 only)
    InterruptFlags,

    /// Interrupt mask register (offset 0 only)
    InterruptMask,
}

impl RegisterWindow {
    /// Name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            RegisterWindow::Control => "control",
            RegisterWindow::InterruptFlags => "interrupt flag",
            RegisterWindow::InterruptMask => "interrupt mask",
        }
    }
}

impl fmt::Display for RegisterWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject any access that is not exactly one byte wide
///
/// # Errors
///
/// Returns [`TimerError::InvalidAccessSize`] for every size other than 1.
pub fn check_access_size(size: u32) -> Result<()> {
    if size == 1 {
        Ok(())
    } else {
        log::error!("Rejected {}-byte peripheral access", size);
        Err(TimerError::InvalidAccessSize { size })
    }
}

/// Capability interface of a memory-mapped AVR peripheral
///
/// # Register Access
///
/// Registers are one byte wide. `size` is the width of the bus access and
/// must be 1; other sizes are rejected without touching any state. Offsets
/// that name no register read as 0 and ignore writes, with a diagnostic.
///
/// # Output Pins
///
/// `is_active` tells the port layer whether the peripheral currently owns a
/// pin's level. `serialize_output` appends the pin's output message to a
/// buffer and returns the number of bytes written (0 for an unknown pin).
pub trait Peripheral {
    /// Read a register
    ///
    /// # Arguments
    ///
    /// * `window` - Register window being accessed
    /// * `offset` - Offset within the window
    /// * `size` - Access width in bytes (must be 1)
    ///
    /// # Errors
    ///
    /// Returns an error only for an invalid access size.
    fn read(&self, window: RegisterWindow, offset: u32, size: u32) -> Result<u64>;

    /// Write a register
    ///
    /// All side effects (mode recompute, pin notification, interrupt lines)
    /// are applied before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error only for an invalid access size.
    fn write(&mut self, window: RegisterWindow, offset: u32, value: u64, size: u32) -> Result<()>;

    /// Return to power-on state; safe to call at any time
    fn reset(&mut self);

    /// True if `pin` is currently driven by this peripheral
    fn is_active(&self, pin: PinId) -> bool;

    /// Append the serialized output of `pin` to `out`
    ///
    /// # Returns
    ///
    /// Number of bytes appended
    fn serialize_output(&self, pin: PinId, out: &mut Vec<u8>) -> usize;

    /// Optional: Peripheral name for debugging
    fn name(&self) -> &str {
        "Unknown Peripheral"
    }
}
