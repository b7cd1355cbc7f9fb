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

//! Pins and I/O port collaborators
//!
//! The timer never owns a port. It knows the identities of its two output
//! pins (OCA/OCB) and reads the data-direction state of the owning port to
//! decide whether the waveform reaches the pin. Whenever the waveform
//! configuration changes it sends a "voltage changed" notification so the
//! port can re-sample the effective level.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Number of pins per port
pub const PINS_PER_PORT: u8 = 8;

/// Identity of one I/O pin (port letter + pin number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinId {
    /// Port letter (`'B'`, `'D'`, ...)
    pub port: char,

    /// Pin number within the port (0-7)
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: char, pin: u8) -> Self {
        Self { port, pin }
    }

    /// Bit of this pin in the port's registers
    #[inline(always)]
    pub fn bit(self) -> u8 {
        1 << (self.pin & 0x07)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port, self.pin)
    }
}

/// Port/pin provider collaborator
///
/// Implementations use interior mutability; the timer only holds weak
/// references and only ever calls these methods.
pub trait PortProvider: Send + Sync {
    /// Port letter this provider owns
    fn port_id(&self) -> char;

    /// True if the data-direction register marks `pin` as an output
    fn is_output(&self, pin: u8) -> bool;

    /// The effective output of `pin` may have changed
    fn notify_voltage_changed(&self, pin: u8);
}

/// Simple simulated I/O port
///
/// Stores a data-direction register and counts the voltage-change
/// notifications it receives per pin.
///
/// # Example
///
/// ```
/// use avr_timer8::core::pin::{PortProvider, SimPort};
///
/// let port = SimPort::new('D');
/// port.set_direction(0x40);
/// assert!(port.is_output(6));
/// assert!(!port.is_output(5));
/// ```
#[derive(Debug)]
pub struct SimPort {
    id: char,
    direction: AtomicU8,
    notifications: [AtomicU32; PINS_PER_PORT as usize],
}

impl SimPort {
    /// Create a port with every pin configured as input
    pub fn new(id: char) -> Self {
        Self {
            id,
            direction: AtomicU8::new(0),
            notifications: Default::default(),
        }
    }

    /// Write the data-direction register (1 = output)
    pub fn set_direction(&self, value: u8) {
        self.direction.store(value, Ordering::SeqCst);
    }

    /// Read the data-direction register
    pub fn direction(&self) -> u8 {
        self.direction.load(Ordering::SeqCst)
    }

    /// Number of voltage-change notifications received for `pin`
    pub fn notifications(&self, pin: u8) -> u32 {
        self.notifications
            .get(pin as usize)
            .map(|count| count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl PortProvider for SimPort {
    fn port_id(&self) -> char {
        self.id
    }

    fn is_output(&self, pin: u8) -> bool {
        pin < PINS_PER_PORT && self.direction() & PinId::new(self.id, pin).bit() != 0
    }

    fn notify_voltage_changed(&self, pin: u8) {
        if let Some(count) = self.notifications.get(pin as usize) {
            count.fetch_add(1, Ordering::SeqCst);
        }
        log::trace!("Port {} pin {} voltage changed", self.id, pin);
    }
}
