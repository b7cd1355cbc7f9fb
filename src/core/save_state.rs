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

//! Save state serialization for the timer
//!
//! A save state captures the whole register file plus prescaler progress,
//! so a restored timer continues counting exactly where the saved one
//! stopped.
//!
//! # Save State Format
//!
//! Save states are serialized using bincode for efficient binary encoding.
//! The state includes:
//! - Metadata (timestamp, label, tick count)
//! - Timer registers (control, counter, compare)
//! - Prescaler progress toward the next count
//! - Interrupt state (flags, mask)
//!
//! # Version Compatibility
//!
//! Save states include a version number to ensure compatibility.
//! Loading a save state with a different version will fail with an error.
//!
//! # Example
//!
//! ```no_run
//! use avr_timer8::core::interrupt::IrqLevels;
//! use avr_timer8::core::pin::PinId;
//! use avr_timer8::core::save_state::SaveState;
//! use avr_timer8::core::timer::Timer8;
//!
//! let timer = Timer8::new(16_000_000, PinId::new('D', 6), PinId::new('D', 5), Box::new(IrqLevels::new()));
//!
//! // Save to file
//! let state = SaveState::from_timer(&timer, "checkpoint", 0);
//! state.save_to_file("timer.state").unwrap();
//!
//! // Later: load from file and apply
//! let loaded = SaveState::load_from_file("timer.state").unwrap();
//! let mut restored = Timer8::new(16_000_000, PinId::new('D', 6), PinId::new('D', 5), Box::new(IrqLevels::new()));
//! loaded.apply_to(&mut restored);
//! ```

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::error::{Result, TimerError};
use super::timer::Timer8;

/// Save state version for compatibility checking
///
/// This version number should be incremented whenever the save state format changes
/// in a way that breaks backward compatibility.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete timer save state
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Save state metadata
    pub metadata: SaveStateMetadata,

    /// Timer register file
    pub timer: TimerState,
}

/// Save state metadata
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Free-form label
    pub label: String,

    /// Base clock ticks delivered before saving
    pub tick_count: u64,
}

/// Timer register file and prescaler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct TimerState {
    /// Control A
    pub control_a: u8,

    /// Control B
    pub control_b: u8,

    /// Counter value
    pub counter: u8,

    /// Output compare A
    pub compare_a: u8,

    /// Output compare B
    pub compare_b: u8,

    /// Base ticks accumulated toward the next count
    pub prescale_accum: u32,

    /// Interrupt flag register
    pub interrupt_flags: u8,

    /// Interrupt mask register
    pub interrupt_mask: u8,

    /// CPU frequency the state was captured at
    pub cpu_frequency_hz: u64,
}

impl SaveState {
    /// Capture a timer's state
    ///
    /// # Arguments
    ///
    /// * `timer` - Timer to capture
    /// * `label` - Label stored in the metadata
    /// * `tick_count` - Base clock ticks delivered so far
    pub fn from_timer(timer: &Timer8, label: &str, tick_count: u64) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                label: label.to_string(),
                tick_count,
            },
            timer: timer.to_state(),
        }
    }

    /// Restore the captured state into a timer
    pub fn apply_to(&self, timer: &mut Timer8) {
        timer.restore_from_state(&self.timer);
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Decode from bytes, checking the version
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the version differs from
    /// [`SAVE_STATE_VERSION`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _): (SaveState, usize) =
            bincode::decode_from_slice(bytes, config::standard())?;

        if state.version != SAVE_STATE_VERSION {
            return Err(TimerError::IncompatibleSaveState {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }

        Ok(state)
    }

    /// Save state to file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be created
    /// - Serialization fails
    /// - Write operation fails
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened or read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        Self::from_bytes(&buffer)
    }
}

/// Trait for components that can be saved/restored
pub trait StateSave {
    /// The state type for this component
    type State: Serialize + for<'de> Deserialize<'de>;

    /// Convert this component to a saveable state
    fn to_state(&self) -> Self::State;

    /// Restore this component from a saved state
    ///
    /// # Arguments
    ///
    /// * `state` - The state to restore from
    fn restore_from_state(&mut self, state: &Self::State);
}
