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

//! Core emulation components
//!
//! This module contains the timer/counter peripheral and its collaborators:
//! - Clock divider (prescaler)
//! - Compare unit
//! - Waveform/PWM generator
//! - Interrupt flag/mask controller
//! - Pin identities and port collaborators
//! - Peripheral capability interface
//! - Timer (counter engine + register file)
//! - Tick source, configuration, and save states

pub mod clock;
pub mod compare;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod peripheral;
pub mod pin;
pub mod save_state;
pub mod timer;
pub mod timing;
pub mod waveform;

// Re-export commonly used types
pub use clock::ClockSource;
pub use config::TimerConfig;
pub use error::{Result, TimerError};
pub use interrupt::{InterruptFlags, InterruptSink, IrqLevels, TimerIrq};
pub use peripheral::{Peripheral, RegisterWindow};
pub use pin::{PinId, PortProvider, SimPort};
pub use timer::{SharedTimer, Timer8};
pub use timing::VirtualClock;
pub use waveform::{Channel, CompareOutputMode, WaveformMode};
