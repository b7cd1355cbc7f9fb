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

//! Waveform generation and PWM duty cycles
//!
//! ## Control Register Layout
//!
//! ```text
//! Control A:  7-6: COMA (channel A compare output mode)
//!             5-4: COMB (channel B compare output mode)
//!             3-2: unused
//!             1-0: WGM01:00
//!
//! Control B:  7-4: unused
//!             3:   WGM02
//!             2-0: CS02:00 (clock source)
//! ```
//!
//! ## Waveform Generation Modes
//!
//! ```text
//! WGM | Mode                        | TOP
//! ----|-----------------------------|------
//! 0   | Normal                      | 0xFF
//! 1   | Phase-correct PWM           | 0xFF
//! 2   | CTC                         | OCRA
//! 3   | Fast PWM                    | 0xFF
//! 4   | (reserved, runs as Normal)  | 0xFF
//! 5   | Phase-correct PWM           | OCRA
//! 6   | (reserved, runs as Normal)  | 0xFF
//! 7   | Fast PWM                    | OCRA
//! ```
//!
//! Phase-correct modes count up only; their output is expressed through
//! the duty-cycle formula, not a bidirectional counter.

use serde::{Deserialize, Serialize};

use super::clock::ClockSource;

/// Waveform generation mode (WGM02:00)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WaveformMode {
    #[default]
    Normal,
    Ctc,
    FastPwm,
    FastPwmVariableTop,
    PhaseCorrectPwm,
    PhaseCorrectPwmVariableTop,
}

impl WaveformMode {
    /// Decode WGM bits from both control registers
    ///
    /// Reserved codes decode to `Normal`; see [`WaveformMode::is_reserved_code`].
    pub fn from_control(control_a: u8, control_b: u8) -> Self {
        match Self::wgm_bits(control_a, control_b) {
            1 => WaveformMode::PhaseCorrectPwm,
            2 => WaveformMode::Ctc,
            3 => WaveformMode::FastPwm,
            5 => WaveformMode::PhaseCorrectPwmVariableTop,
            7 => WaveformMode::FastPwmVariableTop,
            _ => WaveformMode::Normal,
        }
    }

    /// Raw 3-bit WGM02:00 value
    #[inline(always)]
    pub fn wgm_bits(control_a: u8, control_b: u8) -> u8 {
        ((control_b >> 1) & 0x04) | (control_a & 0x03)
    }

    /// True for the two reserved WGM codes (4 and 6)
    #[inline(always)]
    pub fn is_reserved_code(wgm: u8) -> bool {
        matches!(wgm & 0x07, 4 | 6)
    }

    /// True if OCRA defines TOP (CTC and the variable-top PWM modes)
    #[inline(always)]
    pub fn top_is_compare_a(self) -> bool {
        matches!(
            self,
            WaveformMode::Ctc
                | WaveformMode::FastPwmVariableTop
                | WaveformMode::PhaseCorrectPwmVariableTop
        )
    }

    /// True for the fast and phase-correct PWM families
    #[inline(always)]
    pub fn is_pwm(self) -> bool {
        !matches!(self, WaveformMode::Normal | WaveformMode::Ctc)
    }

    /// Counter value at which a cycle completes
    #[inline(always)]
    pub fn top(self, compare_a: u8) -> u8 {
        if self.top_is_compare_a() {
            compare_a
        } else {
            0xFF
        }
    }
}

/// Output compare channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Index for per-channel arrays and wire headers (A=0, B=1)
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

/// Compare output mode (sub-mode) of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareOutputMode {
    /// Output disconnected, pin is ordinary I/O
    #[default]
    Disabled,
    /// Toggle on match; fixed 50% duty, channel A with OCRA as TOP only
    Toggle,
    /// duty = (top - match) / (top + 1)
    Inverted,
    /// duty = (match + 1) / (top + 1)
    NonInverted,
}

impl CompareOutputMode {
    /// Decode a 2-bit COM field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => CompareOutputMode::Disabled,
            1 => CompareOutputMode::Toggle,
            2 => CompareOutputMode::Inverted,
            _ => CompareOutputMode::NonInverted,
        }
    }

    /// Extract the sub-mode for a channel from control register A
    pub fn from_control(control_a: u8, channel: Channel) -> Self {
        match channel {
            Channel::A => Self::from_bits(control_a >> 6),
            Channel::B => Self::from_bits(control_a >> 4),
        }
    }

    /// Whether this sub-mode drives a waveform for the given channel and mode
    ///
    /// Disabled never drives. Toggle is only defined for channel A when
    /// OCRA is TOP.
    pub fn is_valid_for(self, channel: Channel, mode: WaveformMode) -> bool {
        match self {
            CompareOutputMode::Disabled => false,
            CompareOutputMode::Toggle => channel == Channel::A && mode.top_is_compare_a(),
            CompareOutputMode::Inverted | CompareOutputMode::NonInverted => true,
        }
    }
}

/// Compute the duty-cycle fraction of one output channel
///
/// Returns `None` when the channel's sub-mode is disabled or invalid for
/// the mode. The fraction is clamped to `[0.0, 1.0]`, which matters when
/// OCRB lies above a variable TOP.
///
/// # Arguments
///
/// * `mode` - Active waveform generation mode
/// * `sub_mode` - Compare output mode of the channel
/// * `channel` - Channel being queried
/// * `compare_a` - OCRA (TOP in variable-top modes, match for channel A)
/// * `compare_b` - OCRB (match for channel B)
///
/// # Example
///
/// ```
/// use avr_timer8::core::waveform::*;
///
/// let duty = duty_cycle(
///     WaveformMode::FastPwm,
///     CompareOutputMode::NonInverted,
///     Channel::A,
///     127,
///     0,
/// );
/// assert_eq!(duty, Some(0.5));
/// ```
pub fn duty_cycle(
    mode: WaveformMode,
    sub_mode: CompareOutputMode,
    channel: Channel,
    compare_a: u8,
    compare_b: u8,
) -> Option<f32> {
    if !sub_mode.is_valid_for(channel, mode) {
        return None;
    }

    let top = mode.top(compare_a) as f32;
    let matched = match channel {
        Channel::A => compare_a,
        Channel::B => compare_b,
    } as f32;

    let fraction = match sub_mode {
        CompareOutputMode::Toggle => 0.5,
        CompareOutputMode::Inverted => (top - matched) / (top + 1.0),
        CompareOutputMode::NonInverted => (matched + 1.0) / (top + 1.0),
        CompareOutputMode::Disabled => return None,
    };

    Some(fraction.clamp(0.0, 1.0))
}

/// Waveform-relevant register state
///
/// Compared after every control/compare write so that pins are only
/// notified when something affecting the output actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaveformSnapshot {
    pub mode: WaveformMode,
    pub sub_mode_a: CompareOutputMode,
    pub sub_mode_b: CompareOutputMode,
    pub compare_a: u8,
    pub compare_b: u8,
    pub clock_source: ClockSource,
}

impl WaveformSnapshot {
    /// Capture the waveform-relevant fields of the register file
    pub fn capture(control_a: u8, control_b: u8, compare_a: u8, compare_b: u8) -> Self {
        Self {
            mode: WaveformMode::from_control(control_a, control_b),
            sub_mode_a: CompareOutputMode::from_control(control_a, Channel::A),
            sub_mode_b: CompareOutputMode::from_control(control_a, Channel::B),
            compare_a,
            compare_b,
            clock_source: ClockSource::from_bits(control_b),
        }
    }

    /// Sub-mode of the given channel
    #[inline(always)]
    pub fn sub_mode(&self, channel: Channel) -> CompareOutputMode {
        match channel {
            Channel::A => self.sub_mode_a,
            Channel::B => self.sub_mode_b,
        }
    }
}
