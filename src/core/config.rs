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

//! Timer configuration
//!
//! Construction-time properties of a timer instance, loaded from TOML:
//!
//! ```toml
//! cpu_frequency_hz = 16000000
//! output_a = { port = "D", pin = 6 }
//! output_b = { port = "D", pin = 5 }
//! ```
//!
//! Every key is optional. Defaults match Timer0 of an ATmega328P clocked at
//! 20 MHz. `AVR_TIMER8_CPU_FREQUENCY_HZ` in the environment (or a `.env`
//! file loaded by the binary) overrides the frequency.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Result, TimerError};
use super::pin::{PinId, PINS_PER_PORT};
use super::timer::DEFAULT_CPU_FREQUENCY_HZ;

/// Environment variable overriding `cpu_frequency_hz`
pub const ENV_CPU_FREQUENCY: &str = "AVR_TIMER8_CPU_FREQUENCY_HZ";

/// Timer construction properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimerConfig {
    /// Base clock frequency in Hz
    pub cpu_frequency_hz: u64,

    /// Pin driven by compare channel A (OC0A)
    pub output_a: PinId,

    /// Pin driven by compare channel B (OC0B)
    pub output_b: PinId,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            cpu_frequency_hz: DEFAULT_CPU_FREQUENCY_HZ,
            output_a: PinId::new('D', 6),
            output_b: PinId::new('D', 5),
        }
    }
}

impl TimerConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TimerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loaded timer config from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Check the configuration for consistency
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfig`] for a zero frequency, a pin
    /// number outside the port, or both outputs on the same pin.
    pub fn validate(&self) -> Result<()> {
        if self.cpu_frequency_hz == 0 {
            return Err(TimerError::InvalidConfig(
                "cpu_frequency_hz must be greater than 0".to_string(),
            ));
        }

        for pin in [self.output_a, self.output_b] {
            if pin.pin >= PINS_PER_PORT {
                return Err(TimerError::InvalidConfig(format!(
                    "pin {} out of range (0-{})",
                    pin,
                    PINS_PER_PORT - 1
                )));
            }
        }

        if self.output_a == self.output_b {
            return Err(TimerError::InvalidConfig(format!(
                "output_a and output_b both map to {}",
                self.output_a
            )));
        }

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfig`] if an override does not parse
    /// or leaves the configuration invalid.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(ENV_CPU_FREQUENCY) {
            self.cpu_frequency_hz = value.trim().parse().map_err(|_| {
                TimerError::InvalidConfig(format!("{}={} is not a frequency", ENV_CPU_FREQUENCY, value))
            })?;
            log::debug!("CPU frequency overridden to {} Hz", self.cpu_frequency_hz);
        }

        self.validate()
    }
}
