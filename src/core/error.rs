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

/// Timer error types
use thiserror::Error;

use super::pin::PinId;

/// Result type for timer operations
pub type Result<T> = std::result::Result<T, TimerError>;

/// Main error type for the timer peripheral
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Invalid access size: {size} bytes (only 1-byte accesses are supported)")]
    InvalidAccessSize { size: u32 },

    #[error("Invalid register offset {offset:#04x} in {window} window")]
    InvalidRegister { window: &'static str, offset: u32 },

    #[error("Pin {0} is not an output of this timer")]
    UnknownPin(PinId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Incompatible save state version: expected {expected}, got {got}")]
    IncompatibleSaveState { expected: u32, got: u32 },

    #[error("Save state encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Save state decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
