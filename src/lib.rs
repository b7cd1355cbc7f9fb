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

//! 8-bit AVR timer/counter peripheral library
//!
//! This library models the 8-bit timer/counter found on small AVR
//! microcontrollers: a prescaled free-running counter, two output-compare
//! channels, Normal/CTC/Fast-PWM/Phase-correct-PWM waveform generation, and
//! an interrupt flag/mask pair driving three interrupt lines.
//!
//! # Example
//!
//! ```
//! use avr_timer8::core::interrupt::IrqLevels;
//! use avr_timer8::core::timer::{Timer8, REG_CONTROL_B, REG_COMPARE_A};
//! use avr_timer8::core::peripheral::{Peripheral, RegisterWindow};
//! use avr_timer8::core::pin::PinId;
//!
//! let irqs = IrqLevels::new();
//! let mut timer = Timer8::new(
//!     16_000_000,
//!     PinId::new('D', 6),
//!     PinId::new('D', 5),
//!     Box::new(irqs.clone()),
//! );
//!
//! // Compare A at 10, clock source div1
//! timer.write(RegisterWindow::Control, REG_COMPARE_A, 10, 1).unwrap();
//! timer.write(RegisterWindow::Control, REG_CONTROL_B, 0x01, 1).unwrap();
//!
//! for _ in 0..10 {
//!     timer.on_tick();
//! }
//! assert_eq!(timer.counter(), 10);
//! ```

pub mod core;
