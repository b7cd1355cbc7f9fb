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

//! Custom assertions for timer testing

use avr_timer8::core::peripheral::{Peripheral, RegisterWindow};
use avr_timer8::core::pin::PinId;
use avr_timer8::core::timer::{PWM_MESSAGE_ID, PWM_MESSAGE_LEN};

/// Assert the interrupt flag register holds `expected`
#[allow(dead_code)]
pub fn assert_flags(device: &dyn Peripheral, expected: u8) {
    let actual = device
        .read(RegisterWindow::InterruptFlags, 0, 1)
        .expect("1-byte read must succeed") as u8;
    assert_eq!(
        actual, expected,
        "Flag register mismatch: expected 0b{:03b}, got 0b{:03b}",
        expected, actual
    );
}

/// Assert the serialized PWM message of `pin`
#[allow(dead_code)]
pub fn assert_pwm_message(device: &dyn Peripheral, pin: PinId, channel: u8, duty: f32) {
    let mut out = Vec::new();
    let written = device.serialize_output(pin, &mut out);

    assert_eq!(written, PWM_MESSAGE_LEN, "{}: wrong message length", pin);
    assert_eq!(out[0], PWM_MESSAGE_ID | channel, "{}: wrong header", pin);

    let fraction = f32::from_le_bytes([out[1], out[2], out[3], out[4]]);
    assert!(
        (fraction - duty).abs() < 1e-6,
        "{}: duty mismatch: expected {}, got {}",
        pin,
        duty,
        fraction
    );
}
