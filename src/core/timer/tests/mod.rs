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

//! Timer tests
//!
//! - `basic`: Counting, overflow, clock sources
//! - `prescaler`: Divider phase handling
//! - `modes`: Waveform generation modes and TOP
//! - `interrupts`: Flags, mask, and interrupt lines
//! - `pwm`: Duty cycle, pin ownership, notifications
//! - `registers`: Register windows and access checks
//! - `shared`: Cross-thread access and virtual clock delivery

use super::*;
use crate::core::interrupt::{InterruptFlags, IrqLevels};
use crate::core::pin::SimPort;


const CPU_HZ: u64 = 16_000_000;
const OC_A: PinId = PinId::new('D', 6);
const OC_B: PinId = PinId::new('D', 5);

/// Timer wired to an interrupt latch and port D
struct Fixture {
    timer: Timer8,
    irqs: IrqLevels,
    port: Arc<SimPort>,
}

fn fixture() -> Fixture {
    let irqs = IrqLevels::new();
    let port = Arc::new(SimPort::new('D'));
    let mut timer = Timer8::new(CPU_HZ, OC_A, OC_B, Box::new(irqs.clone()));
    timer.connect_port(&port);

    Fixture { timer, irqs, port }
}

/// Timer with no port attached
fn bare_timer() -> Timer8 {
    Timer8::new(CPU_HZ, OC_A, OC_B, Box::new(IrqLevels::new()))
}

fn tick(timer: &mut Timer8, count: u32) {
    for _ in 0..count {
        timer.on_tick();
    }
}
