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

//! Test fixtures for common test scenarios

use std::sync::Arc;

use avr_timer8::core::config::TimerConfig;
use avr_timer8::core::interrupt::IrqLevels;
use avr_timer8::core::peripheral::{Peripheral, RegisterWindow};
use avr_timer8::core::pin::SimPort;
use avr_timer8::core::timer::Timer8;

/// Timer wired to an interrupt latch and the port owning its outputs
pub struct Board {
    pub timer: Timer8,
    pub irqs: IrqLevels,
    pub port: Arc<SimPort>,
}

/// Create a board from the default configuration (OC0A = PD6, OC0B = PD5)
#[allow(dead_code)]
pub fn create_board() -> Board {
    create_board_with(&TimerConfig::default())
}

/// Create a board from a configuration whose outputs share one port
#[allow(dead_code)]
pub fn create_board_with(config: &TimerConfig) -> Board {
    let irqs = IrqLevels::new();
    let port = Arc::new(SimPort::new(config.output_a.port));
    let mut timer = Timer8::from_config(config, Box::new(irqs.clone()));
    timer.connect_port(&port);

    Board { timer, irqs, port }
}

/// Write a control-window register through the bus interface
#[allow(dead_code)]
pub fn bus_write(device: &mut dyn Peripheral, offset: u32, value: u8) {
    device
        .write(RegisterWindow::Control, offset, value as u64, 1)
        .expect("1-byte write must succeed");
}

/// Read a control-window register through the bus interface
#[allow(dead_code)]
pub fn bus_read(device: &dyn Peripheral, offset: u32) -> u8 {
    device
        .read(RegisterWindow::Control, offset, 1)
        .expect("1-byte read must succeed") as u8
}

/// Deliver `count` base clock edges
#[allow(dead_code)]
pub fn run_ticks(timer: &mut Timer8, count: u64) {
    for _ in 0..count {
        timer.on_tick();
    }
}
