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

mod common;

use avr_timer8::core::config::TimerConfig;
use avr_timer8::core::error::{Result, TimerError};
use avr_timer8::core::interrupt::TimerIrq;
use avr_timer8::core::peripheral::{Peripheral, RegisterWindow};
use avr_timer8::core::pin::PinId;
use avr_timer8::core::save_state::{SaveState, StateSave};
use avr_timer8::core::timer::{
    REG_COMPARE_A, REG_COMPARE_B, REG_CONTROL_A, REG_CONTROL_B, REG_COUNTER,
};
use avr_timer8::core::timing::VirtualClock;
use common::assertions::{assert_flags, assert_pwm_message};
use common::fixtures::{bus_read, bus_write, create_board, create_board_with, run_ticks};

const OC_A: PinId = PinId::new('D', 6);
const OC_B: PinId = PinId::new('D', 5);

#[test]
fn test_overflow_interrupt_via_bus() -> Result<()> {
    let mut board = create_board();
    let device: &mut dyn Peripheral = &mut board.timer;

    device.write(RegisterWindow::InterruptMask, 0, 0x01, 1)?;
    bus_write(device, REG_COMPARE_A, 0x80);
    bus_write(device, REG_COMPARE_B, 0x80);
    bus_write(device, REG_COUNTER, 0xFE);
    bus_write(device, REG_CONTROL_B, 0x01);

    run_ticks(&mut board.timer, 2);

    assert_eq!(bus_read(&board.timer, REG_COUNTER), 0x00);
    assert_flags(&board.timer, 0x01);
    assert!(board.irqs.level(TimerIrq::Overflow));
    assert!(!board.irqs.level(TimerIrq::CompareA));
    Ok(())
}

#[test]
fn test_ctc_cycle() {
    let mut board = create_board();
    bus_write(&mut board.timer, REG_COMPARE_A, 10);
    bus_write(&mut board.timer, REG_CONTROL_A, 0x02);
    bus_write(&mut board.timer, REG_CONTROL_B, 0x01);

    run_ticks(&mut board.timer, 11);

    assert_eq!(bus_read(&board.timer, REG_COUNTER), 0);
    assert!(board.timer.read_flags() & 0x02 != 0);
}

#[test]
fn test_pwm_outputs_end_to_end() {
    let mut board = create_board();
    board.port.set_direction(0x60);

    bus_write(&mut board.timer, REG_COMPARE_A, 127);
    bus_write(&mut board.timer, REG_COMPARE_B, 63);
    bus_write(&mut board.timer, REG_CONTROL_A, 0xE3); // A non-inverted, B inverted, fast PWM
    bus_write(&mut board.timer, REG_CONTROL_B, 0x01);

    assert!(board.timer.is_active(OC_A));
    assert!(board.timer.is_active(OC_B));
    assert_pwm_message(&board.timer, OC_A, 0, 0.5);
    assert_pwm_message(&board.timer, OC_B, 1, 0.75);
    assert!(board.port.notifications(OC_A.pin) > 0);
    assert!(board.port.notifications(OC_B.pin) > 0);

    // Counting leaves the duty cycle alone
    run_ticks(&mut board.timer, 1000);
    assert_pwm_message(&board.timer, OC_A, 0, 0.5);
}

#[test]
fn test_pin_released_when_direction_cleared() {
    let mut board = create_board();
    board.port.set_direction(0x60);
    bus_write(&mut board.timer, REG_CONTROL_A, 0xF3);
    bus_write(&mut board.timer, REG_CONTROL_B, 0x01);
    assert!(board.timer.is_active(OC_A));

    board.port.set_direction(0x00);

    assert!(!board.timer.is_active(OC_A));
    assert!(!board.timer.is_active(OC_B));
}

#[test]
fn test_virtual_time() {
    let mut board = create_board();
    bus_write(&mut board.timer, REG_CONTROL_B, 0x02); // clk/8 at 20 MHz
    assert_eq!(board.timer.period_ns(), 400);

    let mut clock = VirtualClock::new(board.timer.cpu_frequency_hz());
    let ticks = clock.run(100_000, &mut board.timer);

    assert_eq!(ticks, 2_000);
    assert_eq!(board.timer.counter(), 250);
}

#[test]
fn test_reset_through_trait_object() {
    let mut board = create_board();
    let device: &mut dyn Peripheral = &mut board.timer;
    device.write(RegisterWindow::InterruptMask, 0, 0x07, 1).unwrap();
    for offset in [REG_CONTROL_A, REG_COUNTER, REG_COMPARE_A, REG_COMPARE_B] {
        bus_write(device, offset, 0x44);
    }
    bus_write(device, REG_CONTROL_B, 0x01);
    run_ticks(&mut board.timer, 300);

    let device: &mut dyn Peripheral = &mut board.timer;
    device.reset();

    for offset in [REG_CONTROL_A, REG_CONTROL_B, REG_COUNTER, REG_COMPARE_A, REG_COMPARE_B] {
        assert_eq!(bus_read(device, offset), 0);
    }
    assert_flags(device, 0);
    for line in TimerIrq::ALL {
        assert!(!board.irqs.level(line));
    }
}

#[test]
fn test_wide_access_leaves_state_untouched() {
    let mut board = create_board();
    bus_write(&mut board.timer, REG_COUNTER, 0x12);

    let device: &mut dyn Peripheral = &mut board.timer;
    let result = device.write(RegisterWindow::Control, REG_COUNTER, 0x3456, 2);

    assert!(matches!(result, Err(TimerError::InvalidAccessSize { size: 2 })));
    assert_eq!(bus_read(device, REG_COUNTER), 0x12);
}

#[test]
fn test_configured_board_save_and_resume() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("timer.toml");
    std::fs::write(
        &config_path,
        "cpu_frequency_hz = 8000000\n\
         output_a = { port = \"B\", pin = 3 }\n\
         output_b = { port = \"B\", pin = 4 }\n",
    )?;

    let config = TimerConfig::from_file(&config_path)?;
    let mut original = create_board_with(&config);
    assert_eq!(original.timer.output_a(), PinId::new('B', 3));

    bus_write(&mut original.timer, REG_COMPARE_A, 199);
    bus_write(&mut original.timer, REG_COMPARE_B, 50);
    bus_write(&mut original.timer, REG_CONTROL_A, 0xA3);
    bus_write(&mut original.timer, REG_CONTROL_B, 0x0B); // variable TOP, clk/64
    original.timer.write_mask(0x06);
    run_ticks(&mut original.timer, 64 * 150 + 17);

    let state_path = dir.path().join("timer.state");
    SaveState::from_timer(&original.timer, "resume", 64 * 150 + 17).save_to_file(&state_path)?;

    let loaded = SaveState::load_from_file(&state_path)?;
    assert_eq!(loaded.metadata.tick_count, 64 * 150 + 17);

    let mut resumed = create_board_with(&config);
    loaded.apply_to(&mut resumed.timer);
    assert_eq!(resumed.timer.prescale_progress(), 17);

    run_ticks(&mut original.timer, 64 * 500);
    run_ticks(&mut resumed.timer, 64 * 500);

    assert_eq!(resumed.timer.to_state(), original.timer.to_state());
    assert_eq!(
        resumed.irqs.level(TimerIrq::CompareB),
        original.irqs.level(TimerIrq::CompareB)
    );
    Ok(())
}

#[test]
fn test_invalid_config_file_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "cpu_frequency_hz = 0\n")?;

    assert!(matches!(
        TimerConfig::from_file(&path),
        Err(TimerError::InvalidConfig(_))
    ));
    Ok(())
}
