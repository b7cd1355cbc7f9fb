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

use std::path::PathBuf;
use std::sync::Arc;

use avr_timer8::core::clock::ClockSource;
use avr_timer8::core::config::TimerConfig;
use avr_timer8::core::interrupt::{IrqLevels, TimerIrq};
use avr_timer8::core::peripheral::{Peripheral, RegisterWindow};
use avr_timer8::core::pin::{PortProvider, SimPort};
use avr_timer8::core::save_state::SaveState;
use avr_timer8::core::timer::Timer8;
use avr_timer8::core::timing::{GlobalTicks, VirtualClock};
use avr_timer8::core::waveform::WaveformMode;
use clap::Parser;
use log::{error, info};
use serde::Serialize;

/// AVR 8-bit timer/counter simulator
#[derive(Parser)]
#[command(name = "avr-timer8")]
#[command(about = "Run an AVR 8-bit timer/counter for a number of clock ticks", long_about = None)]
struct Args {
    /// Timer configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Register write OFFSET=VALUE in the control window (repeatable, applied in order)
    #[arg(short = 'w', long = "write", value_parser = parse_register_write)]
    writes: Vec<(u32, u8)>,

    /// Interrupt mask register value
    #[arg(short = 'm', long, value_parser = parse_byte)]
    mask: Option<u8>,

    /// Base clock ticks to deliver
    #[arg(short = 'n', long, conflicts_with = "nanos")]
    ticks: Option<u64>,

    /// Virtual nanoseconds to run
    #[arg(long)]
    nanos: Option<u64>,

    /// Port direction register PORT=BITS (e.g. D=0x60)
    #[arg(short = 'd', long = "ddr", value_parser = parse_direction)]
    directions: Vec<(char, u8)>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,

    /// Write a save state to this path when done
    #[arg(short = 's', long)]
    save: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Final timer state
#[derive(Serialize)]
struct Report {
    cpu_frequency_hz: u64,
    ticks: u64,
    control_a: u8,
    control_b: u8,
    counter: u8,
    compare_a: u8,
    compare_b: u8,
    interrupt_flags: u8,
    interrupt_mask: u8,
    clock_source: ClockSource,
    mode: WaveformMode,
    frequency_hz: u64,
    period_ns: u64,
    irq_lines: Vec<IrqReport>,
    outputs: Vec<OutputReport>,
}

#[derive(Serialize)]
struct IrqReport {
    line: String,
    level: bool,
    assertions: u32,
}

#[derive(Serialize)]
struct OutputReport {
    pin: String,
    active: bool,
    duty: f32,
    message: Vec<u8>,
}

fn parse_byte(text: &str) -> Result<u8, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid byte '{}': {}", text, e))
}

fn parse_register_write(text: &str) -> Result<(u32, u8), String> {
    let (offset, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected OFFSET=VALUE, got '{}'", text))?;
    Ok((parse_byte(offset)? as u32, parse_byte(value)?))
}

fn parse_direction(text: &str) -> Result<(char, u8), String> {
    let (port, bits) = text
        .split_once('=')
        .ok_or_else(|| format!("expected PORT=BITS, got '{}'", text))?;

    let mut chars = port.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            Ok((letter.to_ascii_uppercase(), parse_byte(bits)?))
        }
        _ => Err(format!("invalid port '{}'", port)),
    }
}

fn build_report(timer: &Timer8, irqs: &IrqLevels, ticks: u64) -> Report {
    let irq_lines = TimerIrq::ALL
        .iter()
        .map(|&line| IrqReport {
            line: format!("{:?}", line),
            level: irqs.level(line),
            assertions: irqs.assertions(line),
        })
        .collect();

    let outputs = [timer.output_a(), timer.output_b()]
        .into_iter()
        .map(|pin| {
            let mut message = Vec::new();
            timer.serialize_output(pin, &mut message);
            OutputReport {
                pin: pin.to_string(),
                active: timer.is_active(pin),
                duty: timer.duty_cycle(pin).map_or(0.0, |duty| duty.fraction),
                message,
            }
        })
        .collect();

    Report {
        cpu_frequency_hz: timer.cpu_frequency_hz(),
        ticks,
        control_a: timer.control_a(),
        control_b: timer.control_b(),
        counter: timer.counter(),
        compare_a: timer.compare_a(),
        compare_b: timer.compare_b(),
        interrupt_flags: timer.read_flags(),
        interrupt_mask: timer.read_mask(),
        clock_source: timer.clock_source(),
        mode: timer.mode(),
        frequency_hz: timer.frequency_hz(),
        period_ns: timer.period_ns(),
        irq_lines,
        outputs,
    }
}

fn print_report(report: &Report) {
    println!(
        "counter=0x{:02X} flags=0x{:02X} mask=0x{:02X} after {} ticks",
        report.counter, report.interrupt_flags, report.interrupt_mask, report.ticks
    );
    println!(
        "mode={:?} clock={:?} ({} Hz, {} ns/count)",
        report.mode, report.clock_source, report.frequency_hz, report.period_ns
    );
    for irq in &report.irq_lines {
        println!(
            "irq {:<8} level={} assertions={}",
            irq.line, irq.level, irq.assertions
        );
    }
    for output in &report.outputs {
        println!(
            "{} active={} duty={:.4}",
            output.pin, output.active, output.duty
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("avr-timer8 v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TimerConfig::from_file(path).map_err(|e| {
            error!("Failed to load config {}: {}", path.display(), e);
            e
        })?,
        None => TimerConfig::default(),
    };
    config.apply_env_overrides()?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let irqs = IrqLevels::new();
    let mut timer = Timer8::from_config(&config, Box::new(irqs.clone()));

    // One simulated port per output port letter
    let mut ports: Vec<Arc<SimPort>> = Vec::new();
    for letter in [config.output_a.port, config.output_b.port] {
        if ports.iter().all(|port| port.port_id() != letter) {
            let port = Arc::new(SimPort::new(letter));
            timer.connect_port(&port);
            ports.push(port);
        }
    }
    for (letter, bits) in &args.directions {
        match ports.iter().find(|port| port.port_id() == *letter) {
            Some(port) => port.set_direction(*bits),
            None => log::warn!("Port {} drives no timer output, direction ignored", letter),
        }
    }

    if let Some(mask) = args.mask {
        timer.write(RegisterWindow::InterruptMask, 0, mask as u64, 1)?;
    }
    for &(offset, value) in &args.writes {
        timer.write(RegisterWindow::Control, offset, value as u64, 1)?;
    }

    let mut clock = VirtualClock::new(config.cpu_frequency_hz);
    let ticks: GlobalTicks = match (args.ticks, args.nanos) {
        (Some(ticks), _) => {
            for _ in 0..ticks {
                timer.on_tick();
            }
            ticks
        }
        (None, Some(nanos)) => {
            clock.run(nanos, &mut timer);
            clock.total_ticks()
        }
        (None, None) => 0,
    };
    info!("Delivered {} ticks", ticks);

    if let Some(path) = &args.save {
        let state = SaveState::from_timer(&timer, "avr-timer8", ticks);
        state.save_to_file(path).map_err(|e| {
            error!("Failed to save state to {}: {}", path.display(), e);
            e
        })?;
        info!("Saved state to {}", path.display());
    }

    let report = build_report(&timer, &irqs, ticks);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
