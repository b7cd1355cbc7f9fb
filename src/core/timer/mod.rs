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

//! AVR 8-bit Timer/Counter Implementation
//!
//! An 8-bit counter driven by a prescaled CPU clock, with two output compare
//! channels (A and B), waveform generation, and three interrupt sources.
//!
//! ## Register Layout
//!
//! Main window (1-byte registers):
//! - `+0`: Control A (COMA1:0, COMB1:0, WGM01:00) (R/W)
//! - `+1`: Control B (WGM02, CS02:00) (R/W)
//! - `+2`: Counter (R/W)
//! - `+3`: Output compare A (R/W)
//! - `+4`: Output compare B (R/W)
//!
//! The interrupt flag and mask registers live in their own 1-byte windows.
//!
//! ## Counting
//!
//! Every base clock edge calls [`Timer8::on_tick`]. With a divided clock
//! source selected, every Nth edge is a count:
//!
//! ```text
//! counter == TOP  ->  counter = 0
//! otherwise       ->  counter += 1 (wrapping 0xFF -> 0x00)
//!
//! 0xFF -> 0x00         : overflow flag
//! counter == OCRA      : compare A flag
//! counter == OCRB      : compare B flag
//! ```
//!
//! TOP is 0xFF except in CTC and the variable-top PWM modes, where it is
//! OCRA. A cycle therefore lasts `TOP + 1` counts.
//!
//! ## Output Pins
//!
//! In PWM modes the compare outputs may drive their pins (OCA/OCB). Any
//! write that changes the waveform configuration notifies both pins' ports
//! so they can re-sample the duty cycle.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::clock::{ClockRate, ClockSource};
use super::compare;
use super::config::TimerConfig;
use super::error::{Result, TimerError};
use super::interrupt::{InterruptController, InterruptSink, TimerIrq};
use super::peripheral::{check_access_size, Peripheral, RegisterWindow};
use super::pin::{PinId, PortProvider};
use super::save_state::{StateSave, TimerState};
use super::timing::Tickable;
use super::waveform::{self, Channel, CompareOutputMode, WaveformMode, WaveformSnapshot};

#[cfg(test)]
mod tests;

/// Control A register offset
pub const REG_CONTROL_A: u32 = 0;
/// Control B register offset
pub const REG_CONTROL_B: u32 = 1;
/// Counter register offset
pub const REG_COUNTER: u32 = 2;
/// Output compare A register offset
pub const REG_COMPARE_A: u32 = 3;
/// Output compare B register offset
pub const REG_COMPARE_B: u32 = 4;

/// Number of registers in the main window
pub const TIMER_REGISTER_COUNT: u32 = 5;

/// Default CPU clock frequency
pub const DEFAULT_CPU_FREQUENCY_HZ: u64 = 20_000_000;

/// Message identifier of a serialized PWM output
///
/// Sits next to the digital I/O (0x00) and ADC (0x08) identifiers used by
/// the other peripherals' wire messages. The low bit carries the channel.
pub const PWM_MESSAGE_ID: u8 = 0x10;

/// Length of a serialized PWM output: header + little-endian `f32`
pub const PWM_MESSAGE_LEN: usize = 5;

/// Duty cycle of one output pin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyCycle {
    /// Wire header (`PWM_MESSAGE_ID | channel`)
    pub header: u8,

    /// Fraction of the period the output is high (0.0 when inactive)
    pub fraction: f32,
}

impl DutyCycle {
    /// Encode as `[header, fraction (f32, little-endian)]`
    pub fn to_bytes(self) -> [u8; PWM_MESSAGE_LEN] {
        let mut bytes = [0u8; PWM_MESSAGE_LEN];
        bytes[0] = self.header;
        bytes[1..].copy_from_slice(&self.fraction.to_le_bytes());
        bytes
    }
}

/// 8-bit timer/counter with two compare outputs
///
/// # Example
///
/// ```
/// use avr_timer8::core::interrupt::{IrqLevels, TimerIrq};
/// use avr_timer8::core::pin::PinId;
/// use avr_timer8::core::timer::Timer8;
///
/// let irqs = IrqLevels::new();
/// let mut timer = Timer8::new(
///     16_000_000,
///     PinId::new('D', 6),
///     PinId::new('D', 5),
///     Box::new(irqs.clone()),
/// );
///
/// timer.write_mask(0x01); // overflow interrupt enabled
/// timer.write_control_b(0x01); // clk/1
///
/// for _ in 0..256 {
///     timer.on_tick();
/// }
/// assert_eq!(timer.counter(), 0);
/// assert!(irqs.level(TimerIrq::Overflow));
/// ```
pub struct Timer8 {
    /// Control A (COMA, COMB, WGM01:00)
    control_a: u8,

    /// Control B (WGM02, CS02:00)
    control_b: u8,

    /// Current counter value
    counter: u8,

    /// Output compare A (TOP in CTC / variable-top PWM)
    compare_a: u8,

    /// Output compare B
    compare_b: u8,

    /// Base ticks seen since the last count
    prescale_accum: u32,

    /// Base ticks per count (None = not counting)
    divider: Option<u32>,

    /// Effective counting rate for the current clock source
    rate: ClockRate,

    /// Base clock frequency, fixed at construction
    cpu_frequency_hz: u64,

    /// Flag/mask registers and interrupt lines
    interrupts: InterruptController,

    /// Waveform state the output pins were last notified about
    waveform: WaveformSnapshot,

    /// OCA pin
    output_a: PinId,

    /// OCB pin
    output_b: PinId,

    /// Ports owning the output pins (never owned by the timer)
    ports: Vec<Weak<dyn PortProvider>>,
}

impl Timer8 {
    /// Create a new timer in its reset state
    ///
    /// # Arguments
    ///
    /// * `cpu_frequency_hz` - Base clock frequency
    /// * `output_a` - Pin driven by compare channel A
    /// * `output_b` - Pin driven by compare channel B
    /// * `sink` - Receiver of the overflow/compare interrupt lines
    pub fn new(
        cpu_frequency_hz: u64,
        output_a: PinId,
        output_b: PinId,
        sink: Box<dyn InterruptSink>,
    ) -> Self {
        log::debug!(
            "Timer8 created: cpu={} Hz, OCA={}, OCB={}",
            cpu_frequency_hz,
            output_a,
            output_b
        );

        Self {
            control_a: 0,
            control_b: 0,
            counter: 0,
            compare_a: 0,
            compare_b: 0,
            prescale_accum: 0,
            divider: None,
            rate: ClockRate::default(),
            cpu_frequency_hz,
            interrupts: InterruptController::new(sink),
            waveform: WaveformSnapshot::default(),
            output_a,
            output_b,
            ports: Vec::new(),
        }
    }

    /// Create a timer from a validated configuration
    pub fn from_config(config: &TimerConfig, sink: Box<dyn InterruptSink>) -> Self {
        Self::new(config.cpu_frequency_hz, config.output_a, config.output_b, sink)
    }

    /// Attach the port owning one (or both) of the output pins
    ///
    /// Only a weak reference is kept. A port with the same letter replaces
    /// any previously connected one.
    pub fn connect_port<P: PortProvider + 'static>(&mut self, port: &Arc<P>) {
        let id = port.port_id();
        let weak = Arc::downgrade(port);
        let weak: Weak<dyn PortProvider> = weak;

        self.ports
            .retain(|existing| existing.upgrade().is_some_and(|p| p.port_id() != id));
        self.ports.push(weak);

        log::debug!("Timer8: port {} connected", id);
    }

    /// Read the counter
    #[inline(always)]
    pub fn counter(&self) -> u8 {
        self.counter
    }

    #[inline(always)]
    pub fn control_a(&self) -> u8 {
        self.control_a
    }

    #[inline(always)]
    pub fn control_b(&self) -> u8 {
        self.control_b
    }

    #[inline(always)]
    pub fn compare_a(&self) -> u8 {
        self.compare_a
    }

    #[inline(always)]
    pub fn compare_b(&self) -> u8 {
        self.compare_b
    }

    /// Selected clock source
    #[inline(always)]
    pub fn clock_source(&self) -> ClockSource {
        ClockSource::from_bits(self.control_b)
    }

    /// Active waveform generation mode
    #[inline(always)]
    pub fn mode(&self) -> WaveformMode {
        WaveformMode::from_control(self.control_a, self.control_b)
    }

    /// Current TOP value
    #[inline(always)]
    pub fn top(&self) -> u8 {
        self.mode().top(self.compare_a)
    }

    /// Base ticks per count, `None` when stopped
    #[inline(always)]
    pub fn divider(&self) -> Option<u32> {
        self.divider
    }

    /// True if the timer consumes ticks
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.divider.is_some()
    }

    /// Counts per second (0 when stopped)
    pub fn frequency_hz(&self) -> u64 {
        self.rate.frequency_hz
    }

    /// Nanoseconds per count (0 when stopped)
    pub fn period_ns(&self) -> u64 {
        self.rate.period_ns
    }

    pub fn cpu_frequency_hz(&self) -> u64 {
        self.cpu_frequency_hz
    }

    pub fn output_a(&self) -> PinId {
        self.output_a
    }

    pub fn output_b(&self) -> PinId {
        self.output_b
    }

    /// Base ticks accumulated toward the next count
    pub fn prescale_progress(&self) -> u32 {
        self.prescale_accum
    }

    /// Write control register A
    pub fn write_control_a(&mut self, value: u8) {
        self.control_a = value;
        self.warn_reserved_mode();
        self.recompute_if_changed();
    }

    /// Write control register B
    ///
    /// Changing the clock source recomputes the divider. Leaving the stopped
    /// state resynchronizes the prescaler so the first count lands a full
    /// divider period after this write.
    pub fn write_control_b(&mut self, value: u8) {
        let previous = self.clock_source();
        self.control_b = value;

        let source = self.clock_source();
        if source != previous {
            self.update_divider();
            if !previous.is_counting() && source.is_counting() {
                self.prescale_accum = 0;
                log::debug!("Timer8 started at counter={}", self.counter);
            }
        }

        self.warn_reserved_mode();
        self.recompute_if_changed();
    }

    /// Write the counter
    ///
    /// Takes effect immediately and restarts the prescaler phase.
    pub fn write_counter(&mut self, value: u8) {
        self.counter = value;
        self.prescale_accum = 0;
        log::trace!("Timer8 counter = 0x{:02X}", value);
    }

    /// Write output compare A
    pub fn write_compare_a(&mut self, value: u8) {
        self.compare_a = value;
        log::trace!("Timer8 OCRA = 0x{:02X}", value);
        self.recompute_if_changed();
    }

    /// Write output compare B
    pub fn write_compare_b(&mut self, value: u8) {
        self.compare_b = value;
        log::trace!("Timer8 OCRB = 0x{:02X}", value);
        self.recompute_if_changed();
    }

    /// Read the interrupt flag register
    #[inline(always)]
    pub fn read_flags(&self) -> u8 {
        self.interrupts.read_flags()
    }

    /// Write the interrupt flag register (replaces all flags)
    pub fn write_flags(&mut self, value: u8) {
        self.interrupts.write_flags(value);
    }

    /// Read the interrupt mask register
    #[inline(always)]
    pub fn read_mask(&self) -> u8 {
        self.interrupts.read_mask()
    }

    /// Write the interrupt mask register
    pub fn write_mask(&mut self, value: u8) {
        self.interrupts.write_mask(value);
    }

    /// Advance by one base clock edge
    ///
    /// Does nothing while stopped or on an external clock source.
    pub fn on_tick(&mut self) {
        let Some(divider) = self.divider else {
            return;
        };

        self.prescale_accum += 1;
        if self.prescale_accum < divider {
            return;
        }
        self.prescale_accum = 0;

        self.count();
    }

    /// Perform one counter increment and record the resulting events
    fn count(&mut self) {
        let top = self.top();
        let previous = self.counter;

        self.counter = if previous == top {
            0
        } else {
            previous.wrapping_add(1)
        };

        if previous == 0xFF {
            self.interrupts.raise(TimerIrq::Overflow);
        }

        let matched = compare::matches(self.counter, self.compare_a, self.compare_b);
        if matched.a() {
            self.interrupts.raise(TimerIrq::CompareA);
        }
        if matched.b() {
            self.interrupts.raise(TimerIrq::CompareB);
        }
    }

    /// Refresh the cached waveform state and notify the output pins
    ///
    /// # Returns
    ///
    /// `true` if anything waveform-relevant changed since the last call
    pub fn recompute_if_changed(&mut self) -> bool {
        let snapshot = WaveformSnapshot::capture(
            self.control_a,
            self.control_b,
            self.compare_a,
            self.compare_b,
        );
        if snapshot == self.waveform {
            return false;
        }

        if snapshot.mode != self.waveform.mode {
            log::debug!("Timer8 waveform mode: {:?}", snapshot.mode);
        }
        self.waveform = snapshot;

        self.notify_pin(self.output_a);
        self.notify_pin(self.output_b);
        true
    }

    /// Compare channel driving `pin`, if any
    pub fn channel_for(&self, pin: PinId) -> Option<Channel> {
        if pin == self.output_a {
            Some(Channel::A)
        } else if pin == self.output_b {
            Some(Channel::B)
        } else {
            None
        }
    }

    /// Compare output mode of a channel
    pub fn sub_mode(&self, channel: Channel) -> CompareOutputMode {
        CompareOutputMode::from_control(self.control_a, channel)
    }

    /// Duty cycle of a channel, `None` if its sub-mode is disabled or invalid
    pub fn channel_duty(&self, channel: Channel) -> Option<f32> {
        waveform::duty_cycle(
            self.mode(),
            self.sub_mode(channel),
            channel,
            self.compare_a,
            self.compare_b,
        )
    }

    /// Duty cycle of an output pin
    ///
    /// A disabled or invalid sub-mode reports a fraction of 0.0.
    ///
    /// # Returns
    ///
    /// `None` (with a diagnostic) if `pin` is neither OCA nor OCB
    pub fn duty_cycle(&self, pin: PinId) -> Option<DutyCycle> {
        let Some(channel) = self.channel_for(pin) else {
            log::warn!("Timer8: {}", TimerError::UnknownPin(pin));
            return None;
        };

        let fraction = self.channel_duty(channel).unwrap_or_else(|| {
            if self.sub_mode(channel) != CompareOutputMode::Disabled {
                log::warn!(
                    "Timer8: sub-mode {:?} unsupported on channel {:?} in {:?}",
                    self.sub_mode(channel),
                    channel,
                    self.mode()
                );
            }
            0.0
        });

        Some(DutyCycle {
            header: PWM_MESSAGE_ID | channel.index() as u8,
            fraction,
        })
    }

    /// True if the waveform output currently owns `pin`
    ///
    /// Requires a running clock, a PWM mode, a pin configured as output by
    /// its port, and a sub-mode that is valid for the pin's channel.
    pub fn drives_pin(&self, pin: PinId) -> bool {
        if !self.is_running() {
            return false;
        }

        let mode = self.mode();
        if !mode.is_pwm() {
            return false;
        }

        let Some(channel) = self.channel_for(pin) else {
            return false;
        };

        let Some(port) = self.port(pin.port) else {
            return false;
        };
        if !port.is_output(pin.pin) {
            return false;
        }

        self.sub_mode(channel).is_valid_for(channel, mode)
    }

    fn port(&self, id: char) -> Option<Arc<dyn PortProvider>> {
        self.ports
            .iter()
            .filter_map(Weak::upgrade)
            .find(|port| port.port_id() == id)
    }

    fn notify_pin(&self, pin: PinId) {
        match self.port(pin.port) {
            Some(port) => port.notify_voltage_changed(pin.pin),
            None => log::trace!("Timer8: port of {} not connected", pin),
        }
    }

    fn update_divider(&mut self) {
        let source = self.clock_source();
        if source.is_external() {
            log::warn!("Timer8: external clock source unsupported, timer stopped");
        }

        self.divider = source.divider();
        self.rate = ClockRate::new(self.cpu_frequency_hz, source);

        if self.divider.is_some() {
            log::debug!(
                "Timer8 frequency {} Hz, period {} ns",
                self.rate.frequency_hz,
                self.rate.period_ns
            );
        } else {
            log::debug!("Timer8 stopped");
        }
    }

    fn warn_reserved_mode(&self) {
        let wgm = WaveformMode::wgm_bits(self.control_a, self.control_b);
        if WaveformMode::is_reserved_code(wgm) {
            log::warn!("Timer8: reserved waveform mode {}, running as Normal", wgm);
        }
    }
}

fn undefined_register(window: RegisterWindow, offset: u32) -> TimerError {
    TimerError::InvalidRegister {
        window: window.name(),
        offset,
    }
}

impl Peripheral for Timer8 {
    fn read(&self, window: RegisterWindow, offset: u32, size: u32) -> Result<u64> {
        check_access_size(size)?;

        let value = match (window, offset) {
            (RegisterWindow::Control, REG_CONTROL_A) => self.control_a,
            (RegisterWindow::Control, REG_CONTROL_B) => self.control_b,
            (RegisterWindow::Control, REG_COUNTER) => self.counter,
            (RegisterWindow::Control, REG_COMPARE_A) => self.compare_a,
            (RegisterWindow::Control, REG_COMPARE_B) => self.compare_b,
            (RegisterWindow::InterruptFlags, 0) => self.read_flags(),
            (RegisterWindow::InterruptMask, 0) => self.read_mask(),
            _ => {
                log::warn!("Timer8 read: {}", undefined_register(window, offset));
                0
            }
        };

        Ok(value as u64)
    }

    fn write(&mut self, window: RegisterWindow, offset: u32, value: u64, size: u32) -> Result<()> {
        check_access_size(size)?;

        let value = value as u8;
        log::trace!("Timer8: write 0x{:02X} to {} offset {}", value, window, offset);

        match (window, offset) {
            (RegisterWindow::Control, REG_CONTROL_A) => self.write_control_a(value),
            (RegisterWindow::Control, REG_CONTROL_B) => self.write_control_b(value),
            (RegisterWindow::Control, REG_COUNTER) => self.write_counter(value),
            (RegisterWindow::Control, REG_COMPARE_A) => self.write_compare_a(value),
            (RegisterWindow::Control, REG_COMPARE_B) => self.write_compare_b(value),
            (RegisterWindow::InterruptFlags, 0) => self.write_flags(value),
            (RegisterWindow::InterruptMask, 0) => self.write_mask(value),
            _ => log::warn!("Timer8 write: {}", undefined_register(window, offset)),
        }

        Ok(())
    }

    /// Clear every register, stop the clock, and lower all interrupt lines
    fn reset(&mut self) {
        self.control_a = 0;
        self.control_b = 0;
        self.counter = 0;
        self.compare_a = 0;
        self.compare_b = 0;
        self.prescale_accum = 0;
        self.update_divider();
        self.interrupts.reset();
        self.recompute_if_changed();

        log::debug!("Timer8 reset");
    }

    fn is_active(&self, pin: PinId) -> bool {
        self.drives_pin(pin)
    }

    fn serialize_output(&self, pin: PinId, out: &mut Vec<u8>) -> usize {
        match self.duty_cycle(pin) {
            Some(duty) => {
                out.extend_from_slice(&duty.to_bytes());
                PWM_MESSAGE_LEN
            }
            None => 0,
        }
    }

    fn name(&self) -> &str {
        "AVR Timer8"
    }
}

impl Tickable for Timer8 {
    fn on_tick(&mut self) {
        Timer8::on_tick(self);
    }
}

impl StateSave for Timer8 {
    type State = TimerState;

    fn to_state(&self) -> TimerState {
        TimerState {
            control_a: self.control_a,
            control_b: self.control_b,
            counter: self.counter,
            compare_a: self.compare_a,
            compare_b: self.compare_b,
            prescale_accum: self.prescale_accum,
            interrupt_flags: self.read_flags(),
            interrupt_mask: self.read_mask(),
            cpu_frequency_hz: self.cpu_frequency_hz,
        }
    }

    /// Restore registers without touching interrupt lines
    ///
    /// The CPU frequency is fixed at construction and is not restored.
    fn restore_from_state(&mut self, state: &TimerState) {
        if state.cpu_frequency_hz != self.cpu_frequency_hz {
            log::warn!(
                "Timer8: restoring state saved at {} Hz into a {} Hz timer",
                state.cpu_frequency_hz,
                self.cpu_frequency_hz
            );
        }

        self.control_a = state.control_a;
        self.control_b = state.control_b;
        self.counter = state.counter;
        self.compare_a = state.compare_a;
        self.compare_b = state.compare_b;
        self.update_divider();
        self.prescale_accum = match self.divider {
            Some(divider) => state.prescale_accum.min(divider - 1),
            None => 0,
        };
        self.interrupts.write_flags(state.interrupt_flags);
        self.interrupts.write_mask(state.interrupt_mask);
        self.recompute_if_changed();
    }
}

/// Timer shared between execution contexts
///
/// Every field of the timer depends on the others, so the whole instance
/// sits behind one lock. Ticks and register accesses from different threads
/// are serialized; each call completes all its side effects while holding
/// the lock.
///
/// # Example
///
/// ```
/// use avr_timer8::core::interrupt::IrqLevels;
/// use avr_timer8::core::pin::PinId;
/// use avr_timer8::core::timer::{SharedTimer, Timer8};
///
/// let timer = Timer8::new(8_000_000, PinId::new('B', 1), PinId::new('B', 2), Box::new(IrqLevels::new()));
/// let shared = SharedTimer::new(timer);
///
/// let ticker = shared.clone();
/// std::thread::spawn(move || {
///     ticker.lock().on_tick();
/// })
/// .join()
/// .unwrap();
/// ```
#[derive(Clone)]
pub struct SharedTimer {
    inner: Arc<Mutex<Timer8>>,
}

impl SharedTimer {
    pub fn new(timer: Timer8) -> Self {
        Self {
            inner: Arc::new(Mutex::new(timer)),
        }
    }

    /// Lock the whole timer
    ///
    /// A poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Timer8> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the timer
    pub fn with<R>(&self, f: impl FnOnce(&mut Timer8) -> R) -> R {
        f(&mut self.lock())
    }
}

impl Tickable for SharedTimer {
    fn on_tick(&mut self) {
        self.lock().on_tick();
    }
}
