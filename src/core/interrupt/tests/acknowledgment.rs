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

//! Interrupt acknowledgment tests
//!
//! Software acknowledges by writing the flag register, which replaces
//! its contents.

use super::*;

#[test]
fn test_write_zero_clears_all_flags() {
    let (mut ic, levels) = controller();

    ic.write_mask(0x07);
    for line in TimerIrq::ALL {
        ic.raise(line);
    }
    assert_eq!(ic.read_flags(), 0x07);

    ic.write_flags(0x00);

    assert_eq!(ic.read_flags(), 0);
    // Lines stay under the collaborator's control
    for line in TimerIrq::ALL {
        assert!(levels.level(line));
    }
}

#[test]
fn test_write_replaces_rather_than_clears() {
    let (mut ic, _levels) = controller();

    ic.raise(TimerIrq::Overflow);
    ic.raise(TimerIrq::CompareA);

    // Writing 1 to a bit keeps (or sets) it; it does not clear it
    ic.write_flags(InterruptFlags::COMPARE_A.bits() | InterruptFlags::COMPARE_B.bits());

    assert_eq!(ic.read_flags(), 0x06);
}

#[test]
fn test_write_flags_truncates_unused_bits() {
    let (mut ic, _levels) = controller();

    ic.write_flags(0xF9);
    assert_eq!(ic.read_flags(), 0x01);
}

#[test]
fn test_reset_lowers_lines() {
    let (mut ic, levels) = controller();

    ic.write_mask(0x07);
    ic.raise(TimerIrq::CompareA);
    assert!(levels.level(TimerIrq::CompareA));

    ic.reset();

    assert_eq!(ic.read_flags(), 0);
    assert_eq!(ic.read_mask(), 0);
    assert!(!levels.level(TimerIrq::CompareA));

    // Reset is safe to repeat
    ic.reset();
    assert_eq!(ic.read_flags(), 0);
}
