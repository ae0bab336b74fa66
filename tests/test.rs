/*
 * Filename: /tests/test.rs
 * Project: cheevo-core
 * Created Date: Monday, July 27th 2026, 12:00:00 pm
 * Author: valerino <xoanino@gmail.com>
 * Copyright (c) 2021 valerino
 *
 * MIT License
 *
 * Copyright (c) 2021 valerino
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of
 * this software and associated documentation files (the "Software"), to deal in
 * the Software without restriction, including without limitation the rights to
 * use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies
 * of the Software, and to permit persons to whom the Software is furnished to do
 * so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! End-to-end tests against the public API, covering the reference engine's
//! standard worked examples against RAM = `[00, 12, 34, AB, 56]`.

use std::cell::RefCell;
use std::rc::Rc;

use cheevo_core::{LboardEvent, LogLevelFilter, Runtime, RuntimeConfig, RuntimeEvent, TriggerEvent};

/// Reads packed little-endian bytes from `ram`, returning 0 for any byte
/// outside its bounds — matching a real host's "can't service it" contract.
fn ram_peek(ram: Rc<RefCell<[u8; 5]>>) -> impl FnMut(u32, u8) -> u32 {
    move |addr: u32, n: u8| {
        let r = ram.borrow();
        let mut v = 0u32;
        for i in 0..n {
            let a = (addr + i as u32) as usize;
            let byte = r.get(a).copied().unwrap_or(0);
            v |= (byte as u32) << (8 * i);
        }
        v
    }
}

#[test]
fn condition_true_increments_hit_count_on_first_call() {
    let (trigger, mut pool) = cheevo_core::parse_trigger("0xH0001=18").unwrap();
    let ram = Rc::new(RefCell::new([0x00u8, 0x12, 0x34, 0xAB, 0x56]));
    let mut peek = ram_peek(ram);

    pool.refresh(&mut peek);
    trigger.evaluate(&mut peek);

    assert_eq!(trigger.required.conditions[0].current_hits.get(), 1);
}

#[test]
fn hit_targets_gate_the_trigger_and_count_independently() {
    let (trigger, mut pool) = cheevo_core::parse_trigger("0xH0001=20(2)_0xH0002=52").unwrap();
    let ram = Rc::new(RefCell::new([0x00u8, 0x12, 0x34, 0xAB, 0x56]));
    ram.borrow_mut()[1] = 20;
    let mut peek = ram_peek(ram);

    let mut events = Vec::new();
    for _ in 0..3 {
        pool.refresh(&mut peek);
        events.push(trigger.evaluate(&mut peek));
    }

    assert_eq!(events[1], Some(TriggerEvent::Triggered));
    assert_eq!(trigger.required.conditions[1].current_hits.get(), 3);
}

#[test]
fn add_source_combines_with_the_next_terminal() {
    let (trigger, mut pool) = cheevo_core::parse_trigger("A:0xH0001_0xH0002=22").unwrap();
    let ram = Rc::new(RefCell::new([0x00u8, 0x12, 0x34, 0xAB, 0x56]));
    let mut peek = ram_peek(ram.clone());

    pool.refresh(&mut peek);
    assert!(!trigger.frame_truth(&mut peek));

    ram.borrow_mut()[2] = 4;
    pool.refresh(&mut peek);
    assert!(trigger.frame_truth(&mut peek));
}

#[test]
fn pause_if_latches_and_suppresses_reset_observation() {
    let (trigger, mut pool) = cheevo_core::parse_trigger("0xH0001=18_P:0xH0002=52.1.").unwrap();
    let ram = Rc::new(RefCell::new([0x00u8, 0x12, 0x34, 0xAB, 0x56]));
    let mut peek = ram_peek(ram.clone());

    pool.refresh(&mut peek);
    trigger.evaluate(&mut peek); // Waiting -> Active
    pool.refresh(&mut peek);
    trigger.evaluate(&mut peek); // the pause's hit-target latches true -> Paused
    assert_eq!(trigger.state(), cheevo_core::TriggerState::Paused);

    ram.borrow_mut()[2] = 0;
    pool.refresh(&mut peek);
    trigger.evaluate(&mut peek);
    assert_eq!(trigger.state(), cheevo_core::TriggerState::Paused);
}

#[test]
fn add_address_only_affects_the_following_condition() {
    let (trigger, mut pool) = cheevo_core::parse_trigger("I:0xH0000_0xH0002=22").unwrap();
    let ram = Rc::new(RefCell::new([0x01u8, 0x12, 0x34, 0xAB, 0x56]));
    let mut peek = ram_peek(ram.clone());

    ram.borrow_mut()[3] = 22;
    pool.refresh(&mut peek);
    assert!(trigger.frame_truth(&mut peek));

    ram.borrow_mut()[0] = 2;
    ram.borrow_mut()[4] = 22;
    pool.refresh(&mut peek);
    assert!(trigger.frame_truth(&mut peek));

    ram.borrow_mut()[0] = 100;
    pool.refresh(&mut peek);
    assert!(!trigger.frame_truth(&mut peek));
}

#[test]
fn leaderboard_starts_once_then_triggers_without_a_repeat_start() {
    let (lboard, mut pool) =
        cheevo_core::parse_leaderboard("STA:0xH00=1::CAN:0xH00=2::SUB:0xH00=3::VAL:0xH02").unwrap();
    let ram = Rc::new(RefCell::new([0x00u8, 0x00, 0x34, 0x00, 0x00]));
    let mut peek = ram_peek(ram.clone());

    ram.borrow_mut()[0] = 1;
    pool.refresh(&mut peek);
    let started = lboard.evaluate(&mut peek);
    assert_eq!(started, Some(LboardEvent::Started(cheevo_core::TypedValue::Int(0x34))));

    ram.borrow_mut()[0] = 3;
    pool.refresh(&mut peek);
    let triggered = lboard.evaluate(&mut peek);
    assert_eq!(triggered, Some(LboardEvent::Triggered(cheevo_core::TypedValue::Int(0x34))));

    pool.refresh(&mut peek);
    assert_eq!(lboard.evaluate(&mut peek), None);
}

#[test]
fn richpresence_lookup_renders_per_ram_value() {
    let (rp, mut pool) = cheevo_core::parse_richpresence("Lookup:L\n0=Zero\n1=One\n\nDisplay:\nAt @L(0xH0000)").unwrap();
    let ram = Rc::new(RefCell::new([0u8, 0, 0, 0, 0]));
    let mut peek = ram_peek(ram.clone());

    pool.refresh(&mut peek);
    assert_eq!(rp.evaluate(&mut peek), "At Zero");

    ram.borrow_mut()[0] = 1;
    pool.refresh(&mut peek);
    assert_eq!(rp.evaluate(&mut peek), "At One");

    ram.borrow_mut()[0] = 2;
    pool.refresh(&mut peek);
    assert_eq!(rp.evaluate(&mut peek), "At ");
}

#[test]
fn runtime_facade_drives_achievement_leaderboard_and_richpresence_together() {
    let mut rt = Runtime::new(RuntimeConfig {
        hostname_override: None,
        hardcore: false,
        log_level: LogLevelFilter::Verbose,
    });

    rt.activate_achievement(100, "0xH0001=18").unwrap();
    rt.activate_lboard(7, "STA:0xH00=1::CAN:0xH00=2::SUB:0xH00=3::VAL:0xH02").unwrap();
    rt.activate_richpresence("Display:\nAt @L(0xH0000)").unwrap();

    let ram = Rc::new(RefCell::new([0x00u8, 0x00, 0x34, 0xAB, 0x56]));
    let mut peek = ram_peek(ram.clone());

    let mut events = Vec::new();
    rt.do_frame(&mut peek, |e| events.push(e));
    assert!(events.contains(&RuntimeEvent::Achievement(100, TriggerEvent::Activated)));

    ram.borrow_mut()[1] = 18;
    events.clear();
    rt.do_frame(&mut peek, |e| events.push(e));
    assert!(events.contains(&RuntimeEvent::Achievement(100, TriggerEvent::Triggered)));

    ram.borrow_mut()[0] = 1;
    events.clear();
    rt.do_frame(&mut peek, |e| events.push(e));
    assert!(events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::Leaderboard(7, LboardEvent::Started(_)))));
}

#[test]
fn persisted_progress_restores_hit_counts_after_reactivation() {
    let source = "0xH0001=18(3)";
    let ram = Rc::new(RefCell::new([0x00u8, 0x12, 0x34, 0xAB, 0x56]));
    let mut peek = ram_peek(ram);

    let mut rt = Runtime::new(RuntimeConfig::default());
    rt.activate_achievement(1, source).unwrap();
    rt.do_frame(&mut peek, |_| {});
    rt.do_frame(&mut peek, |_| {});
    let saved = rt.serialize_progress();
    assert!(!saved.is_empty());

    let mut rt2 = Runtime::new(RuntimeConfig::default());
    rt2.activate_achievement(1, source).unwrap();
    rt2.deserialize_progress(&saved);

    // restoring a snapshot from a different source is tolerated, not fatal.
    rt2.deserialize_progress(&[0xFFu8; 4]);
    rt2.do_frame(&mut peek, |_event| {});
}
