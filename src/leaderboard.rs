/*
 * Filename: /src/leaderboard.rs
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

//! Leaderboards: a start/cancel/submit trigger triad gating a submitted
//! [`Value`], with an optional separately-tracked progress value.

use std::cell::Cell;

use crate::memref::Peek;
use crate::operand::TypedValue;
use crate::trigger::Trigger;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LboardState {
    Inactive,
    Waiting,
    Active,
    Started,
    Canceled,
    Triggered,
    Disabled,
}

/// An event the runtime façade should deliver to the host for a leaderboard
/// this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LboardEvent {
    Started(TypedValue),
    Updated(TypedValue),
    Canceled,
    Triggered(TypedValue),
}

#[derive(Debug)]
pub struct Leaderboard {
    pub start: Trigger,
    pub cancel: Trigger,
    pub submit: Trigger,
    pub value: Value,
    pub progress: Option<Value>,
    state: Cell<LboardState>,
    /// True once this attempt has already submitted or been canceled, to
    /// suppress repeat notifications until `start` goes false again.
    settled: Cell<bool>,
    last_value: Cell<TypedValue>,
}

impl Leaderboard {
    pub fn new(start: Trigger, cancel: Trigger, submit: Trigger, value: Value, progress: Option<Value>) -> Self {
        Leaderboard {
            start,
            cancel,
            submit,
            value,
            progress,
            state: Cell::new(LboardState::Waiting),
            settled: Cell::new(false),
            last_value: Cell::new(TypedValue::zero()),
        }
    }

    pub fn state(&self) -> LboardState {
        self.state.get()
    }

    pub fn disable(&self) {
        self.state.set(LboardState::Disabled);
    }

    pub fn enable(&self) {
        if self.state.get() == LboardState::Disabled {
            self.state.set(LboardState::Waiting);
        }
    }

    /// The value most recently reported while `Started` (or `Triggered`'s
    /// final value); used for progress display once a leaderboard is active.
    pub fn progress_value<P: Peek + ?Sized>(&self, peek: &mut P) -> TypedValue {
        match &self.progress {
            Some(v) => v.resolve(peek),
            None => self.value.resolve(peek),
        }
    }

    /// Evaluates start/cancel/submit (every frame, regardless of state, so
    /// their memrefs keep tracking deltas correctly) and advances the
    /// attempt state machine.
    pub fn evaluate<P: Peek + ?Sized>(&self, peek: &mut P) -> Option<LboardEvent> {
        if matches!(self.state.get(), LboardState::Inactive | LboardState::Disabled) {
            return None;
        }

        let start_ok = self.start.frame_truth(peek);
        let cancel_ok = self.cancel.frame_truth(peek);
        let submit_ok = self.submit.frame_truth(peek);

        let value = self.value.resolve(peek);
        let previous_value = self.last_value.replace(value);

        if self.settled.get() {
            if !start_ok {
                self.settled.set(false);
                self.state.set(LboardState::Waiting);
            }
            return None;
        }

        match self.state.get() {
            LboardState::Waiting | LboardState::Active => {
                if start_ok && !cancel_ok {
                    if submit_ok {
                        self.settled.set(true);
                        self.state.set(LboardState::Triggered);
                        Some(LboardEvent::Triggered(value))
                    } else {
                        self.state.set(LboardState::Started);
                        Some(LboardEvent::Started(value))
                    }
                } else {
                    self.state.set(LboardState::Active);
                    None
                }
            }
            LboardState::Started => {
                if cancel_ok {
                    self.settled.set(true);
                    self.state.set(LboardState::Canceled);
                    Some(LboardEvent::Canceled)
                } else if submit_ok {
                    self.settled.set(true);
                    self.state.set(LboardState::Triggered);
                    Some(LboardEvent::Triggered(value))
                } else if value != previous_value {
                    Some(LboardEvent::Updated(value))
                } else {
                    None
                }
            }
            LboardState::Canceled | LboardState::Triggered => {
                if !start_ok {
                    self.state.set(LboardState::Active);
                }
                None
            }
            LboardState::Inactive | LboardState::Disabled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionType, Operator};
    use crate::condset::CondSet;
    use crate::memref::{MemRefPool, MemSize};
    use crate::operand::Operand;

    fn const_trigger(truth: bool) -> Trigger {
        let cond = Condition::new(
            Operand::ConstInt(if truth { 1 } else { 0 }),
            Operator::None,
            None,
            ConditionType::Standard,
            0,
        );
        Trigger::new(CondSet::new(vec![cond]), vec![])
    }

    #[test]
    fn starts_then_submits_on_demand() {
        let mut pool = MemRefPool::new();
        let mref = pool.intern(0, 1);
        let submit_cond = Condition::new(
            Operand::Address(mref, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(1)),
            ConditionType::Standard,
            0,
        );
        let submit = Trigger::new(CondSet::new(vec![submit_cond]), vec![]);

        let value_cond = Condition::new(Operand::ConstInt(100), Operator::None, None, ConditionType::Measured, 0);
        let value = Value::ConditionDriven(CondSet::new(vec![value_cond]));

        let board = Leaderboard::new(const_trigger(true), const_trigger(false), submit, value, None);

        let ram = std::cell::RefCell::new([0u8; 5]);
        let mut peek = |addr: u32, n: u8| {
            let r = ram.borrow();
            let mut v = 0u32;
            for i in 0..n {
                v |= (r[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };

        pool.refresh(&mut peek);
        let e1 = board.evaluate(&mut peek);
        assert_eq!(e1, Some(LboardEvent::Started(TypedValue::Int(100))));
        assert_eq!(board.state(), LboardState::Started);

        ram.borrow_mut()[0] = 1;
        pool.refresh(&mut peek);
        let e2 = board.evaluate(&mut peek);
        assert_eq!(e2, Some(LboardEvent::Triggered(TypedValue::Int(100))));
        assert_eq!(board.state(), LboardState::Triggered);
    }
}
