/*
 * Filename: /src/trigger.rs
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

//! The top-level trigger state machine: one required condition set plus
//! zero or more alternates.

use std::cell::Cell;

use crate::condset::CondSet;
use crate::memref::Peek;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Inactive,
    Waiting,
    Active,
    Paused,
    Reset,
    Triggered,
    Disabled,
}

/// One required condset AND-ed with at least one of zero-or-more alternates.
/// An empty alternate list means "no alternates required".
#[derive(Debug)]
pub struct Trigger {
    pub required: CondSet,
    pub alternates: Vec<CondSet>,
    state: Cell<TriggerState>,
    pub measured_value: Cell<u32>,
    pub measured_target: Cell<u32>,
    /// Side-flag: true this frame iff the trigger's logic, ignoring any
    /// `Trigger`-typed conditions, would already be satisfied. Surfaced as
    /// an event rather than a first-class state (see reference design
    /// notes: older serialised state only knows the states above).
    pub primed: Cell<bool>,
}

/// An event the runtime façade should deliver to the host for a single
/// trigger this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Activated,
    Paused,
    Reset,
    Primed,
    Triggered,
    Disabled,
}

impl Trigger {
    pub fn new(required: CondSet, alternates: Vec<CondSet>) -> Self {
        Trigger {
            required,
            alternates,
            state: Cell::new(TriggerState::Waiting),
            measured_value: Cell::new(0),
            measured_target: Cell::new(0),
            primed: Cell::new(false),
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state.get()
    }

    pub fn disable(&self) {
        self.state.set(TriggerState::Disabled);
    }

    pub fn enable(&self) {
        if self.state.get() == TriggerState::Disabled {
            self.state.set(TriggerState::Waiting);
        }
    }

    /// Clears every condition's hit counter across the required set and
    /// every alternate.
    pub fn reset_hits(&self) {
        self.required.reset();
        for alt in &self.alternates {
            alt.reset();
        }
    }

    fn any_hits(&self) -> bool {
        self.required
            .conditions
            .iter()
            .chain(self.alternates.iter().flat_map(|a| a.conditions.iter()))
            .any(|c| c.current_hits.get() > 0)
    }

    /// Evaluates this frame's truth without touching the activation state
    /// machine: the required set AND (any alternate OR no alternates),
    /// ignoring a reset. Used by consumers (e.g. a leaderboard's start/
    /// cancel/submit triggers) that only care about the boolean result and
    /// must still run every frame to preserve delta-memref semantics.
    pub fn frame_truth<P: Peek + ?Sized>(&self, peek: &mut P) -> bool {
        let req = self.required.evaluate(peek);
        let alt_satisfied = if self.alternates.is_empty() {
            true
        } else {
            self.alternates
                .iter()
                .map(|a| a.evaluate(peek).satisfied)
                .fold(false, |acc, s| acc || s)
        };
        req.satisfied && alt_satisfied && !req.was_reset
    }

    /// Evaluates the required set and every alternate, advances the state
    /// machine, and returns the event (if any) the host should be told
    /// about.
    pub fn evaluate<P: Peek + ?Sized>(&self, peek: &mut P) -> Option<TriggerEvent> {
        if self.state.get() == TriggerState::Disabled {
            return None;
        }

        let req = self.required.evaluate(peek);
        let alt_outcomes: Vec<_> = self.alternates.iter().map(|a| a.evaluate(peek)).collect();

        let (alt_satisfied, alt_primed) = if alt_outcomes.is_empty() {
            (true, true)
        } else {
            let any_sat = alt_outcomes.iter().any(|o| o.satisfied);
            let any_primed = alt_outcomes.iter().any(|o| o.satisfied_ignoring_trigger);
            (any_sat, any_primed)
        };

        let was_reset = req.was_reset;
        let was_paused = req.was_paused;

        let alt_measured_max = alt_outcomes.iter().map(|o| o.measured_value).max().unwrap_or(0);
        self.measured_value.set(req.measured_value.max(alt_measured_max));
        self.measured_target.set(req.measured_target);

        let truth = req.satisfied && alt_satisfied && !was_reset;
        let primed_now = req.satisfied_ignoring_trigger && alt_primed && !was_reset && !was_paused;
        self.primed.set(primed_now && !truth);

        let had_hits = self.any_hits();

        let event = match self.state.get() {
            TriggerState::Waiting => {
                // suppress a trigger that's already true the first frame it
                // becomes active, so a pre-satisfied condition doesn't fire
                // spuriously on load.
                if truth {
                    None
                } else {
                    self.state.set(TriggerState::Active);
                    Some(TriggerEvent::Activated)
                }
            }
            TriggerState::Active | TriggerState::Paused => {
                if was_paused {
                    if self.state.get() != TriggerState::Paused {
                        self.state.set(TriggerState::Paused);
                        Some(TriggerEvent::Paused)
                    } else {
                        None
                    }
                } else if was_reset {
                    self.state.set(TriggerState::Active);
                    if had_hits {
                        Some(TriggerEvent::Reset)
                    } else {
                        None
                    }
                } else if truth {
                    self.state.set(TriggerState::Triggered);
                    Some(TriggerEvent::Triggered)
                } else {
                    if self.state.get() == TriggerState::Paused {
                        self.state.set(TriggerState::Active);
                    }
                    if self.primed.get() {
                        Some(TriggerEvent::Primed)
                    } else {
                        None
                    }
                }
            }
            TriggerState::Triggered => None,
            TriggerState::Inactive | TriggerState::Reset | TriggerState::Disabled => None,
        };

        event
    }

    /// Moves a `Triggered` trigger back to `Waiting` so it can fire again.
    pub fn acknowledge_reset(&self) {
        self.reset_hits();
        self.state.set(TriggerState::Waiting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionType, Operator};
    use crate::memref::{MemRefPool, MemSize};
    use crate::operand::Operand;

    #[test]
    fn trigger_fires_once_required_condition_is_true() {
        let mut pool = MemRefPool::new();
        let mref = pool.intern(1, 1);
        let cond = Condition::new(
            Operand::Address(mref, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(20)),
            ConditionType::Standard,
            2,
        );
        let required = CondSet::new(vec![cond]);
        let trigger = Trigger::new(required, vec![]);

        let ram = std::cell::RefCell::new([0x00u8, 20, 0x00, 0x00, 0x00]);
        let mut peek = |addr: u32, n: u8| {
            let r = ram.borrow();
            let mut v = 0u32;
            for i in 0..n {
                v |= (r[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };

        pool.refresh(&mut peek);
        let e1 = trigger.evaluate(&mut peek); // first call: waiting -> active (suppressed)
        assert_eq!(e1, Some(TriggerEvent::Activated));
        assert_eq!(trigger.state(), TriggerState::Active);

        pool.refresh(&mut peek);
        let e2 = trigger.evaluate(&mut peek);
        assert_eq!(e2, None); // hits = 1, not yet 2

        pool.refresh(&mut peek);
        let e3 = trigger.evaluate(&mut peek);
        assert_eq!(e3, Some(TriggerEvent::Triggered));
        assert_eq!(trigger.state(), TriggerState::Triggered);
    }
}
