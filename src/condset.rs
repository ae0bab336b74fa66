/*
 * Filename: /src/condset.rs
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

//! The condition-set evaluator: a single forward walk over a condition
//! list that maintains the combining-modifier accumulator stack and each
//! condition's hit counter.

use crate::condition::{Condition, ConditionType, Operator};
use crate::memref::Peek;
use crate::operand::TypedValue;

/// An ordered list of conditions evaluated together each frame.
#[derive(Debug, Clone, Default)]
pub struct CondSet {
    pub conditions: Vec<Condition>,
}

impl CondSet {
    pub fn new(conditions: Vec<Condition>) -> Self {
        CondSet { conditions }
    }

    pub fn reset(&self) {
        for c in &self.conditions {
            c.reset_hits();
        }
    }

    pub fn has_pause(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == ConditionType::PauseIf)
    }
}

/// Running accumulators for one forward pass over a [`CondSet`]. Kept as a
/// plain struct rather than threaded through recursion, per the reference
/// design's preferred shape.
#[derive(Default)]
struct Walk {
    add_value: TypedValue,
    add_address: Option<i64>,
    and_next: Option<bool>,
    or_next: Option<bool>,
    reset_next: bool,
    add_hits: i64,
    recall: TypedValue,
}

/// Result of one [`CondSet::evaluate`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CondSetOutcome {
    /// The real gating truth: AND of every `Standard` and `Trigger` typed
    /// condition's contribution.
    pub satisfied: bool,
    /// Same, but ignoring `Trigger`-typed conditions entirely — used to
    /// compute a containing [`crate::trigger::Trigger`]'s `Primed` side-state.
    pub satisfied_ignoring_trigger: bool,
    pub was_paused: bool,
    pub was_reset: bool,
    pub has_measured: bool,
    pub measured_value: u32,
    pub measured_target: u32,
}

impl CondSet {
    /// Walks every condition once, honoring pause/reset short-circuiting,
    /// and returns this frame's outcome. `peek` services any live
    /// (`AddAddress`-indirected) reads.
    pub fn evaluate<P: Peek + ?Sized>(&self, peek: &mut P) -> CondSetOutcome {
        let mut walk = Walk::default();
        let mut result = true;
        let mut ignoring_trigger = true;
        let mut has_measured = false;
        let mut measured_value = TypedValue::zero();
        let mut measured_target: u32 = 0;
        let mut measured_if_false = false;

        for c in &self.conditions {
            let this_add_address = walk.add_address.take();

            if c.kind.is_value_modifier() {
                let left_raw = c.operand1.resolve(this_add_address, peek, walk.recall);
                let left = if c.operator.is_comparison() || c.operator == Operator::None {
                    left_raw
                } else if let Some(rhs) = &c.operand2 {
                    let right = rhs.resolve(this_add_address, peek, walk.recall);
                    c.operator.apply_arith(left_raw, right)
                } else {
                    left_raw
                };
                match c.kind {
                    ConditionType::AddSource => walk.add_value = walk.add_value.add(left),
                    ConditionType::SubSource => walk.add_value = walk.add_value.sub(left),
                    ConditionType::AddAddress => walk.add_address = Some(left.as_u32() as i64),
                    ConditionType::Remember => walk.recall = left,
                    _ => unreachable!(),
                }
                continue;
            }

            let left_raw = c.operand1.resolve(this_add_address, peek, walk.recall);
            let right = c
                .operand2
                .as_ref()
                .map(|op| op.resolve(this_add_address, peek, walk.recall))
                .unwrap_or(TypedValue::zero());

            let left = if c.kind.is_terminal() {
                left_raw.add(walk.add_value)
            } else {
                left_raw
            };

            let raw_true = c.operator.compare(left, right);

            let mut truth = raw_true;
            if let Some(and_v) = walk.and_next.take() {
                truth = truth && and_v;
            }
            if let Some(or_v) = walk.or_next.take() {
                truth = truth || or_v;
            }

            if !c.kind.is_terminal() {
                match c.kind {
                    ConditionType::AddHits => walk.add_hits += if truth { 1 } else { 0 },
                    ConditionType::SubHits => walk.add_hits -= if truth { 1 } else { 0 },
                    ConditionType::AndNext => walk.and_next = Some(truth),
                    ConditionType::OrNext => walk.or_next = Some(truth),
                    ConditionType::ResetNextIf => {
                        if truth {
                            walk.reset_next = true;
                        }
                    }
                    _ => unreachable!(),
                }
                continue;
            }

            // terminal: consumes add_value, reset_next and add_hits.
            walk.add_value = TypedValue::zero();

            if walk.reset_next {
                c.reset_hits();
                walk.reset_next = false;
            }

            let raw_increment = (if truth { 1 } else { 0 }) + walk.add_hits;
            walk.add_hits = 0;
            let increment = raw_increment.max(0) as u32;
            if c.required_hits == 0 {
                c.current_hits.set(c.current_hits.get().saturating_add(increment));
            } else if c.current_hits.get() < c.required_hits {
                c.current_hits
                    .set((c.current_hits.get() + increment).min(c.required_hits));
            }

            let contributes = c.target_met(truth);

            match c.kind {
                ConditionType::Standard => {
                    result &= contributes;
                    ignoring_trigger &= contributes;
                }
                ConditionType::Trigger => {
                    result &= contributes;
                }
                ConditionType::PauseIf => {
                    if contributes {
                        return CondSetOutcome {
                            satisfied: false,
                            satisfied_ignoring_trigger: false,
                            was_paused: true,
                            was_reset: false,
                            has_measured: false,
                            measured_value: 0,
                            measured_target: 0,
                        };
                    }
                }
                ConditionType::ResetIf => {
                    if contributes {
                        for other in &self.conditions {
                            if other.kind != ConditionType::PauseIf {
                                other.reset_hits();
                            }
                        }
                        return CondSetOutcome {
                            satisfied: false,
                            satisfied_ignoring_trigger: false,
                            was_paused: false,
                            was_reset: true,
                            has_measured: false,
                            measured_value: 0,
                            measured_target: 0,
                        };
                    }
                }
                ConditionType::MeasuredIf => {
                    if !contributes {
                        measured_if_false = true;
                    }
                }
                ConditionType::Measured => {
                    has_measured = true;
                    measured_value = if c.operator == Operator::None {
                        left
                    } else {
                        TypedValue::Int(c.current_hits.get() as i64)
                    };
                    measured_target = c.required_hits;
                }
                _ => unreachable!(),
            }
        }

        if measured_if_false {
            measured_value = TypedValue::zero();
        }

        CondSetOutcome {
            satisfied: result,
            satisfied_ignoring_trigger: ignoring_trigger,
            was_paused: false,
            was_reset: false,
            has_measured,
            measured_value: measured_value.as_u32(),
            measured_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memref::{MemRefPool, MemSize};
    use crate::operand::Operand;

    fn ram_peek(ram: &'static std::cell::RefCell<[u8; 5]>) -> impl FnMut(u32, u8) -> u32 + 'static {
        move |addr: u32, n: u8| {
            let r = ram.borrow();
            let mut v = 0u32;
            for i in 0..n {
                v |= (r[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        }
    }

    #[test]
    fn standard_condition_counts_hits() {
        let mut pool = MemRefPool::new();
        let mref = pool.intern(1, 1);
        let cond = Condition::new(
            Operand::Address(mref, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(0x18)),
            ConditionType::Standard,
            0,
        );
        let set = CondSet::new(vec![cond]);

        let ram = [0x00u8, 0x18, 0x00, 0x00, 0x00];
        let mut peek = |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };
        pool.refresh(&mut peek);
        let outcome = set.evaluate(&mut peek);
        assert!(outcome.satisfied);
        assert_eq!(set.conditions[0].current_hits.get(), 1);
    }

    #[test]
    fn add_source_feeds_next_terminal() {
        let mut pool = MemRefPool::new();
        let src = pool.intern(1, 1);
        let cmp = pool.intern(2, 1);
        let add_source = Condition::new(
            Operand::Address(src, MemSize::U8),
            Operator::None,
            None,
            ConditionType::AddSource,
            0,
        );
        let terminal = Condition::new(
            Operand::Address(cmp, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(22)),
            ConditionType::Standard,
            0,
        );
        let set = CondSet::new(vec![add_source, terminal]);

        let ram = std::cell::RefCell::new([0x00u8, 0x12, 0x00, 0xAB, 0x56]);
        {
            let mut peek = |addr: u32, n: u8| {
                let r = ram.borrow();
                let mut v = 0u32;
                for i in 0..n {
                    v |= (r[(addr + i as u32) as usize] as u32) << (8 * i);
                }
                v
            };
            pool.refresh(&mut peek);
            assert!(!set.evaluate(&mut peek).satisfied);
        }
        ram.borrow_mut()[2] = 4;
        {
            let mut peek = |addr: u32, n: u8| {
                let r = ram.borrow();
                let mut v = 0u32;
                for i in 0..n {
                    v |= (r[(addr + i as u32) as usize] as u32) << (8 * i);
                }
                v
            };
            pool.refresh(&mut peek);
            assert!(set.evaluate(&mut peek).satisfied);
        }
    }

    #[test]
    fn pause_if_short_circuits_and_suppresses_hits() {
        let mut pool = MemRefPool::new();
        let a = pool.intern(1, 1);
        let b = pool.intern(2, 1);
        let standard = Condition::new(
            Operand::Address(a, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(0x18)),
            ConditionType::Standard,
            0,
        );
        let pause = Condition::new(
            Operand::Address(b, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(0x34)),
            ConditionType::PauseIf,
            1,
        );
        let set = CondSet::new(vec![pause, standard]);

        let ram = [0x00u8, 0x18, 0x34, 0x00, 0x00];
        let mut peek = |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };
        pool.refresh(&mut peek);
        let outcome = set.evaluate(&mut peek);
        assert!(outcome.was_paused);
        assert_eq!(set.conditions[1].current_hits.get(), 0);
    }
}
