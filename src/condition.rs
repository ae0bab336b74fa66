/*
 * Filename: /src/condition.rs
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

//! A single condition: two operands, a comparison, a type tag and a hit
//! counter.

use std::cell::Cell;

use crate::operand::{Operand, TypedValue};

/// Comparison/arithmetic operator carried by a condition. The arithmetic
/// variants (`Mult`..`Sub`) only ever appear on modifier conditions, where
/// they combine the left operand with the right before the result feeds a
/// source/logic accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    None,
    Mult,
    Div,
    And,
    Or,
    Xor,
    Mod,
    Add,
    Sub,
}

impl Operator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Ne
                | Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge
        )
    }

    /// Applies a comparison operator. `None` degenerates to "left is
    /// non-zero", matching a bare-operand condition with no explicit
    /// comparison.
    pub fn compare(self, left: TypedValue, right: TypedValue) -> bool {
        let (l, r) = (left.as_f64(), right.as_f64());
        match self {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::Lt => l < r,
            Operator::Le => l <= r,
            Operator::Gt => l > r,
            Operator::Ge => l >= r,
            Operator::None => left.is_nonzero(),
            _ => l != 0.0,
        }
    }

    /// Applies an arithmetic operator used when a modifier combines its
    /// operand with a right-hand operand before contributing to an
    /// accumulator (e.g. `A:0xH00*4`).
    pub fn apply_arith(self, left: TypedValue, right: TypedValue) -> TypedValue {
        match self {
            Operator::Mult => {
                if let (TypedValue::Int(a), TypedValue::Int(b)) = (left, right) {
                    TypedValue::Int(a.wrapping_mul(b))
                } else {
                    TypedValue::Float(left.as_f64() * right.as_f64())
                }
            }
            Operator::Div => {
                let d = right.as_f64();
                if d == 0.0 {
                    TypedValue::Int(0)
                } else if let (TypedValue::Int(a), TypedValue::Int(b)) = (left, right) {
                    TypedValue::Int(a.wrapping_div(b))
                } else {
                    TypedValue::Float(left.as_f64() / d)
                }
            }
            Operator::And => TypedValue::Int(left.as_u32() as i64 & right.as_u32() as i64),
            Operator::Or => TypedValue::Int(left.as_u32() as i64 | right.as_u32() as i64),
            Operator::Xor => TypedValue::Int((left.as_u32() ^ right.as_u32()) as i64),
            Operator::Mod => {
                let b = right.as_u32();
                if b == 0 {
                    TypedValue::Int(0)
                } else {
                    TypedValue::Int((left.as_u32() % b) as i64)
                }
            }
            Operator::Add => left.add(right),
            Operator::Sub => left.sub(right),
            _ => left,
        }
    }
}

/// The role a condition plays in a [`crate::condset::CondSet`] walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    Standard,
    PauseIf,
    ResetIf,
    MeasuredIf,
    Trigger,
    Measured,
    AddSource,
    SubSource,
    AddAddress,
    Remember,
    AddHits,
    SubHits,
    ResetNextIf,
    AndNext,
    OrNext,
}

impl ConditionType {
    /// The six types that start a fresh evaluation of the combining stack
    /// and own a hit counter.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConditionType::Standard
                | ConditionType::PauseIf
                | ConditionType::ResetIf
                | ConditionType::MeasuredIf
                | ConditionType::Trigger
                | ConditionType::Measured
        )
    }

    /// `AddSource`, `SubSource`, `AddAddress`, `Remember`: feed the next
    /// terminal's left operand, contribute no boolean of their own.
    pub fn is_value_modifier(self) -> bool {
        matches!(
            self,
            ConditionType::AddSource
                | ConditionType::SubSource
                | ConditionType::AddAddress
                | ConditionType::Remember
        )
    }

    /// `AddHits`/`SubHits`: fold their own comparison into a pooled hit
    /// increment for the next terminal.
    pub fn is_hit_modifier(self) -> bool {
        matches!(self, ConditionType::AddHits | ConditionType::SubHits)
    }

    /// `AndNext`/`OrNext`/`ResetNextIf`: fold their own comparison into the
    /// logic-combination state carried to subsequent conditions.
    pub fn is_logic_modifier(self) -> bool {
        matches!(
            self,
            ConditionType::AndNext | ConditionType::OrNext | ConditionType::ResetNextIf
        )
    }
}

/// One comparison plus its type tag, required hit target and live hit
/// counter. Interior mutability on the counter lets a condition live inside
/// an immutable, shareable compiled tree.
#[derive(Debug, Clone)]
pub struct Condition {
    pub operand1: Operand,
    pub operator: Operator,
    pub operand2: Option<Operand>,
    pub kind: ConditionType,
    pub required_hits: u32,
    pub current_hits: Cell<u32>,
}

impl Condition {
    pub fn new(
        operand1: Operand,
        operator: Operator,
        operand2: Option<Operand>,
        kind: ConditionType,
        required_hits: u32,
    ) -> Self {
        Condition {
            operand1,
            operator,
            operand2,
            kind,
            required_hits,
            current_hits: Cell::new(0),
        }
    }

    pub fn reset_hits(&self) {
        self.current_hits.set(0);
    }

    /// `Standard`/`Trigger` contribution rule, reused for any terminal:
    /// true once the target is met, or immediately (every frame) when there
    /// is no target.
    pub fn target_met(&self, truth_this_frame: bool) -> bool {
        if self.required_hits == 0 {
            truth_this_frame
        } else {
            self.current_hits.get() >= self.required_hits
        }
    }
}
