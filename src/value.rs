/*
 * Filename: /src/value.rs
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

//! A measurable numeric quantity: either a condition set with a `Measured`
//! condition, or a legacy maximum-of-sums formula.

use crate::condition::Operator;
use crate::condset::CondSet;
use crate::memref::Peek;
use crate::operand::{Operand, TypedValue};

/// One term of a sum: an operand, optionally combined with a second operand
/// through a multiply/divide/mask operator (e.g. `0xH00*4`).
#[derive(Debug, Clone)]
pub struct Term {
    pub operand: Operand,
    pub modifier: Option<(Operator, Operand)>,
}

impl Term {
    pub fn new(operand: Operand) -> Self {
        Term {
            operand,
            modifier: None,
        }
    }

    pub fn with_modifier(operand: Operand, op: Operator, rhs: Operand) -> Self {
        Term {
            operand,
            modifier: Some((op, rhs)),
        }
    }

    fn resolve<P: Peek + ?Sized>(&self, peek: &mut P) -> TypedValue {
        let base = self.operand.resolve(None, peek, TypedValue::zero());
        match &self.modifier {
            Some((op, rhs)) => {
                let rhs_value = rhs.resolve(None, peek, TypedValue::zero());
                op.apply_arith(base, rhs_value)
            }
            None => base,
        }
    }
}

/// A `_`-joined sum of [`Term`]s: one `$`-separated sub-expression of a
/// legacy formula.
#[derive(Debug, Clone, Default)]
pub struct SumOfProducts(pub Vec<Term>);

impl SumOfProducts {
    fn resolve<P: Peek + ?Sized>(&self, peek: &mut P) -> TypedValue {
        self.0
            .iter()
            .fold(TypedValue::zero(), |acc, term| acc.add(term.resolve(peek)))
    }
}

/// Either a condition-driven measurement or a legacy maximum-of-sums
/// formula value.
#[derive(Debug, Clone)]
pub enum Value {
    ConditionDriven(CondSet),
    Expression(Vec<SumOfProducts>),
}

impl Value {
    /// Resolves this value for the current frame. For `ConditionDriven`,
    /// reuses the condset's own `Measured` accounting (plain resolved value
    /// vs. hit count, decided by whether the condition carries a comparison
    /// operator) rather than re-deriving it here.
    pub fn resolve<P: Peek + ?Sized>(&self, peek: &mut P) -> TypedValue {
        match self {
            Value::ConditionDriven(set) => {
                let outcome = set.evaluate(peek);
                TypedValue::Int(outcome.measured_value as i64)
            }
            Value::Expression(sums) => sums
                .iter()
                .map(|s| s.resolve(peek))
                .fold(None, |best: Option<TypedValue>, v| match best {
                    Some(b) if b.as_f64() >= v.as_f64() => Some(b),
                    _ => Some(v),
                })
                .unwrap_or_else(TypedValue::zero),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memref::{MemRefPool, MemSize};

    #[test]
    fn legacy_expression_takes_the_max_sub_sum() {
        let mut pool = MemRefPool::new();
        let a = pool.intern(0, 1);
        let b = pool.intern(1, 1);

        let low = SumOfProducts(vec![Term::new(Operand::Address(a, MemSize::U8))]);
        let high = SumOfProducts(vec![Term::new(Operand::Address(b, MemSize::U8))]);
        let value = Value::Expression(vec![low, high]);

        let ram = [3u8, 99, 0, 0, 0];
        let mut peek = |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };
        pool.refresh(&mut peek);
        assert_eq!(value.resolve(&mut peek).as_u32(), 99);
    }

    #[test]
    fn term_applies_its_modifier() {
        let mut pool = MemRefPool::new();
        let a = pool.intern(0, 1);
        let term = Term::with_modifier(
            Operand::Address(a, MemSize::U8),
            Operator::Mult,
            Operand::ConstInt(4),
        );
        let ram = [3u8, 0, 0, 0, 0];
        let mut peek = |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };
        pool.refresh(&mut peek);
        assert_eq!(term.resolve(&mut peek).as_u32(), 12);
    }
}
