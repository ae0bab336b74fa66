/*
 * Filename: /src/parser/value.rs
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

//! Value grammar: either a `$`-separated legacy sum-of-products formula, or
//! a condition-driven value (`M:`/`A:`/... prefixed chain carrying exactly
//! one `Measured` condition).

use crate::condition::{ConditionType, Operator};
use crate::condset::CondSet;
use crate::memref::MemRefPool;
use crate::parser::cursor::Cursor;
use crate::parser::error::{ParseError, ParseErrorType, ParseResult};
use crate::parser::expression::{parse_condition, parse_operand, parse_operator};
use crate::value::{SumOfProducts, Term, Value};

fn parse_term(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<Term> {
    let operand = parse_operand(cur, pool)?;
    match parse_operator(cur) {
        Some(op) if matches!(op, Operator::Mult | Operator::Div | Operator::And | Operator::Xor | Operator::Mod) => {
            let rhs = parse_operand(cur, pool)?;
            Ok(Term::with_modifier(operand, op, rhs))
        }
        Some(_) => Err(ParseError::new(ParseErrorType::InvalidOperator, cur.offset())),
        None => Ok(Term::new(operand)),
    }
}

fn parse_sum_of_products(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<SumOfProducts> {
    let mut terms = Vec::new();
    loop {
        terms.push(parse_term(cur, pool)?);
        if cur.eat_byte(b'_') {
            continue;
        }
        break;
    }
    Ok(SumOfProducts(terms))
}

/// A condition-driven value is distinguished from a legacy expression by a
/// `FLAG:` prefix: the reference parser checks whether the second byte is
/// `:`, i.e. a one-letter flag immediately followed by a colon.
fn looks_like_condition_driven(cur: &Cursor) -> bool {
    matches!(cur.peek_at(1), Some(b':'))
}

fn parse_condition_driven(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<CondSet> {
    let mut conditions = Vec::new();
    let mut has_measured = false;
    loop {
        let cond = parse_condition(cur, pool)?;
        match cond.kind {
            ConditionType::AddHits
            | ConditionType::AddSource
            | ConditionType::SubSource
            | ConditionType::AndNext
            | ConditionType::AddAddress
            | ConditionType::ResetIf => {}
            ConditionType::Measured => {
                if has_measured {
                    return Err(ParseError::new(ParseErrorType::MultipleMeasured, cur.offset()));
                }
                has_measured = true;
            }
            _ => return Err(ParseError::new(ParseErrorType::InvalidValueFlag, cur.offset())),
        }
        conditions.push(cond);
        if cur.eat_byte(b'_') {
            continue;
        }
        break;
    }
    if !has_measured {
        return Err(ParseError::new(ParseErrorType::MissingValueMeasured, cur.offset()));
    }
    Ok(CondSet::new(conditions))
}

pub fn parse_value(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<Value> {
    if looks_like_condition_driven(cur) {
        return Ok(Value::ConditionDriven(parse_condition_driven(cur, pool)?));
    }

    let mut sums = Vec::new();
    loop {
        sums.push(parse_sum_of_products(cur, pool)?);
        if cur.eat_byte(b'$') {
            continue;
        }
        break;
    }
    Ok(Value::Expression(sums))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::TypedValue;

    fn peek_zero(_: u32, _: u8) -> u32 {
        0
    }

    #[test]
    fn plain_measurement_reads_the_operand_directly() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("M:0xH0000");
        let value = parse_value(&mut cur, &mut pool).unwrap();
        let mut peek = peek_zero;
        assert_eq!(value.resolve(&mut peek), TypedValue::Int(0));
    }

    #[test]
    fn legacy_expression_parses_dollar_separated_sums() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("0xH0000$0xH0001*4");
        let value = parse_value(&mut cur, &mut pool).unwrap();
        match value {
            Value::Expression(sums) => assert_eq!(sums.len(), 2),
            _ => panic!("expected a legacy expression"),
        }
    }

    #[test]
    fn missing_measured_condition_is_rejected() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("A:0xH0000");
        assert_eq!(
            parse_value(&mut cur, &mut pool).unwrap_err().t,
            ParseErrorType::MissingValueMeasured
        );
    }

    #[test]
    fn duplicated_measured_is_rejected() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("M:0xH0000_M:0xH0001");
        assert_eq!(
            parse_value(&mut cur, &mut pool).unwrap_err().t,
            ParseErrorType::MultipleMeasured
        );
    }
}
