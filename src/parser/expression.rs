/*
 * Filename: /src/parser/expression.rs
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

//! The condition/trigger expression grammar: operands, conditions,
//! condition sets and triggers, parsed directly into the evaluator's own
//! in-memory tree (no separate AST stage).

use crate::condition::{Condition, ConditionType, Operator};
use crate::condset::CondSet;
use crate::memref::{MemRefPool, MemSize};
use crate::operand::Operand;
use crate::parser::cursor::{is_digit, is_hex_digit, Cursor};
use crate::parser::error::{ParseError, ParseErrorType, ParseResult};
use crate::trigger::Trigger;

fn parse_hex_u32(cur: &mut Cursor) -> ParseResult<u32> {
    let offset = cur.offset();
    let digits = cur.take_while(is_hex_digit);
    if digits.is_empty() {
        return Err(ParseError::new(ParseErrorType::InvalidMemoryOperand, offset));
    }
    let text = std::str::from_utf8(digits).unwrap();
    u32::from_str_radix(text, 16).map_err(|_| ParseError::new(ParseErrorType::InvalidMemoryOperand, offset))
}

fn parse_signed_int(cur: &mut Cursor) -> ParseResult<i64> {
    let offset = cur.offset();
    let negative = cur.eat_byte(b'-');
    let digits = cur.take_while(is_digit);
    if digits.is_empty() {
        return Err(ParseError::new(ParseErrorType::InvalidConstOperand, offset));
    }
    let text = std::str::from_utf8(digits).unwrap();
    let v: i64 = text
        .parse()
        .map_err(|_| ParseError::new(ParseErrorType::InvalidConstOperand, offset))?;
    Ok(if negative { -v } else { v })
}

/// Parses a bare (unprefixed) decimal constant, e.g. `123` or `-1`. Matches
/// the reference parser's overflow behavior: a magnitude beyond `u32::MAX`
/// saturates rather than wrapping mod 2^32, and a negative literal then
/// wraps to its two's-complement bit pattern (`-1` -> `0xFFFFFFFF`).
fn parse_bare_decimal(cur: &mut Cursor) -> ParseResult<u32> {
    let offset = cur.offset();
    let negative = cur.eat_byte(b'-');
    let digits = cur.take_while(is_digit);
    if digits.is_empty() {
        return Err(ParseError::new(ParseErrorType::InvalidConstOperand, offset));
    }
    let text = std::str::from_utf8(digits).unwrap();
    let magnitude: u64 = text.parse().unwrap_or(u64::MAX);
    let clamped = magnitude.min(u32::MAX as u64) as u32;
    Ok(if negative { clamped.wrapping_neg() } else { clamped })
}

fn parse_signed_float(cur: &mut Cursor) -> ParseResult<f64> {
    let offset = cur.offset();
    let text_start = cur.rest();
    cur.eat_byte(b'-');
    cur.take_while(is_digit);
    if cur.eat_byte(b'.') {
        cur.take_while(is_digit);
    }
    let consumed = cur.offset() - offset;
    let text = &text_start[..consumed];
    text.parse()
        .map_err(|_| ParseError::new(ParseErrorType::InvalidFpOperand, offset))
}

/// Parses a memory-size tag following `0x`, returning the [`MemSize`] and
/// consuming its letter (if any; a bare `0x` is 16-bit LE).
fn parse_size_tag(cur: &mut Cursor) -> MemSize {
    match cur.peek() {
        Some(b'H') | Some(b'h') => {
            cur.advance();
            MemSize::U8
        }
        Some(b'W') | Some(b'w') => {
            cur.advance();
            MemSize::U24LE
        }
        Some(b'X') | Some(b'x') => {
            cur.advance();
            MemSize::U32LE
        }
        Some(b'I') | Some(b'i') => {
            cur.advance();
            MemSize::U16BE
        }
        Some(b'J') | Some(b'j') => {
            cur.advance();
            MemSize::U24BE
        }
        Some(b'G') | Some(b'g') => {
            cur.advance();
            MemSize::U32BE
        }
        Some(b'L') | Some(b'l') => {
            cur.advance();
            MemSize::LowNibble
        }
        Some(b'U') | Some(b'u') => {
            cur.advance();
            MemSize::HighNibble
        }
        Some(b'K') | Some(b'k') => {
            cur.advance();
            MemSize::BitCount
        }
        Some(c @ b'M'..=b'T') => {
            cur.advance();
            match c.to_ascii_uppercase() {
                b'M' => MemSize::Bit0,
                b'N' => MemSize::Bit1,
                b'O' => MemSize::Bit2,
                b'P' => MemSize::Bit3,
                b'Q' => MemSize::Bit4,
                b'R' => MemSize::Bit5,
                b'S' => MemSize::Bit6,
                _ => MemSize::Bit7,
            }
        }
        _ => MemSize::U16LE,
    }
}

/// The wrapping/re-interpretation prefix preceding an operand's address or
/// literal. `Delta`/`Prior` pick a different [`Operand`] variant; `Bcd`/
/// `Invert` wrap whichever operand follows.
enum Prefix {
    None,
    Delta,
    Prior,
    Bcd,
    Invert,
}

fn parse_prefix(cur: &mut Cursor) -> Prefix {
    match cur.peek() {
        Some(b'd') if cur.peek_at(1) != Some(b'x') => {
            cur.advance();
            Prefix::Delta
        }
        Some(b'p') => {
            cur.advance();
            Prefix::Prior
        }
        Some(b'b') => {
            cur.advance();
            Prefix::Bcd
        }
        Some(b'~') => {
            cur.advance();
            Prefix::Invert
        }
        _ => Prefix::None,
    }
}

pub fn parse_operand(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<Operand> {
    if cur.eat_tag_ci("{recall}") {
        return Ok(Operand::Recall);
    }

    let prefix = parse_prefix(cur);

    let base = if cur.peek() == Some(b'0') && cur.peek_at(1) == Some(b'x') {
        cur.advance();
        cur.advance();
        let size = parse_size_tag(cur);
        let address = parse_hex_u32(cur)?;
        let mref = pool.intern(address, size.shared_size());
        match prefix {
            Prefix::Delta => return Ok(Operand::Delta(mref, size)),
            Prefix::Prior => return Ok(Operand::Prior(mref, size)),
            _ => Operand::Address(mref, size),
        }
    } else if cur.peek() == Some(b'f') && matches!(cur.peek_at(1), Some(b'F' | b'f' | b'B' | b'b' | b'M' | b'm' | b'H' | b'h')) {
        cur.advance();
        let size = match cur.advance().unwrap().to_ascii_uppercase() {
            b'F' => MemSize::Float32LE,
            b'B' => MemSize::Float32BE,
            b'M' => MemSize::MBF32,
            b'H' => MemSize::MBF32LE,
            _ => unreachable!(),
        };
        let address = parse_hex_u32(cur)?;
        let mref = pool.intern(address, size.shared_size());
        match prefix {
            Prefix::Delta => return Ok(Operand::Delta(mref, size)),
            Prefix::Prior => return Ok(Operand::Prior(mref, size)),
            _ => Operand::Address(mref, size),
        }
    } else if cur.eat_byte(b'f') {
        Operand::ConstFloat(parse_signed_float(cur)?)
    } else if cur.eat_byte(b'h') {
        Operand::ConstInt(parse_hex_u32(cur)?)
    } else if cur.eat_byte(b'v') {
        let n = parse_signed_int(cur)?;
        Operand::ConstInt(n as u32)
    } else if matches!(cur.peek(), Some(b'0'..=b'9'))
        || (cur.peek() == Some(b'-') && matches!(cur.peek_at(1), Some(b'0'..=b'9')))
    {
        Operand::ConstInt(parse_bare_decimal(cur)?)
    } else {
        return Err(ParseError::new(ParseErrorType::InvalidMemoryOperand, cur.offset()));
    };

    Ok(match prefix {
        Prefix::Bcd => Operand::BcdDecoded(Box::new(base)),
        Prefix::Invert => Operand::Inverted(Box::new(base)),
        _ => base,
    })
}

fn parse_flag(cur: &mut Cursor) -> Option<ConditionType> {
    let save = cur.offset();
    let c = cur.peek()?;
    let kind = match c.to_ascii_uppercase() {
        b'P' => ConditionType::PauseIf,
        b'R' => ConditionType::ResetIf,
        b'Q' => ConditionType::MeasuredIf,
        b'T' => ConditionType::Trigger,
        b'M' => ConditionType::Measured,
        b'A' => ConditionType::AddSource,
        b'B' => ConditionType::SubSource,
        b'I' => ConditionType::AddAddress,
        b'K' => ConditionType::Remember,
        b'C' => ConditionType::AddHits,
        b'D' => ConditionType::SubHits,
        b'Z' => ConditionType::ResetNextIf,
        b'N' => ConditionType::AndNext,
        b'O' => ConditionType::OrNext,
        _ => return None,
    };
    if cur.peek_at(1) != Some(b':') {
        cur.set_offset(save);
        return None;
    }
    cur.advance();
    cur.advance();
    Some(kind)
}

pub fn parse_operator(cur: &mut Cursor) -> Option<Operator> {
    let two = (cur.peek(), cur.peek_at(1));
    let (op, len) = match two {
        (Some(b'='), Some(b'=')) => (Operator::Eq, 2),
        (Some(b'!'), Some(b'=')) => (Operator::Ne, 2),
        (Some(b'<'), Some(b'=')) => (Operator::Le, 2),
        (Some(b'>'), Some(b'=')) => (Operator::Ge, 2),
        (Some(b'='), _) => (Operator::Eq, 1),
        (Some(b'<'), _) => (Operator::Lt, 1),
        (Some(b'>'), _) => (Operator::Gt, 1),
        (Some(b'*'), _) => (Operator::Mult, 1),
        (Some(b'/'), _) => (Operator::Div, 1),
        (Some(b'&'), _) => (Operator::And, 1),
        (Some(b'^'), _) => (Operator::Xor, 1),
        (Some(b'%'), _) => (Operator::Mod, 1),
        (Some(b'+'), _) => (Operator::Add, 1),
        (Some(b'-'), _) => (Operator::Sub, 1),
        _ => return None,
    };
    for _ in 0..len {
        cur.advance();
    }
    Some(op)
}

fn parse_required_hits(cur: &mut Cursor) -> ParseResult<u32> {
    if cur.eat_byte(b'.') {
        let offset = cur.offset();
        let digits = cur.take_while(is_digit);
        if digits.is_empty() || !cur.eat_byte(b'.') {
            return Err(ParseError::new(ParseErrorType::InvalidRequiredHits, offset));
        }
        let text = std::str::from_utf8(digits).unwrap();
        return text
            .parse()
            .map_err(|_| ParseError::new(ParseErrorType::InvalidRequiredHits, offset));
    }
    if cur.eat_byte(b'(') {
        let offset = cur.offset();
        let digits = cur.take_while(is_digit);
        if digits.is_empty() || !cur.eat_byte(b')') {
            return Err(ParseError::new(ParseErrorType::InvalidRequiredHits, offset));
        }
        let text = std::str::from_utf8(digits).unwrap();
        return text
            .parse()
            .map_err(|_| ParseError::new(ParseErrorType::InvalidRequiredHits, offset));
    }
    Ok(0)
}

pub fn parse_condition(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<Condition> {
    let kind = parse_flag(cur).unwrap_or(ConditionType::Standard);
    let operand1 = parse_operand(cur, pool)?;

    let (operator, operand2) = match parse_operator(cur) {
        Some(op) => (op, Some(parse_operand(cur, pool)?)),
        None => (Operator::None, None),
    };

    let required_hits = parse_required_hits(cur)?;
    Ok(Condition::new(operand1, operator, operand2, kind, required_hits))
}

pub fn parse_condset(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<CondSet> {
    let mut conditions = Vec::new();
    loop {
        conditions.push(parse_condition(cur, pool)?);
        if cur.eat_byte(b'_') {
            continue;
        }
        break;
    }
    Ok(CondSet::new(conditions))
}

pub fn parse_trigger(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<Trigger> {
    let required = parse_condset(cur, pool)?;
    let mut alternates = Vec::new();
    while cur.eat_byte(b'S') {
        alternates.push(parse_condset(cur, pool)?);
    }
    Ok(Trigger::new(required, alternates))
}

pub fn parse_trigger_str(src: &str, pool: &mut MemRefPool) -> ParseResult<Trigger> {
    let mut cur = Cursor::new(src);
    let trigger = parse_trigger(&mut cur, pool)?;
    if !cur.is_eof() {
        return Err(ParseError::new(ParseErrorType::InvalidConditionType, cur.offset()));
    }
    Ok(trigger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::TypedValue;

    fn peek_zero(_: u32, _: u8) -> u32 {
        0
    }

    #[test]
    fn bare_decimal_constants_need_no_prefix_letter() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("123");
        let op = parse_operand(&mut cur, &mut pool).unwrap();
        let mut peek = peek_zero;
        assert_eq!(op.resolve(None, &mut peek, TypedValue::zero()), TypedValue::Int(123));
    }

    #[test]
    fn bare_negative_decimal_wraps_to_32_bits() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("-1");
        let op = parse_operand(&mut cur, &mut pool).unwrap();
        let mut peek = peek_zero;
        assert_eq!(
            op.resolve(None, &mut peek, TypedValue::zero()),
            TypedValue::Int(0xFFFF_FFFFu32 as i64)
        );
    }

    #[test]
    fn bare_decimal_overflow_saturates_rather_than_wrapping() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("4294967296");
        let op = parse_operand(&mut cur, &mut pool).unwrap();
        let mut peek = peek_zero;
        assert_eq!(
            op.resolve(None, &mut peek, TypedValue::zero()),
            TypedValue::Int(u32::MAX as i64)
        );
    }

    #[test]
    fn size_tags_and_hit_targets_parse_into_a_condition() {
        let mut pool = MemRefPool::new();
        let mut cur = Cursor::new("0xH0001=20(2)");
        let cond = parse_condition(&mut cur, &mut pool).unwrap();
        assert_eq!(cond.operator, Operator::Eq);
        assert_eq!(cond.required_hits, 2);
        assert!(cur.is_eof());
    }

    #[test]
    fn trigger_with_alternates_splits_on_s() {
        let mut pool = MemRefPool::new();
        let trigger = parse_trigger_str("0xH0000=1S0xH0001=2S0xH0002=3", &mut pool).unwrap();
        assert_eq!(trigger.alternates.len(), 2);
    }
}
