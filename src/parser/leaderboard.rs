/*
 * Filename: /src/parser/leaderboard.rs
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

//! The outer leaderboard grammar: `::`-separated `STA:`/`CAN:`/`SUB:`/
//! `VAL:`/`PRO:` fields, each a trigger or value definition in its own
//! right. Field order is not fixed; each prefix may appear at most once,
//! and `STA:`/`CAN:`/`SUB:`/`VAL:` are mandatory.

use crate::leaderboard::Leaderboard;
use crate::memref::MemRefPool;
use crate::parser::cursor::Cursor;
use crate::parser::error::{ParseError, ParseErrorType, ParseResult};
use crate::parser::expression::parse_trigger;
use crate::parser::value::parse_value;
use crate::trigger::Trigger;
use crate::value::Value;

enum Field {
    Start(Trigger),
    Cancel(Trigger),
    Submit(Trigger),
    Value(Value),
    Progress(Value),
}

fn parse_field(cur: &mut Cursor, pool: &mut MemRefPool) -> ParseResult<Field> {
    if cur.eat_tag_ci("STA:") {
        return Ok(Field::Start(parse_trigger(cur, pool)?));
    }
    if cur.eat_tag_ci("CAN:") {
        return Ok(Field::Cancel(parse_trigger(cur, pool)?));
    }
    if cur.eat_tag_ci("SUB:") {
        return Ok(Field::Submit(parse_trigger(cur, pool)?));
    }
    if cur.eat_tag_ci("VAL:") {
        return Ok(Field::Value(parse_value(cur, pool)?));
    }
    if cur.eat_tag_ci("PRO:") {
        return Ok(Field::Progress(parse_value(cur, pool)?));
    }
    Err(ParseError::new(ParseErrorType::InvalidLboardField, cur.offset()))
}

/// Finds the end of the current `::`-delimited field, scanning for `::`
/// rather than a single `:` since value/trigger bodies freely contain
/// colons of their own (e.g. `0xH0000`, flag prefixes).
fn field_end(src: &str) -> usize {
    let bytes = src.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b':' && bytes[i + 1] == b':' {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

pub fn parse_leaderboard_str(src: &str, pool: &mut MemRefPool) -> ParseResult<Leaderboard> {
    let mut start = None;
    let mut cancel = None;
    let mut submit = None;
    let mut value = None;
    let mut progress = None;

    let mut rest = src;
    let mut base_offset = 0;
    loop {
        let len = field_end(rest);
        let (chunk, remainder) = rest.split_at(len);
        let mut cur = Cursor::new(chunk);
        let field = parse_field(&mut cur, pool).map_err(|mut e| {
            e.offset += base_offset;
            e
        })?;
        if !cur.is_eof() {
            return Err(ParseError::new(ParseErrorType::InvalidLboardField, base_offset + cur.offset()));
        }

        match field {
            Field::Start(t) => {
                if start.is_some() {
                    return Err(ParseError::new(ParseErrorType::DuplicatedStart, base_offset));
                }
                start = Some(t);
            }
            Field::Cancel(t) => {
                if cancel.is_some() {
                    return Err(ParseError::new(ParseErrorType::DuplicatedCancel, base_offset));
                }
                cancel = Some(t);
            }
            Field::Submit(t) => {
                if submit.is_some() {
                    return Err(ParseError::new(ParseErrorType::DuplicatedSubmit, base_offset));
                }
                submit = Some(t);
            }
            Field::Value(v) => {
                if value.is_some() {
                    return Err(ParseError::new(ParseErrorType::DuplicatedValue, base_offset));
                }
                value = Some(v);
            }
            Field::Progress(v) => {
                if progress.is_some() {
                    return Err(ParseError::new(ParseErrorType::DuplicatedProgress, base_offset));
                }
                progress = Some(v);
            }
        }

        if remainder.is_empty() {
            break;
        }
        base_offset += len + 2;
        rest = &remainder[2..];
    }

    let start = start.ok_or_else(|| ParseError::new(ParseErrorType::MissingStart, 0))?;
    let cancel = cancel.ok_or_else(|| ParseError::new(ParseErrorType::MissingCancel, 0))?;
    let submit = submit.ok_or_else(|| ParseError::new(ParseErrorType::MissingSubmit, 0))?;
    let value = value.ok_or_else(|| ParseError::new(ParseErrorType::MissingValue, 0))?;

    Ok(Leaderboard::new(start, cancel, submit, value, progress))
}
