/*
 * Filename: /src/lib.rs
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

//! cheevo-core: a frame-driven evaluation engine for emulated-memory
//! achievement, leaderboard and rich presence definitions.
//!
//! A host peeks memory each frame through a [`memref::Peek`] callback and
//! drives every active definition forward with [`runtime::Runtime::do_frame`].

mod condition;
mod condset;
mod format;
mod leaderboard;
mod memref;
mod operand;
mod parser;
mod richpresence;
mod runtime;
mod trigger;
mod value;

// Re-exports
pub use crate::condition::{Condition, ConditionType, Operator};
pub use crate::condset::{CondSet, CondSetOutcome};
pub use crate::format::{format_value, Format};
pub use crate::leaderboard::{LboardEvent, LboardState, Leaderboard};
pub use crate::memref::{MemRef, MemRefHandle, MemRefPool, MemSize, Peek, ViewResult};
pub use crate::operand::{Operand, TypedValue};
pub use crate::parser::error::{ParseError, ParseErrorType, ParseResult};
pub use crate::richpresence::{DisplayClause, DisplayPart, Lookup, RichPresence};
pub use crate::runtime::{LogLevelFilter, Runtime, RuntimeConfig, RuntimeEvent};
pub use crate::trigger::{Trigger, TriggerEvent, TriggerState};
pub use crate::value::{SumOfProducts, Term, Value};

/// Parses an achievement trigger definition string in isolation, interning
/// its memrefs into a fresh pool. Most callers should go through
/// [`Runtime::activate_achievement`] instead, which shares one pool across
/// every active definition.
pub fn parse_trigger(source: &str) -> ParseResult<(Trigger, MemRefPool)> {
    let mut pool = MemRefPool::new();
    let trigger = parser::expression::parse_trigger_str(source, &mut pool)?;
    Ok((trigger, pool))
}

/// Parses a leaderboard definition string in isolation. See [`parse_trigger`].
pub fn parse_leaderboard(source: &str) -> ParseResult<(Leaderboard, MemRefPool)> {
    let mut pool = MemRefPool::new();
    let lboard = parser::leaderboard::parse_leaderboard_str(source, &mut pool)?;
    Ok((lboard, pool))
}

/// Parses a rich presence script in isolation. See [`parse_trigger`].
pub fn parse_richpresence(source: &str) -> ParseResult<(RichPresence, MemRefPool)> {
    let mut pool = MemRefPool::new();
    let rp = parser::richpresence::parse_richpresence_str(source, &mut pool)?;
    Ok((rp, pool))
}
