/*
 * Filename: /src/richpresence.rs
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

//! Rich presence: a set of named lookup tables plus a sequence of display
//! clauses rendered top-to-bottom, the first whose trigger (if any) is true
//! winning.

use std::collections::HashMap;

use crate::format::{format_value, Format};
use crate::memref::Peek;
use crate::operand::TypedValue;
use crate::trigger::Trigger;
use crate::value::Value;

/// A `Lookup:`/`Format:` macro table: maps an integer key to display text,
/// falling back to `default` (or the numeric value itself) on a miss.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    pub name: String,
    pub entries: HashMap<i64, String>,
    pub default: Option<String>,
}

impl Lookup {
    pub fn new(name: impl Into<String>) -> Self {
        Lookup {
            name: name.into(),
            entries: HashMap::new(),
            default: None,
        }
    }

    /// A key with no matching entry renders as the lookup's `*=` default, or
    /// an empty string if there is none — not the raw numeric value.
    fn render(&self, value: TypedValue) -> String {
        let key = match value {
            TypedValue::Int(v) => v,
            TypedValue::Float(f) => f as i64,
        };
        self.entries
            .get(&key)
            .cloned()
            .or_else(|| self.default.clone())
            .unwrap_or_default()
    }
}

/// Either a literal run of text or a macro evaluated through a numeric
/// [`Format`] or a named [`Lookup`].
#[derive(Debug, Clone)]
pub enum DisplayPart {
    Literal(String),
    FormattedMacro(Value, Format),
    LookupMacro(Value, usize),
}

/// One line of the `Display:` section: a list of parts, gated by an
/// optional trigger. The final clause in a [`RichPresence`]'s list has no
/// trigger and serves as the default.
#[derive(Debug)]
pub struct DisplayClause {
    pub trigger: Option<Trigger>,
    pub parts: Vec<DisplayPart>,
}

#[derive(Debug)]
pub struct RichPresence {
    pub lookups: Vec<Lookup>,
    pub displays: Vec<DisplayClause>,
}

impl RichPresence {
    pub fn new(lookups: Vec<Lookup>, displays: Vec<DisplayClause>) -> Self {
        RichPresence { lookups, displays }
    }

    /// Renders the first display clause whose trigger is true this frame
    /// (or the last, untriggered, clause as the default). Returns an empty
    /// string if there are no display clauses at all.
    pub fn evaluate<P: Peek + ?Sized>(&self, peek: &mut P) -> String {
        for (i, clause) in self.displays.iter().enumerate() {
            let is_last = i + 1 == self.displays.len();
            let selected = match &clause.trigger {
                Some(t) => t.frame_truth(peek),
                None => true,
            };
            if selected || is_last {
                return self.render_clause(clause, peek);
            }
        }
        String::new()
    }

    fn render_clause<P: Peek + ?Sized>(&self, clause: &DisplayClause, peek: &mut P) -> String {
        let mut out = String::new();
        for part in &clause.parts {
            match part {
                DisplayPart::Literal(text) => out.push_str(text),
                DisplayPart::FormattedMacro(value, format) => {
                    out.push_str(&format_value(value.resolve(peek), *format))
                }
                DisplayPart::LookupMacro(value, lookup_idx) => {
                    let resolved = value.resolve(peek);
                    match self.lookups.get(*lookup_idx) {
                        Some(lookup) => out.push_str(&lookup.render(resolved)),
                        None => out.push_str("[Unknown macro]"),
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionType, Operator};
    use crate::condset::CondSet;
    use crate::memref::{MemRefPool, MemSize};
    use crate::operand::Operand;

    #[test]
    fn renders_literal_and_formatted_macro() {
        let mut pool = MemRefPool::new();
        let mref = pool.intern(0, 1);
        let value = Value::ConditionDriven(CondSet::new(vec![Condition::new(
            Operand::Address(mref, MemSize::U8),
            Operator::None,
            None,
            ConditionType::Measured,
            0,
        )]));
        let clause = DisplayClause {
            trigger: None,
            parts: vec![
                DisplayPart::Literal("Score: ".to_string()),
                DisplayPart::FormattedMacro(value, Format::Score),
            ],
        };
        let rp = RichPresence::new(vec![], vec![clause]);

        let ram = [42u8, 0, 0, 0, 0];
        let mut peek = |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "Score: 000042");
    }

    #[test]
    fn lookup_miss_with_no_default_renders_empty() {
        let lookup = Lookup::new("Zones");
        let value = Value::Expression(vec![]);
        let clause = DisplayClause {
            trigger: None,
            parts: vec![DisplayPart::LookupMacro(value, 0)],
        };
        let rp = RichPresence::new(vec![lookup], vec![clause]);
        let mut peek = |_: u32, _: u8| 0u32;
        assert_eq!(rp.evaluate(&mut peek), "");
    }

    #[test]
    fn conditional_clause_falls_through_to_default() {
        let mut pool = MemRefPool::new();
        let mref = pool.intern(0, 1);
        let gate_cond = Condition::new(
            Operand::Address(mref, MemSize::U8),
            Operator::Eq,
            Some(Operand::ConstInt(1)),
            ConditionType::Standard,
            0,
        );
        let gate = Trigger::new(CondSet::new(vec![gate_cond]), vec![]);
        let conditional = DisplayClause {
            trigger: Some(gate),
            parts: vec![DisplayPart::Literal("special".to_string())],
        };
        let default = DisplayClause {
            trigger: None,
            parts: vec![DisplayPart::Literal("default".to_string())],
        };
        let rp = RichPresence::new(vec![], vec![conditional, default]);

        let ram = [0u8, 0, 0, 0, 0];
        let mut peek = |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        };
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "default");
    }
}
