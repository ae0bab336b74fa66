/*
 * Filename: /src/parser/richpresence.rs
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

//! The rich presence outer grammar: a newline-oriented script of `Lookup:`/
//! `Format:` macro table definitions followed by a `Display:` section of
//! conditional and default clauses.

use std::collections::HashMap;

use crate::format::Format;
use crate::memref::MemRefPool;
use crate::parser::cursor::Cursor;
use crate::parser::error::{ParseError, ParseErrorType, ParseResult};
use crate::parser::expression::parse_trigger;
use crate::parser::value::parse_value;
use crate::richpresence::{DisplayClause, DisplayPart, Lookup, RichPresence};

enum MacroKind {
    Lookup(usize),
    Format(Format),
}

/// Strips a trailing `//` comment (unless escaped with `\`) and trailing
/// whitespace from one line.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut end = bytes.len();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'/' && bytes[i + 1] == b'/' && !(i > 0 && bytes[i - 1] == b'\\') {
            end = i;
            break;
        }
        i += 1;
    }
    let mut s = &line[..end];
    while s.ends_with(|c: char| c == ' ' || c == '\t' || c == '\r') {
        s = &s[..s.len() - 1];
    }
    s
}

fn split_lines(script: &str) -> Vec<&str> {
    script.split('\n').map(strip_comment).collect()
}

fn parse_lookup_entries(lines: &[&str], start: usize) -> (Lookup, usize) {
    let mut lookup = Lookup::new("");
    let mut i = start;
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() || line.starts_with("Lookup:") || line.starts_with("Format:") || line.starts_with("Display:") {
            break;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim();
            let val = line[eq + 1..].trim().to_string();
            if key == "*" {
                lookup.default = Some(val);
            } else if let Ok(n) = key.parse::<i64>() {
                lookup.entries.insert(n, val);
            }
        }
        i += 1;
    }
    (lookup, i)
}

/// Splits a display line's text into literal runs and `@NAME(expr)` macro
/// calls. `@@` and `\@` both produce a literal `@`.
fn parse_display_parts(
    text: &str,
    macros: &HashMap<String, MacroKind>,
    lookups_len: usize,
    pool: &mut MemRefPool,
) -> ParseResult<Vec<DisplayPart>> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1] == b'@' {
            literal.push('@');
            i += 2;
            continue;
        }
        if bytes[i] == b'@' && i + 1 < bytes.len() && bytes[i + 1] == b'@' {
            literal.push('@');
            i += 2;
            continue;
        }
        if bytes[i] == b'@' {
            if !literal.is_empty() {
                parts.push(DisplayPart::Literal(std::mem::take(&mut literal)));
            }
            i += 1;
            let name_start = i;
            while i < bytes.len() && bytes[i] != b'(' {
                i += 1;
            }
            let name = &text[name_start..i];
            if i >= bytes.len() {
                break;
            }
            i += 1; // skip '('
            let arg_start = i;
            while i < bytes.len() && bytes[i] != b')' {
                i += 1;
            }
            let arg = &text[arg_start..i];
            if i < bytes.len() {
                i += 1; // skip ')'
            }

            match macros.get(name) {
                Some(MacroKind::Lookup(idx)) if *idx < lookups_len => {
                    let mut cur = Cursor::new(arg);
                    let value = parse_value(&mut cur, pool)?;
                    parts.push(DisplayPart::LookupMacro(value, *idx));
                }
                Some(MacroKind::Format(fmt)) => {
                    let mut cur = Cursor::new(arg);
                    let value = parse_value(&mut cur, pool)?;
                    parts.push(DisplayPart::FormattedMacro(value, *fmt));
                }
                _ => parts.push(DisplayPart::Literal("[Unknown macro]".to_string())),
            }
            continue;
        }
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            literal.push(bytes[i + 1] as char);
            i += 2;
            continue;
        }
        literal.push(bytes[i] as char);
        i += 1;
    }
    if !literal.is_empty() {
        parts.push(DisplayPart::Literal(literal));
    }
    Ok(parts)
}

pub fn parse_richpresence_str(script: &str, pool: &mut MemRefPool) -> ParseResult<RichPresence> {
    let lines = split_lines(script);
    let mut lookups = Vec::new();
    let mut macros: HashMap<String, MacroKind> = HashMap::new();

    let mut i = 0;
    let mut display_start = None;
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            i += 1;
            continue;
        }
        if let Some(name) = line.strip_prefix("Lookup:") {
            let name = name.trim().to_string();
            let (mut lookup, next) = parse_lookup_entries(&lines, i + 1);
            lookup.name = name.clone();
            lookups.push(lookup);
            macros.insert(name, MacroKind::Lookup(lookups.len() - 1));
            i = next;
            continue;
        }
        if let Some(name) = line.strip_prefix("Format:") {
            let name = name.trim().to_string();
            let mut fmt = Format::Value;
            if i + 1 < lines.len() {
                if let Some(kind) = lines[i + 1].strip_prefix("FormatType=") {
                    fmt = Format::from_name(kind.trim().to_ascii_uppercase().as_str());
                    i += 1;
                }
            }
            macros.insert(name, MacroKind::Format(fmt));
            i += 1;
            continue;
        }
        if line.starts_with("Display:") {
            display_start = Some(i + 1);
            break;
        }
        i += 1;
    }

    let display_start = match display_start {
        Some(s) => s,
        None => return Err(ParseError::new(ParseErrorType::MissingDisplayString, 0)),
    };

    let mut displays = Vec::new();
    let mut idx = display_start;
    while idx < lines.len() {
        let line = lines[idx];
        if line.is_empty() {
            idx += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix('?') {
            if let Some(pos) = rest.find('?') {
                let trig_src = &rest[..pos];
                let text = &rest[pos + 1..];
                let mut tcur = Cursor::new(trig_src);
                let trigger = parse_trigger(&mut tcur, pool)?;
                let parts = parse_display_parts(text, &macros, lookups.len(), pool)?;
                displays.push(DisplayClause {
                    trigger: Some(trigger),
                    parts,
                });
            }
            idx += 1;
        } else {
            let parts = parse_display_parts(line, &macros, lookups.len(), pool)?;
            displays.push(DisplayClause { trigger: None, parts });
            break;
        }
    }

    if displays.is_empty() {
        return Err(ParseError::new(ParseErrorType::MissingDisplayString, 0));
    }

    Ok(RichPresence::new(lookups, displays))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ram_peek(ram: [u8; 4]) -> impl FnMut(u32, u8) -> u32 {
        move |addr: u32, n: u8| {
            let mut v = 0u32;
            for i in 0..n {
                v |= (ram[(addr + i as u32) as usize] as u32) << (8 * i);
            }
            v
        }
    }

    #[test]
    fn lookup_macro_renders_per_spec_scenario() {
        let mut pool = MemRefPool::new();
        let rp = parse_richpresence_str("Lookup:L\n0=Zero\n1=One\n\nDisplay:\nAt @L(0xH0000)", &mut pool).unwrap();

        let mut peek = ram_peek([0, 0, 0, 0]);
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "At Zero");

        let mut peek = ram_peek([1, 0, 0, 0]);
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "At One");

        let mut peek = ram_peek([2, 0, 0, 0]);
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "At ");
    }

    #[test]
    fn conditional_clause_picked_when_its_trigger_is_true() {
        let mut pool = MemRefPool::new();
        let script = "Display:\n?0xH0000=1?Special\nDefault";
        let rp = parse_richpresence_str(script, &mut pool).unwrap();

        let mut peek = ram_peek([1, 0, 0, 0]);
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "Special");

        let mut peek = ram_peek([0, 0, 0, 0]);
        pool.refresh(&mut peek);
        assert_eq!(rp.evaluate(&mut peek), "Default");
    }

    #[test]
    fn missing_display_section_is_an_error() {
        let mut pool = MemRefPool::new();
        let err = parse_richpresence_str("Lookup:L\n0=Zero\n", &mut pool).unwrap_err();
        assert_eq!(err.t, ParseErrorType::MissingDisplayString);
    }
}
