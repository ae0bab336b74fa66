/*
 * Filename: /src/parser/error.rs
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

use std::fmt;

/// The kind of malformed input encountered while compiling a definition
/// string.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ParseErrorType {
    InvalidMemoryOperand,
    InvalidConstOperand,
    InvalidFpOperand,
    InvalidOperator,
    InvalidRequiredHits,
    InvalidConditionType,
    InvalidValueFlag,
    InvalidLboardField,
    InvalidComparison,
    MissingStart,
    MissingCancel,
    MissingSubmit,
    MissingValue,
    DuplicatedStart,
    DuplicatedCancel,
    DuplicatedSubmit,
    DuplicatedValue,
    DuplicatedProgress,
    MissingValueMeasured,
    MissingDisplayString,
    MultipleMeasured,
    UnexpectedEnd,
}

impl fmt::Display for ParseErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorType::InvalidMemoryOperand => write!(f, "InvalidMemoryOperand"),
            ParseErrorType::InvalidConstOperand => write!(f, "InvalidConstOperand"),
            ParseErrorType::InvalidFpOperand => write!(f, "InvalidFpOperand"),
            ParseErrorType::InvalidOperator => write!(f, "InvalidOperator"),
            ParseErrorType::InvalidRequiredHits => write!(f, "InvalidRequiredHits"),
            ParseErrorType::InvalidConditionType => write!(f, "InvalidConditionType"),
            ParseErrorType::InvalidValueFlag => write!(f, "InvalidValueFlag"),
            ParseErrorType::InvalidLboardField => write!(f, "InvalidLboardField"),
            ParseErrorType::InvalidComparison => write!(f, "InvalidComparison"),
            ParseErrorType::MissingStart => write!(f, "MissingStart"),
            ParseErrorType::MissingCancel => write!(f, "MissingCancel"),
            ParseErrorType::MissingSubmit => write!(f, "MissingSubmit"),
            ParseErrorType::MissingValue => write!(f, "MissingValue"),
            ParseErrorType::DuplicatedStart => write!(f, "DuplicatedStart"),
            ParseErrorType::DuplicatedCancel => write!(f, "DuplicatedCancel"),
            ParseErrorType::DuplicatedSubmit => write!(f, "DuplicatedSubmit"),
            ParseErrorType::DuplicatedValue => write!(f, "DuplicatedValue"),
            ParseErrorType::DuplicatedProgress => write!(f, "DuplicatedProgress"),
            ParseErrorType::MissingValueMeasured => write!(f, "MissingValueMeasured"),
            ParseErrorType::MissingDisplayString => write!(f, "MissingDisplayString"),
            ParseErrorType::MultipleMeasured => write!(f, "MultipleMeasured"),
            ParseErrorType::UnexpectedEnd => write!(f, "UnexpectedEnd"),
        }
    }
}

/// A compile failure, tagged with the byte offset into the source string at
/// which it was raised.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub t: ParseErrorType,
    pub offset: usize,
    pub msg: Option<String>,
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.msg {
            Some(m) => write!(f, "Error ({}) at offset {}: {}", self.t, self.offset, m),
            None => write!(f, "Error ({}) at offset {}", self.t, self.offset),
        }
    }
}

impl ParseError {
    pub fn new(t: ParseErrorType, offset: usize) -> Self {
        ParseError {
            t,
            offset,
            msg: None,
        }
    }

    pub fn with_msg(t: ParseErrorType, offset: usize, msg: impl Into<String>) -> Self {
        ParseError {
            t,
            offset,
            msg: Some(msg.into()),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
