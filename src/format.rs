/*
 * Filename: /src/format.rs
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

//! Numeric display formats applied to a resolved [`crate::operand::TypedValue`]
//! when rendering a rich presence macro (or a lookup miss's raw fallback).

use crate::operand::TypedValue;

/// One of the named numeric renderings a rich presence `Format:` macro can
/// select, plus `Lookup`, which isn't a numeric format at all but shares the
/// macro dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Value,
    UnsignedValue,
    Score,
    Seconds,
    Centiseconds,
    Frames,
    Minutes,
    SecondsAsMinutes,
    Float1,
    Float2,
    Float3,
    Float4,
    Float5,
    Float6,
    Fixed1,
    Fixed2,
    Fixed3,
    Tens,
    Hundreds,
    Thousands,
    Other,
}

impl Format {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SCORE" | "POINTS" => Format::Score,
            "TIME" | "FRAMES" => Format::Frames,
            "SECS" => Format::Seconds,
            "TIMESECS" => Format::SecondsAsMinutes,
            "CENTISECS" => Format::Centiseconds,
            "MINUTES" => Format::Minutes,
            "FLOAT1" => Format::Float1,
            "FLOAT2" => Format::Float2,
            "FLOAT3" => Format::Float3,
            "FLOAT4" => Format::Float4,
            "FLOAT5" => Format::Float5,
            "FLOAT6" => Format::Float6,
            "FIXED1" => Format::Fixed1,
            "FIXED2" => Format::Fixed2,
            "FIXED3" => Format::Fixed3,
            "TENS" => Format::Tens,
            "HUNDREDS" => Format::Hundreds,
            "THOUSANDS" => Format::Thousands,
            "UNSIGNED" => Format::UnsignedValue,
            "VALUE" => Format::Value,
            _ => Format::Other,
        }
    }
}

/// 60 fps, matching the reference engine's fixed frame rate assumption for
/// `Frames`/`Centiseconds` conversions.
const FRAMES_PER_SECOND: i64 = 60;

/// Renders an `H:MM:SS` duration, eliding the hour segment when zero, with
/// an optional `.FF` centiseconds suffix.
fn format_hms(total_seconds: i64, centis: Option<i64>) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    let mut out = if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    };
    if let Some(c) = centis {
        out.push_str(&format!(".{:02}", c));
    }
    out
}

/// Renders `value` through `format`. Float values are truncated towards zero
/// before any of the integer-oriented formats are applied.
pub fn format_value(value: TypedValue, format: Format) -> String {
    let signed = match value {
        TypedValue::Int(v) => v,
        TypedValue::Float(f) => f as i64,
    };
    let unsigned = signed as u32 as u64;

    match format {
        Format::Value => signed.to_string(),
        Format::UnsignedValue => unsigned.to_string(),
        Format::Score | Format::Other => format!("{:06}", unsigned),
        Format::Seconds => format_hms(unsigned as i64, None),
        Format::Centiseconds => {
            let total_cs = unsigned as i64;
            format_hms(total_cs / 100, Some(total_cs % 100))
        }
        Format::Frames => {
            let total_frames = unsigned as i64;
            let secs = total_frames / FRAMES_PER_SECOND;
            let rem_frames = total_frames % FRAMES_PER_SECOND;
            let centis = rem_frames * 100 / FRAMES_PER_SECOND;
            format_hms(secs, Some(centis))
        }
        Format::Minutes => format!("{}", (unsigned as i64) / 60),
        Format::SecondsAsMinutes => {
            let total_secs = unsigned as i64;
            format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
        }
        Format::Float1 => format!("{:.1}", value.as_f64()),
        Format::Float2 => format!("{:.2}", value.as_f64()),
        Format::Float3 => format!("{:.3}", value.as_f64()),
        Format::Float4 => format!("{:.4}", value.as_f64()),
        Format::Float5 => format!("{:.5}", value.as_f64()),
        Format::Float6 => format!("{:.6}", value.as_f64()),
        Format::Fixed1 => format!("{:.1}", unsigned as f64 / 10.0),
        Format::Fixed2 => format!("{:.2}", unsigned as f64 / 100.0),
        Format::Fixed3 => format!("{:.3}", unsigned as f64 / 1000.0),
        Format::Tens => format!("{}", (unsigned / 10) * 10),
        Format::Hundreds => format!("{}", (unsigned / 100) * 100),
        Format::Thousands => format!("{}", (unsigned / 1000) * 1000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_zero_padded_to_six_digits() {
        assert_eq!(format_value(TypedValue::Int(42), Format::Score), "000042");
    }

    #[test]
    fn seconds_as_minutes_splits_mod_sixty() {
        assert_eq!(
            format_value(TypedValue::Int(125), Format::SecondsAsMinutes),
            "02:05"
        );
    }

    #[test]
    fn frames_convert_to_hms_at_sixty_fps() {
        assert_eq!(format_value(TypedValue::Int(60), Format::Frames), "00:01.00");
        assert_eq!(format_value(TypedValue::Int(30), Format::Frames), "00:00.50");
    }

    #[test]
    fn centiseconds_split_into_seconds_and_fraction() {
        assert_eq!(format_value(TypedValue::Int(125), Format::Centiseconds), "00:01.25");
    }

    #[test]
    fn seconds_elide_the_hour_segment_when_zero() {
        assert_eq!(format_value(TypedValue::Int(65), Format::Seconds), "01:05");
        assert_eq!(format_value(TypedValue::Int(3665), Format::Seconds), "1:01:05");
    }

    #[test]
    fn fixed_formats_scale_by_a_power_of_ten() {
        assert_eq!(format_value(TypedValue::Int(1234), Format::Fixed2), "12.34");
    }

    #[test]
    fn from_name_falls_back_to_other() {
        assert_eq!(Format::from_name("SCORE"), Format::Score);
        assert_eq!(Format::from_name("NOT_A_FORMAT"), Format::Other);
    }
}
