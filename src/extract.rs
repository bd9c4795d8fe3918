//! Sequential typed reads over matched captures.
//!
//! [`FieldCursor`] hands out captures strictly in wire order. Every read names the kind it
//! expects, so a reader that drifts out of step with [`crate::grammar::FIELDS`] fails with
//! [`FieldError::KindMismatch`] instead of silently converting the wrong text.

use crate::grammar::{Capture, FieldKind};
use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("No field left: expected {expected:?} after {position} fields")]
    Exhausted { position: usize, expected: FieldKind },
    #[error("Field {field}: expected {expected:?}, found {found:?}")]
    KindMismatch {
        field: &'static str,
        expected: FieldKind,
        found: FieldKind,
    },
    #[error("Field {field}: {text:?} does not convert to a number")]
    InvalidNumber { field: &'static str, text: String },
    #[error("Invalid date/time: {date} {time}")]
    InvalidDateTime { date: String, time: String },
}

/// Cursor over the captures of one message.
#[derive(Debug)]
pub struct FieldCursor<'a> {
    captures: std::vec::IntoIter<Capture<'a>>,
    extension: bool,
    position: usize,
}

impl<'a> FieldCursor<'a> {
    pub(crate) fn new(captures: Vec<Capture<'a>>, extension: bool) -> Self {
        FieldCursor {
            captures: captures.into_iter(),
            extension,
            position: 0,
        }
    }

    /// Whether the optional group is present. One test covers the whole group.
    pub fn has_extension(&self) -> bool {
        self.extension
    }

    /// Number of captures consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.captures.len()
    }

    fn take(&mut self, expected: FieldKind, accepts: &[FieldKind]) -> Result<Capture<'a>, FieldError> {
        let capture = self.captures.next().ok_or(FieldError::Exhausted {
            position: self.position,
            expected,
        })?;
        if !accepts.contains(&capture.kind()) {
            return Err(FieldError::KindMismatch {
                field: capture.name(),
                expected,
                found: capture.kind(),
            });
        }
        self.position += 1;
        Ok(capture)
    }

    /// Next integer field, converted to the caller's integer type.
    pub fn next_int<T: FromStr>(&mut self) -> Result<T, FieldError> {
        let capture = self.take(FieldKind::Int, &[FieldKind::Int])?;
        parse_number(capture)
    }

    /// Next identifier field as borrowed text.
    pub fn next_text(&mut self) -> Result<&'a str, FieldError> {
        self.take(FieldKind::Identifier, &[FieldKind::Identifier])
            .map(|c| c.text)
    }

    /// Next decimal field. Plain digit fields read as decimals too.
    pub fn next_decimal(&mut self) -> Result<f64, FieldError> {
        let capture = self.take(FieldKind::Decimal, &[FieldKind::Decimal, FieldKind::Int])?;
        parse_number(capture)
    }

    /// Next hex field (the `0x` prefix is not part of the capture).
    pub fn next_hex_int(&mut self) -> Result<u32, FieldError> {
        let capture = self.take(FieldKind::HexInt, &[FieldKind::HexInt])?;
        u32::from_str_radix(capture.text, 16).map_err(|_| invalid_number(capture))
    }

    /// Consume the date and time fields and assemble a UTC timestamp. Two-digit years map to 20YY.
    pub fn next_date_time(&mut self) -> Result<DateTime<Utc>, FieldError> {
        let date = self.take(FieldKind::Date, &[FieldKind::Date])?;
        let time = self.take(FieldKind::Time, &[FieldKind::Time])?;
        let invalid = || FieldError::InvalidDateTime {
            date: date.text.to_string(),
            time: time.text.to_string(),
        };
        let [year, month, day] = split_pairs(date.text).ok_or_else(invalid)?;
        let [hour, minute, second] = split_pairs(time.text).ok_or_else(invalid)?;
        let year = if year < 100 { 2000 + year } else { year };
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(|naive| naive.and_utc())
            .ok_or_else(invalid)
    }
}

fn parse_number<T: FromStr>(capture: Capture<'_>) -> Result<T, FieldError> {
    capture.text.parse().map_err(|_| invalid_number(capture))
}

fn invalid_number(capture: Capture<'_>) -> FieldError {
    FieldError::InvalidNumber {
        field: capture.name(),
        text: capture.text.to_string(),
    }
}

/// Split six digits into three two-digit values.
fn split_pairs(text: &str) -> Option<[u32; 3]> {
    let bytes = text.as_bytes();
    if bytes.len() != 6 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let pair = |i: usize| u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0');
    Some([pair(0), pair(2), pair(4)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pairs_reads_positionally() {
        assert_eq!(split_pairs("210131"), Some([21, 1, 31]));
        assert_eq!(split_pairs("000000"), Some([0, 0, 0]));
    }

    #[test]
    fn split_pairs_rejects_wrong_width_or_non_digits() {
        assert_eq!(split_pairs("21013"), None);
        assert_eq!(split_pairs("2101311"), None);
        assert_eq!(split_pairs("21a131"), None);
    }
}
