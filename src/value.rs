//! Typed conversion between markup text and values.
//!
//! A [`ValueType`] is a symmetric `parse`/`print` pair. The built-ins cover
//! strings, booleans, integers, dates and enumerations; implement the trait to
//! add more.

use std::fmt;

use chrono::{DateTime as ChronoDateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use thiserror::Error;

use crate::error::{Error, Result};

pub trait ValueType {
    type Value;

    /// Name used in conversion errors.
    fn type_name(&self) -> &'static str;

    fn parse(&self, text: &str) -> Result<Self::Value>;

    fn print(&self, value: &Self::Value) -> Result<String>;
}

#[derive(Debug, Error)]
#[error("expected one of {expected}")]
struct Unrecognized {
    expected: String,
}

/// Raw text, unchanged both ways.
#[derive(Clone, Copy, Debug, Default)]
pub struct Text;

impl ValueType for Text {
    type Value = String;

    fn type_name(&self) -> &'static str {
        "string"
    }

    fn parse(&self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }

    fn print(&self, value: &String) -> Result<String> {
        Ok(value.clone())
    }
}

/// Text with leading and trailing whitespace removed, both ways.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrimmedText;

impl ValueType for TrimmedText {
    type Value = String;

    fn type_name(&self) -> &'static str {
        "trimmed string"
    }

    fn parse(&self, text: &str) -> Result<String> {
        Ok(text.trim().to_owned())
    }

    fn print(&self, value: &String) -> Result<String> {
        Ok(value.trim().to_owned())
    }
}

/// `true` or `false`, case-insensitive. Anything else is a format error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Boolean;

impl ValueType for Boolean {
    type Value = bool;

    fn type_name(&self) -> &'static str {
        "boolean"
    }

    fn parse(&self, text: &str) -> Result<bool> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(Error::value_format(
                self.type_name(),
                text,
                Unrecognized {
                    expected: "true, false".to_owned(),
                },
            ))
        }
    }

    fn print(&self, value: &bool) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Base-10 `i32`. Surrounding whitespace is ignored, overflow is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Integer;

impl ValueType for Integer {
    type Value = i32;

    fn type_name(&self) -> &'static str {
        "integer"
    }

    fn parse(&self, text: &str) -> Result<i32> {
        text.trim()
            .parse::<i32>()
            .map_err(|e| Error::value_format(self.type_name(), text, e))
    }

    fn print(&self, value: &i32) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Calendar date, `YYYY-MM-DD`.
///
/// A trailing time zone (`Z` or `+HH:MM`) is accepted and dropped on parse;
/// print always yields the bare canonical form.
#[derive(Clone, Copy, Debug, Default)]
pub struct Date;

impl ValueType for Date {
    type Value = NaiveDate;

    fn type_name(&self) -> &'static str {
        "date"
    }

    fn parse(&self, text: &str) -> Result<NaiveDate> {
        let trimmed = text.trim();
        NaiveDate::parse_from_str(strip_zone(trimmed), "%Y-%m-%d")
            .map_err(|e| Error::value_format(self.type_name(), text, e))
    }

    fn print(&self, value: &NaiveDate) -> Result<String> {
        Ok(value.format("%Y-%m-%d").to_string())
    }
}

fn strip_zone(text: &str) -> &str {
    if let Some(stripped) = text.strip_suffix('Z') {
        return stripped;
    }
    // +HH:MM / -HH:MM, never confused with the date's own '-' separators
    // because the date part is at least ten characters long
    if text.len() > 10 && text.is_char_boundary(text.len() - 6) {
        let (head, zone) = text.split_at(text.len() - 6);
        let bytes = zone.as_bytes();
        if (bytes[0] == b'+' || bytes[0] == b'-') && bytes[3] == b':' {
            return head;
        }
    }
    text
}

/// Date and time with an offset, xsd:dateTime lexical form.
///
/// A missing offset is read as UTC. Print emits RFC 3339 with `Z` for UTC and
/// fractional seconds only when they are non-zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTime;

impl ValueType for DateTime {
    type Value = ChronoDateTime<FixedOffset>;

    fn type_name(&self) -> &'static str {
        "dateTime"
    }

    fn parse(&self, text: &str) -> Result<ChronoDateTime<FixedOffset>> {
        let trimmed = text.trim();
        match ChronoDateTime::parse_from_rfc3339(trimmed) {
            Ok(value) => Ok(value),
            Err(zoned) => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
                .map_err(|_| Error::value_format(self.type_name(), text, zoned)),
        }
    }

    fn print(&self, value: &ChronoDateTime<FixedOffset>) -> Result<String> {
        Ok(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

/// Enumeration backed by an explicit table of symbolic names.
///
/// ```
/// use xml_nav::value::{Enumerated, ValueType};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Access { Read, Write }
///
/// const ACCESS: Enumerated<Access> =
///     Enumerated::new("access", &[("READ", Access::Read), ("WRITE", Access::Write)]);
///
/// assert_eq!(ACCESS.parse(" WRITE ").unwrap(), Access::Write);
/// assert_eq!(ACCESS.print(&Access::Read).unwrap(), "READ");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Enumerated<E: 'static> {
    type_name: &'static str,
    table: &'static [(&'static str, E)],
}

impl<E> Enumerated<E> {
    pub const fn new(type_name: &'static str, table: &'static [(&'static str, E)]) -> Self {
        Enumerated { type_name, table }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|(symbol, _)| *symbol)
    }
}

impl<E> ValueType for Enumerated<E>
where
    E: Clone + PartialEq + fmt::Debug,
{
    type Value = E;

    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn parse(&self, text: &str) -> Result<E> {
        let trimmed = text.trim();
        self.table
            .iter()
            .find(|(symbol, _)| *symbol == trimmed)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                Error::value_format(
                    self.type_name,
                    text,
                    Unrecognized {
                        expected: self.symbols().collect::<Vec<_>>().join(", "),
                    },
                )
            })
    }

    fn print(&self, value: &E) -> Result<String> {
        self.table
            .iter()
            .find(|(_, candidate)| candidate == value)
            .map(|(symbol, _)| (*symbol).to_owned())
            .ok_or_else(|| {
                Error::value_format(
                    self.type_name,
                    format!("{:?}", value),
                    "value has no symbolic name",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    const COLOR: Enumerated<Color> = Enumerated::new(
        "color",
        &[("RED", Color::Red), ("GREEN", Color::Green)],
    );

    fn is_value_format(result: Result<impl fmt::Debug>) -> bool {
        matches!(result, Err(Error::ValueFormat { .. }))
    }

    #[test]
    fn text_converters() {
        assert_eq!(Text.parse("  a b ").unwrap(), "  a b ");
        assert_eq!(TrimmedText.parse("\n  a b \t").unwrap(), "a b");
        assert_eq!(TrimmedText.print(&" x ".to_owned()).unwrap(), "x");
    }

    #[test]
    fn boolean_is_strict() {
        assert!(Boolean.parse(" TRUE ").unwrap());
        assert!(!Boolean.parse("False").unwrap());
        assert!(is_value_format(Boolean.parse("yes")));
        assert!(is_value_format(Boolean.parse("")));
    }

    #[test]
    fn integer_overflow_is_format_error() {
        assert_eq!(Integer.parse(" -42\n").unwrap(), -42);
        assert_eq!(Integer.parse("+7").unwrap(), 7);
        assert!(is_value_format(Integer.parse("2147483648")));
        assert!(is_value_format(Integer.parse("abc")));

        match Integer.parse("abc") {
            Err(Error::ValueFormat { type_name, raw, .. }) => {
                assert_eq!(type_name, "integer");
                assert_eq!(raw, "abc");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn date_drops_zone() {
        let expected = NaiveDate::from_ymd_opt(2010, 3, 14).unwrap();
        assert_eq!(Date.parse("2010-03-14").unwrap(), expected);
        assert_eq!(Date.parse("2010-03-14Z").unwrap(), expected);
        assert_eq!(Date.parse(" 2010-03-14+01:00 ").unwrap(), expected);
        assert_eq!(Date.parse("2010-03-14-05:00").unwrap(), expected);
        assert!(is_value_format(Date.parse("2010-13-01")));
        assert_eq!(Date.print(&expected).unwrap(), "2010-03-14");
    }

    #[test]
    fn date_time_forms() {
        let utc = DateTime.parse("2011-02-03T04:05:06Z").unwrap();
        assert_eq!(utc.offset().local_minus_utc(), 0);
        assert_eq!(DateTime.print(&utc).unwrap(), "2011-02-03T04:05:06Z");

        let unzoned = DateTime.parse("2011-02-03T04:05:06").unwrap();
        assert_eq!(unzoned, utc);

        let zoned = DateTime.parse("2011-02-03T05:05:06.250+01:00").unwrap();
        assert_eq!(zoned.nanosecond(), 250_000_000);
        assert_eq!(
            DateTime.print(&zoned).unwrap(),
            "2011-02-03T05:05:06.250+01:00"
        );
        assert!(is_value_format(DateTime.parse("yesterday")));
    }

    #[test]
    fn enumerated_table() {
        assert_eq!(COLOR.parse(" GREEN ").unwrap(), Color::Green);
        assert!(is_value_format(COLOR.parse("green")));
        assert_eq!(COLOR.print(&Color::Red).unwrap(), "RED");
        assert!(is_value_format(COLOR.print(&Color::Blue)));
    }

    proptest! {
        #[test]
        fn integer_round_trip(v in any::<i32>()) {
            prop_assert_eq!(Integer.parse(&Integer.print(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn boolean_round_trip(v in any::<bool>()) {
            prop_assert_eq!(Boolean.parse(&Boolean.print(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn trimmed_round_trip(s in "[a-z ]{0,12}") {
            let v = s.trim().to_owned();
            prop_assert_eq!(TrimmedText.parse(&TrimmedText.print(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn date_round_trip(days in 0i64..3_000_000) {
            let v = NaiveDate::from_ymd_opt(1, 1, 1).unwrap() + chrono::Duration::days(days);
            prop_assert_eq!(Date.parse(&Date.print(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn date_time_round_trip(
            secs in 0i64..253_000_000_000,
            nanos in 0u32..1_000_000_000,
            offset_minutes in -840i32..=840,
        ) {
            let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
            let v = offset.timestamp_opt(secs, nanos).unwrap();
            let printed = DateTime.print(&v).unwrap();
            prop_assert_eq!(DateTime.parse(&printed).unwrap(), v);
        }

        #[test]
        fn integer_print_canonicalizes(v in any::<i32>(), pad in "[ \t]{0,3}") {
            let text = format!("{}{}{}", pad, v, pad);
            prop_assert_eq!(Integer.print(&Integer.parse(&text).unwrap()).unwrap(), v.to_string());
        }
    }
}
