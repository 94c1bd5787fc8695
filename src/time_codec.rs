//! Parsing and formatting of wall-clock times.
//!
//! Everything here is pure. Both conventions require a two digit hour and a
//! two digit minute, so `"8:30"` is rejected no matter which convention is in
//! use, and the 12 hour convention additionally requires an `AM`/`PM` suffix.

use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A minute of the day, `00:00` through `23:59`.
///
/// Seconds are always zero so two times compare equal whenever they fall in
/// the same minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Truncates `time` to its minute.
    #[must_use]
    pub fn from_naive(time: NaiveTime) -> Self {
        Self(
            time.with_second(0)
                .and_then(|time| time.with_nanosecond(0))
                .unwrap_or(time),
        )
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Minute-of-day arithmetic, wrapping past midnight.
    #[must_use]
    pub fn add_minutes(self, minutes: u32) -> Self {
        let (time, _) = self
            .0
            .overflowing_add_signed(chrono::Duration::minutes(i64::from(minutes)));
        Self(time)
    }

    #[must_use]
    pub const fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse(&value, Convention::TwentyFourHour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Convention {
    TwelveHour,
    #[default]
    TwentyFourHour,
}

impl Convention {
    /// Reads a user supplied `12`/`24` token.
    #[must_use]
    pub fn try_from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "12" | "12h" => Some(Self::TwelveHour),
            "24" | "24h" => Some(Self::TwentyFourHour),
            _ => None,
        }
    }

    /// Like [`Self::try_from_token`], but anything unknown falls back to the
    /// 24 hour clock with a warning.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        Self::try_from_token(token).unwrap_or_else(|| {
            log::warn!("unknown time format {token:?}, defaulting to 24-hour");
            Self::TwentyFourHour
        })
    }

    #[must_use]
    pub const fn example(self) -> &'static str {
        match self {
            Self::TwelveHour => "08:30 PM",
            Self::TwentyFourHour => "20:30",
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            Self::TwelveHour => "%I:%M %p",
            Self::TwentyFourHour => "%H:%M",
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwelveHour => "12",
            Self::TwentyFourHour => "24",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    AM,
    PM,
}

impl FromStr for Meridiem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("am") {
            Ok(Self::AM)
        } else if s.eq_ignore_ascii_case("pm") {
            Ok(Self::PM)
        } else {
            Err(())
        }
    }
}

impl Meridiem {
    /// Converts a 1-12 clock hour into a 0-23 hour.
    const fn to_24h(self, hour: u32) -> u32 {
        match (self, hour) {
            (Self::AM, 12) => 0,
            (Self::PM, 12) => 12,
            (Self::AM, hour) => hour,
            (Self::PM, hour) => hour + 12,
        }
    }
}

/// Parses `input` under `convention`.
///
/// # Errors
/// Returns a [`ParseError`] describing the first problem found.
pub fn parse(input: &str, convention: Convention) -> Result<TimeOfDay, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    match convention {
        Convention::TwentyFourHour => {
            let (hour, minute) = split_clock(input, "HH:MM")?;
            if hour > 23 {
                return Err(ParseError::HourOutOfRange(hour));
            }
            build(hour, minute)
        }
        Convention::TwelveHour => {
            let Some((clock, meridiem)) = input.split_once(' ') else {
                // a bare clock is a missing suffix, anything else is just garbage
                return match split_clock(input, "HH:MM AM") {
                    Ok(_) => Err(ParseError::MissingMeridiem(input.to_string())),
                    Err(e) => Err(e),
                };
            };
            let meridiem: Meridiem = meridiem.parse().map_err(|()| ParseError::Malformed {
                input: input.to_string(),
                expected: "HH:MM AM",
            })?;
            let (hour, minute) = split_clock(clock, "HH:MM AM")?;
            if !(1..=12).contains(&hour) {
                return Err(ParseError::HourOutOfRange(hour));
            }
            build(meridiem.to_24h(hour), minute)
        }
    }
}

/// Renders `time` so that [`parse`] reads it back under the same convention.
#[must_use]
pub fn format(time: TimeOfDay, convention: Convention) -> String {
    time.0.format(convention.pattern()).to_string()
}

fn split_clock(clock: &str, expected: &'static str) -> Result<(u32, u32), ParseError> {
    let malformed = || ParseError::Malformed {
        input: clock.to_string(),
        expected,
    };
    let bytes = clock.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(malformed());
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    let [h1, h0, m1, m0] = digits.map(|d| u32::from(d - b'0'));
    Ok((h1 * 10 + h0, m1 * 10 + m0))
}

fn build(hour: u32, minute: u32) -> Result<TimeOfDay, ParseError> {
    if minute > 59 {
        return Err(ParseError::MinuteOutOfRange(minute));
    }
    TimeOfDay::new(hour, minute).ok_or(ParseError::HourOutOfRange(hour))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn parses_24_hour() {
        assert_eq!(parse("20:30", Convention::TwentyFourHour), Ok(t(20, 30)));
        assert_eq!(parse(" 00:00 ", Convention::TwentyFourHour), Ok(t(0, 0)));
        assert_eq!(parse("23:59", Convention::TwentyFourHour), Ok(t(23, 59)));
    }

    #[test]
    fn parses_12_hour() {
        assert_eq!(parse("08:30 PM", Convention::TwelveHour), Ok(t(20, 30)));
        assert_eq!(parse("08:30 am", Convention::TwelveHour), Ok(t(8, 30)));
        assert_eq!(parse("12:00 AM", Convention::TwelveHour), Ok(t(0, 0)));
        assert_eq!(parse("12:15 PM", Convention::TwelveHour), Ok(t(12, 15)));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse("25:61", Convention::TwentyFourHour),
            Err(ParseError::HourOutOfRange(25))
        );
        assert_eq!(
            parse("23:61", Convention::TwentyFourHour),
            Err(ParseError::MinuteOutOfRange(61))
        );
        assert_eq!(parse("", Convention::TwentyFourHour), Err(ParseError::Empty));
        assert_eq!(parse("   ", Convention::TwelveHour), Err(ParseError::Empty));
        assert!(matches!(
            parse("8:30", Convention::TwentyFourHour),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse("8:30 PM", Convention::TwelveHour),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse("08.30", Convention::TwentyFourHour),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse("08:30 XM", Convention::TwelveHour),
            Err(ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn twelve_hour_needs_meridiem() {
        assert_eq!(
            parse("08:30", Convention::TwelveHour),
            Err(ParseError::MissingMeridiem("08:30".to_string()))
        );
        assert_eq!(
            parse("00:30 AM", Convention::TwelveHour),
            Err(ParseError::HourOutOfRange(0))
        );
        assert_eq!(
            parse("13:30 PM", Convention::TwelveHour),
            Err(ParseError::HourOutOfRange(13))
        );
    }

    #[test]
    fn formats() {
        assert_eq!(format(t(20, 5), Convention::TwentyFourHour), "20:05");
        assert_eq!(format(t(20, 5), Convention::TwelveHour), "08:05 PM");
        assert_eq!(format(t(0, 0), Convention::TwelveHour), "12:00 AM");
    }

    #[test]
    fn unknown_token_defaults_to_24_hour() {
        assert_eq!(Convention::from_token("12"), Convention::TwelveHour);
        assert_eq!(Convention::from_token("24"), Convention::TwentyFourHour);
        assert_eq!(Convention::from_token("36"), Convention::TwentyFourHour);
        assert_eq!(Convention::try_from_token("36"), None);
        assert_eq!(Convention::try_from_token(" 12h "), Some(Convention::TwelveHour));
    }

    #[test]
    fn minutes_wrap_past_midnight() {
        assert_eq!(t(23, 55).add_minutes(10), t(0, 5));
        assert_eq!(t(9, 0).add_minutes(15), t(9, 15));
        assert_eq!(t(12, 0).add_minutes(24 * 60), t(12, 0));
    }

    #[test]
    fn truncates_seconds() {
        let time = NaiveTime::from_hms_milli_opt(8, 30, 42, 500).unwrap();
        assert_eq!(TimeOfDay::from_naive(time), t(8, 30));
    }

    proptest! {
        #[test]
        fn round_trips_24_hour(hour in 0u32..24, minute in 0u32..60) {
            let time = t(hour, minute);
            let text = format(time, Convention::TwentyFourHour);
            prop_assert_eq!(parse(&text, Convention::TwentyFourHour), Ok(time));
        }

        #[test]
        fn round_trips_12_hour(hour in 0u32..24, minute in 0u32..60) {
            let time = t(hour, minute);
            let text = format(time, Convention::TwelveHour);
            prop_assert_eq!(parse(&text, Convention::TwelveHour), Ok(time));
        }
    }
}
