//! Dates, the daily send window and listing cutoffs.
//!
//! All times are naive local times: a message dated `2030-05-01 09:00` is
//! due once the local clock passes nine in the morning on that day.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

/// Date-only form of the `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day form used by `not-before` and `not-after`.
pub const TIME_FORMAT: &str = "%H:%M";

/// Date with time form of the `date` field.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const DATE_SHAPE: &str = "dddd-dd-dd";
const DATETIME_SHAPE: &str = "dddd-dd-dd dd:dd";
const TIME_SHAPE: &str = "dd:dd";

const MIDNIGHT: NaiveTime = match NaiveTime::from_hms_opt(0, 0, 0) {
    Some(time) => time,
    None => unreachable!(),
};

const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => MIDNIGHT,
};

/// Date and time parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Not `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
    #[error("cannot parse {0:?} as YYYY-MM-DD or YYYY-MM-DD HH:MM")]
    InvalidDate(String),

    /// Not `HH:MM`.
    #[error("cannot parse {0:?} as HH:MM")]
    InvalidTime(String),
}

/// Checks `input` against a pattern where `d` is an ASCII digit and every
/// other character must match literally.
fn has_shape(input: &str, shape: &str) -> bool {
    input.len() == shape.len()
        && input.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Parses a message date: `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidDate`] for any other form, including
/// seconds or a `T` separator.
pub fn parse_time(input: &str) -> Result<NaiveDateTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidDate(input.to_string());

    if has_shape(input, DATE_SHAPE) {
        return NaiveDate::parse_from_str(input, DATE_FORMAT)
            .map(|date| date.and_time(MIDNIGHT))
            .map_err(|_| invalid());
    }

    if has_shape(input, DATETIME_SHAPE) {
        return NaiveDateTime::parse_from_str(input, DATETIME_FORMAT).map_err(|_| invalid());
    }

    Err(invalid())
}

/// Parses a time of day as `HH:MM`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTime`] for any other form.
pub fn parse_clock(input: &str) -> Result<NaiveTime, ScheduleError> {
    if !has_shape(input, TIME_SHAPE) {
        return Err(ScheduleError::InvalidTime(input.to_string()));
    }
    NaiveTime::parse_from_str(input, TIME_FORMAT)
        .map_err(|_| ScheduleError::InvalidTime(input.to_string()))
}

/// Formats a date the way `next` lists it.
#[must_use]
pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

/// A message is due once `now` is strictly after its date.
#[must_use]
pub fn is_due(date: &NaiveDateTime, now: &NaiveDateTime) -> bool {
    now > date
}

/// End of the day `days` days after `now`.
#[must_use]
pub fn listing_cutoff(now: &NaiveDateTime, days: u32) -> NaiveDateTime {
    now.date()
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
        .and_time(END_OF_DAY)
}

/// The daily period during which messages may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendWindow {
    /// Opening minute; inclusive from its first second.
    pub not_before: NaiveTime,
    /// Closing minute; inclusive up to its last second.
    pub not_after: NaiveTime,
}

impl Default for SendWindow {
    fn default() -> Self {
        Self {
            not_before: MIDNIGHT,
            not_after: END_OF_DAY,
        }
    }
}

impl SendWindow {
    /// Creates a window from two times of day.
    #[must_use]
    pub const fn new(not_before: NaiveTime, not_after: NaiveTime) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// The window on the day of `now`: `not-before` at second 0 and
    /// `not-after` at second 59.
    #[must_use]
    pub fn bounds(&self, now: &NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let day = now.date();
        let lower = self.not_before.with_second(0).unwrap_or(self.not_before);
        let upper = self.not_after.with_second(59).unwrap_or(self.not_after);
        (day.and_time(lower), day.and_time(upper))
    }

    /// Returns false when `now` lies before the opening or after the closing
    /// of today's window.
    #[must_use]
    pub fn permits(&self, now: &NaiveDateTime) -> bool {
        let (lower, upper) = self.bounds(now);
        !(*now < lower || *now > upper)
    }
}

/// Which scheduled messages `next` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Every message.
    All,
    /// Messages dated strictly before the cutoff.
    Before(NaiveDateTime),
}

impl Listing {
    /// Messages due within `days` days of `now`.
    #[must_use]
    pub fn within_days(now: &NaiveDateTime, days: u32) -> Self {
        Self::Before(listing_cutoff(now, days))
    }

    /// Returns true if a message dated `date` is listed.
    #[must_use]
    pub fn includes(&self, date: &NaiveDateTime) -> bool {
        match self {
            Self::All => true,
            Self::Before(cutoff) => date < cutoff,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(input: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        assert_eq!(parse_time("2016-12-24").unwrap(), at("2016-12-24 00:00:00"));
    }

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(
            parse_time("2016-12-24 18:30").unwrap(),
            at("2016-12-24 18:30:00")
        );
    }

    #[test]
    fn test_parse_rejects_other_forms() {
        for input in [
            "",
            "2099/01/01",
            "2016-12-24 18:30:00",
            "2016-12-24T18:30",
            "2016-1-4",
            " 2016-12-24",
            "2016-12-24 ",
            "2016-13-01",
            "2016-02-30",
            "2016-12-24 25:00",
            "tomorrow",
        ] {
            assert_eq!(
                parse_time(input),
                Err(ScheduleError::InvalidDate(input.to_string())),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(
            parse_clock("08:15").unwrap(),
            NaiveTime::from_hms_opt(8, 15, 0).unwrap()
        );
        assert!(parse_clock("8:15").is_err());
        assert!(parse_clock("08:15:00").is_err());
        assert!(parse_clock("24:00").is_err());
    }

    #[test]
    fn test_due_is_strict() {
        let date = at("2030-01-01 09:00:00");
        assert!(!is_due(&date, &date));
        assert!(is_due(&date, &at("2030-01-01 09:00:01")));
        assert!(!is_due(&date, &at("2029-12-31 23:59:59")));
    }

    #[test]
    fn test_window_bounds_cover_whole_minutes() {
        let window = SendWindow::new(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
        );
        let now = at("2030-06-01 12:00:00");
        assert_eq!(
            window.bounds(&now),
            (at("2030-06-01 08:00:00"), at("2030-06-01 17:30:59"))
        );

        assert!(window.permits(&at("2030-06-01 08:00:00")));
        assert!(window.permits(&at("2030-06-01 17:30:59")));
        assert!(!window.permits(&at("2030-06-01 07:59:59")));
        assert!(!window.permits(&at("2030-06-01 17:31:00")));
    }

    #[test]
    fn test_default_window_is_whole_day() {
        let window = SendWindow::default();
        assert!(window.permits(&at("2030-06-01 00:00:00")));
        assert!(window.permits(&at("2030-06-01 23:59:59")));
    }

    #[test]
    fn test_listing_cutoff() {
        let now = at("2030-06-01 12:34:56");
        assert_eq!(listing_cutoff(&now, 7), at("2030-06-08 23:59:59"));
        assert_eq!(listing_cutoff(&now, 0), at("2030-06-01 23:59:59"));
    }

    #[test]
    fn test_listing_includes() {
        let now = at("2030-06-01 12:00:00");
        let listing = Listing::within_days(&now, 1);
        assert!(listing.includes(&at("2030-06-02 23:59:58")));
        assert!(!listing.includes(&at("2030-06-02 23:59:59")));
        assert!(Listing::All.includes(&at("2099-01-01 00:00:00")));
    }

    #[test]
    fn test_format_datetime() {
        assert_eq!(format_datetime(&at("2030-06-01 07:05:00")), "2030-06-01 07:05");
    }
}
