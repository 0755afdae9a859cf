//! Clock helpers on top of [`mockable::Clock`].
//!
//! Instants are always UTC. Calendar dates (due dates, filter windows, stats
//! days) are read in a [`Calendar`]: the host's local zone unless a fixed
//! offset is configured.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};
use mockable::Clock;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::error::ConfigError;

/// Time zone in which "today" is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Calendar {
    /// The host's local zone, via [`Clock::local`].
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl Calendar {
    pub fn utc() -> Self {
        Calendar::Fixed(Utc.fix())
    }

    /// Today's date according to `clock`.
    pub fn today(&self, clock: &impl Clock) -> NaiveDate {
        match self {
            Calendar::Local => clock.local().date_naive(),
            Calendar::Fixed(offset) => clock.utc().with_timezone(offset).date_naive(),
        }
    }

    /// Calendar date on which `at` falls.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Calendar::Local => at.with_timezone(&Local).date_naive(),
            Calendar::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calendar::Local => f.write_str("local"),
            Calendar::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for Calendar {
    type Err = ConfigError;

    /// `local`, `utc`, or an offset such as `+05:30`, `-08:00`, `+9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidValue {
            key: "timezone".into(),
            message: format!("'{s}' is not 'local', 'utc' or an offset like +05:30"),
        };
        if s.eq_ignore_ascii_case("local") {
            return Ok(Calendar::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Calendar::utc());
        }
        let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
            (1, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (-1, rest)
        } else {
            return Err(invalid());
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse::<u8>().map_err(|_| invalid())?.into();
        let minutes: i32 = minutes.parse::<u8>().map_err(|_| invalid())?.into();
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Calendar::Fixed)
            .ok_or_else(invalid)
    }
}

/// Hand-driven clock for deterministic tests and demos.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 23, 30, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(Calendar::utc().today(&clock), day(14));
        clock.advance(Duration::hours(1));
        assert_eq!(clock.utc(), start + Duration::hours(1));
        assert_eq!(Calendar::utc().today(&clock), day(15));
    }

    #[test]
    fn fixed_offset_decides_the_date() {
        // 03:00 UTC is still the previous evening on the US west coast.
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 14, 3, 0, 0).unwrap());
        let pacific: Calendar = "-07:00".parse().unwrap();
        assert_eq!(pacific.today(&clock), day(13));
        assert_eq!(Calendar::utc().today(&clock), day(14));

        clock.set(Utc.with_ymd_and_hms(2026, 10, 14, 20, 0, 0).unwrap());
        let tokyo: Calendar = "+9".parse().unwrap();
        assert_eq!(tokyo.today(&clock), day(15));
        assert_eq!(tokyo.date_of(clock.utc()), day(15));
    }

    #[test]
    fn local_calendar_follows_clock_local() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 14, 3, 0, 0).unwrap());
        assert_eq!(Calendar::Local.today(&clock), clock.local().date_naive());
        assert_eq!(Calendar::Local.date_of(clock.utc()), clock.local().date_naive());
    }

    #[test]
    fn parses_and_prints_calendars() {
        assert_eq!("Local".parse::<Calendar>().unwrap(), Calendar::Local);
        assert_eq!("UTC".parse::<Calendar>().unwrap(), Calendar::utc());
        let india: Calendar = "+05:30".parse().unwrap();
        assert_eq!(india, Calendar::Fixed(FixedOffset::east_opt(19_800).unwrap()));
        assert_eq!(india.to_string(), "+05:30");
        assert_eq!(Calendar::Local.to_string(), "local");
        for bad in ["", "+", "05:30", "+24:00", "+05:60", "+-5", "mars"] {
            assert!(bad.parse::<Calendar>().is_err(), "{bad:?} should be rejected");
        }
    }
}
