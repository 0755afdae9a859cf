//! Relative-date vocabulary for `due:` markers.
//!
//! Words are resolved against the caller-supplied `today`. Weekday names
//! always mean the nearest date on or after today with that weekday, so
//! `due:friday` typed on a Friday is due the same day.

use chrono::{Datelike, Days, NaiveDate, Weekday};

const ABSOLUTE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m-%d-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Resolve a due-date token, or `None` if it is not part of the vocabulary.
pub fn resolve(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    let word = token.to_ascii_lowercase();
    match word.as_str() {
        "today" | "tod" => return Some(today),
        "tomorrow" | "tmr" | "tmrw" => return today.checked_add_days(Days::new(1)),
        "nextweek" | "next-week" => return today.checked_add_days(Days::new(7)),
        _ => {}
    }

    if let Some(weekday) = parse_weekday(&word) {
        return Some(next_on_or_after(today, weekday));
    }

    ABSOLUTE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&word, fmt).ok())
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    let weekday = match word {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn next_on_or_after(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    today + Days::new(u64::from(ahead))
}
