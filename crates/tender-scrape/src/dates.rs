use chrono::{Datelike, Local, NaiveDate, TimeDelta};

/// French month names as the listing prints them.
pub const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Long French form of `date`: `17 octobre 2026`, no leading zero on the day.
pub fn french_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_FR[date.month0() as usize],
        date.year()
    )
}

/// `today` minus `days_back` days, or `None` when out of range.
pub fn target_date(today: NaiveDate, days_back: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(days_back).and_then(|d| today.checked_sub_signed(d))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` command-line date.
pub fn parse_iso(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}
