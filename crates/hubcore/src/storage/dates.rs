//! Calendar boundaries for the weekly and monthly XP counters.

use chrono::{Datelike, NaiveDate, Utc};

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Monday of the week containing `date` (the date itself on a Monday).
pub fn last_monday(date: NaiveDate) -> NaiveDate {
    let back = i64::from(date.weekday().num_days_from_monday());
    date - chrono::Duration::days(back)
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_last_monday() {
        // 2024-07-17 is a Wednesday
        assert_eq!(last_monday(d(2024, 7, 17)), d(2024, 7, 15));
        assert_eq!(last_monday(d(2024, 7, 15)), d(2024, 7, 15));
        // Sunday belongs to the week started the previous Monday
        assert_eq!(last_monday(d(2024, 7, 21)), d(2024, 7, 15));
        // across a month boundary
        assert_eq!(last_monday(d(2024, 8, 1)), d(2024, 7, 29));
    }

    #[test]
    fn test_first_of_month() {
        assert_eq!(first_of_month(d(2024, 2, 29)), d(2024, 2, 1));
        assert_eq!(first_of_month(d(2024, 3, 1)), d(2024, 3, 1));
    }
}
