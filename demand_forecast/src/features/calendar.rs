//! Calendar features and fixed-calendar event flags
//!
//! Event flags encode assumed seasonal patterns of the restaurant business.
//! They are deterministic functions of month and day, coarse on purpose, and
//! never learned from data.

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Date-derived features for one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarFeatures {
    /// Monday = 0 ... Sunday = 6
    pub day_of_week: u32,
    /// 1..=12
    pub month: u32,
    /// Day of month divided by the number of days in that month
    pub day_of_month_norm: f64,
    pub iso_week: u32,
    /// 1..=4
    pub quarter: u32,
    pub day_of_week_sin: f64,
    pub day_of_week_cos: f64,
    pub month_sin: f64,
    pub month_cos: f64,
    pub is_weekend: bool,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        let month = date.month();
        let dow_angle = 2.0 * PI * day_of_week as f64 / 7.0;
        let month_angle = 2.0 * PI * month as f64 / 12.0;

        Self {
            day_of_week,
            month,
            day_of_month_norm: date.day() as f64 / days_in_month(date) as f64,
            iso_week: date.iso_week().week(),
            quarter: (month - 1) / 3 + 1,
            day_of_week_sin: dow_angle.sin(),
            day_of_week_cos: dow_angle.cos(),
            month_sin: month_angle.sin(),
            month_cos: month_angle.cos(),
            is_weekend: day_of_week >= 5,
        }
    }

    /// Values in [`CALENDAR_COLUMNS`] order
    pub fn values(&self) -> [f64; 10] {
        [
            self.day_of_week as f64,
            self.month as f64,
            self.day_of_month_norm,
            self.iso_week as f64,
            self.quarter as f64,
            self.day_of_week_sin,
            self.day_of_week_cos,
            self.month_sin,
            self.month_cos,
            flag(self.is_weekend),
        ]
    }
}

/// Column names produced by [`CalendarFeatures::values`]
pub const CALENDAR_COLUMNS: [&str; 10] = [
    "day_of_week",
    "month",
    "day_of_month_norm",
    "iso_week",
    "quarter",
    "day_of_week_sin",
    "day_of_week_cos",
    "month_sin",
    "month_cos",
    "is_weekend",
];

/// Fixed-calendar business events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFlags {
    /// February
    pub is_carnival_month: bool,
    /// May and June
    pub is_graduation_season: bool,
    /// December 20-31
    pub is_near_year_end: bool,
    /// December 29-31
    pub is_year_end_week: bool,
    /// November and December
    pub is_corporate_season: bool,
}

impl EventFlags {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        let day = date.day();

        Self {
            is_carnival_month: month == 2,
            is_graduation_season: matches!(month, 5 | 6),
            is_near_year_end: month == 12 && day >= 20,
            is_year_end_week: month == 12 && day >= 29,
            is_corporate_season: matches!(month, 11 | 12),
        }
    }

    /// Values in [`EVENT_COLUMNS`] order
    pub fn values(&self) -> [f64; 5] {
        [
            flag(self.is_carnival_month),
            flag(self.is_graduation_season),
            flag(self.is_near_year_end),
            flag(self.is_year_end_week),
            flag(self.is_corporate_season),
        ]
    }
}

/// Column names produced by [`EventFlags::values`]
pub const EVENT_COLUMNS: [&str; 5] = [
    "is_carnival_month",
    "is_graduation_season",
    "is_near_year_end",
    "is_year_end_week",
    "is_corporate_season",
];

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_features() {
        // 2024-02-29 is a Thursday in a leap year
        let features = CalendarFeatures::from_date(date(2024, 2, 29));
        assert_eq!(features.day_of_week, 3);
        assert_eq!(features.month, 2);
        assert_eq!(features.quarter, 1);
        assert_eq!(features.iso_week, 9);
        assert_relative_eq!(features.day_of_month_norm, 1.0);
        assert!(!features.is_weekend);
    }

    #[test]
    fn test_cyclical_encoding_wraps() {
        let monday = CalendarFeatures::from_date(date(2024, 1, 1));
        assert_eq!(monday.day_of_week, 0);
        assert_relative_eq!(monday.day_of_week_sin, 0.0);
        assert_relative_eq!(monday.day_of_week_cos, 1.0);

        // December sits at angle 2*pi, same point as month 0
        let december = CalendarFeatures::from_date(date(2023, 12, 10));
        assert_relative_eq!(december.month_cos, 1.0);
        assert!(december.is_weekend);
    }

    #[test]
    fn test_event_flags() {
        let carnival = EventFlags::from_date(date(2024, 2, 10));
        assert!(carnival.is_carnival_month);
        assert!(!carnival.is_corporate_season);

        let graduation = EventFlags::from_date(date(2024, 6, 1));
        assert!(graduation.is_graduation_season);

        let mid_december = EventFlags::from_date(date(2024, 12, 15));
        assert!(mid_december.is_corporate_season);
        assert!(!mid_december.is_near_year_end);

        let christmas = EventFlags::from_date(date(2024, 12, 24));
        assert!(christmas.is_near_year_end);
        assert!(!christmas.is_year_end_week);

        let new_years_eve = EventFlags::from_date(date(2024, 12, 31));
        assert!(new_years_eve.is_near_year_end);
        assert!(new_years_eve.is_year_end_week);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2023, 2, 1)), 28);
        assert_eq!(days_in_month(date(2024, 2, 1)), 29);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
        assert_eq!(days_in_month(date(2024, 12, 1)), 31);
    }
}
