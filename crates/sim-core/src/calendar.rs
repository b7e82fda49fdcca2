//! Simulated calendar with a fixed month-length table (no leap years).

use chrono::Month;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// Days per month, January first. February is always 28 days.
pub const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Accepted year range for constructed dates.
pub const MIN_YEAR: i32 = -9999;
pub const MAX_YEAR: i32 = 9999;

/// Length of `month` (1-based), or `None` when the month is outside [1, 12].
pub fn days_in_month(month: u32) -> Option<u32> {
    month
        .checked_sub(1)
        .and_then(|i| DAYS_IN_MONTH.get(i as usize))
        .copied()
}

/// A normalized simulation date. Construction goes through [`GameDate::new`], so
/// `month` is always in [1, 12] and `day` within that month's length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDate", into = "RawDate")]
pub struct GameDate {
    year: i32,
    month: u32,
    day: u32,
}

#[derive(Serialize, Deserialize)]
struct RawDate {
    year: i32,
    month: u32,
    day: u32,
}

impl TryFrom<RawDate> for GameDate {
    type Error = ValidationError;

    fn try_from(raw: RawDate) -> Result<Self, Self::Error> {
        GameDate::new(raw.year, raw.month, raw.day)
    }
}

impl From<GameDate> for RawDate {
    fn from(d: GameDate) -> Self {
        RawDate {
            year: d.year,
            month: d.month,
            day: d.day,
        }
    }
}

impl GameDate {
    /// Validate and build a date.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError::YearOutOfRange(year));
        }
        let len = days_in_month(month).ok_or(ValidationError::InvalidMonth(month))?;
        if day == 0 || day > len {
            return Err(ValidationError::InvalidDay { month, day });
        }
        Ok(Self { year, month, day })
    }

    /// January 1st of `year`, clamped to [`MIN_YEAR`, `MAX_YEAR`].
    pub const fn start_of_year(year: i32) -> Self {
        let year = if year < MIN_YEAR {
            MIN_YEAR
        } else if year > MAX_YEAR {
            MAX_YEAR
        } else {
            year
        };
        Self {
            year,
            month: 1,
            day: 1,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Advance by `days`, rolling day overflow into the month and month overflow
    /// into the year. The year saturates at `i32::MAX`.
    pub fn increment(self, days: u32) -> Self {
        let Self {
            mut year,
            mut month,
            day,
        } = self;
        let mut day = u64::from(day) + u64::from(days);
        loop {
            let len = u64::from(DAYS_IN_MONTH[month as usize - 1]);
            if day <= len {
                break;
            }
            day -= len;
            month += 1;
            if month > 12 {
                month = 1;
                year = year.saturating_add(1);
            }
        }
        // day <= 31 after the loop
        Self {
            year,
            month,
            day: day as u32,
        }
    }
}

/// Free-function form of [`GameDate::increment`].
pub fn increment(date: GameDate, days: u32) -> GameDate {
    date.increment(days)
}

impl fmt::Display for GameDate {
    /// Renders as e.g. `Jan 1, 2000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| &m.name()[..3])
            .unwrap_or("???");
        write!(f, "{} {}, {}", name, self.day, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> GameDate {
        GameDate::new(y, m, day).unwrap()
    }

    #[test]
    fn end_of_month_rolls_to_next() {
        assert_eq!(d(2000, 1, 31).increment(1), d(2000, 2, 1));
        assert_eq!(d(2000, 4, 30).increment(1), d(2000, 5, 1));
    }

    #[test]
    fn end_of_year_rolls_to_january() {
        assert_eq!(increment(d(2000, 12, 31), 1), d(2001, 1, 1));
    }

    #[test]
    fn february_has_no_leap_day() {
        assert_eq!(d(2000, 2, 28).increment(1), d(2000, 3, 1));
        assert_eq!(d(2004, 2, 28).increment(1), d(2004, 3, 1));
    }

    #[test]
    fn zero_days_is_identity() {
        assert_eq!(d(1999, 7, 15).increment(0), d(1999, 7, 15));
    }

    #[test]
    fn full_year_advances_year_only() {
        assert_eq!(d(2000, 3, 10).increment(365), d(2001, 3, 10));
    }

    #[test]
    fn multi_year_jump() {
        assert_eq!(d(2000, 1, 1).increment(365 * 3 + 31), d(2003, 2, 1));
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert_eq!(GameDate::new(2000, 0, 1), Err(ValidationError::InvalidMonth(0)));
        assert_eq!(GameDate::new(2000, 13, 1), Err(ValidationError::InvalidMonth(13)));
        assert_eq!(
            GameDate::new(2000, 2, 29),
            Err(ValidationError::InvalidDay { month: 2, day: 29 })
        );
        assert!(GameDate::new(2000, 1, 0).is_err());
        assert_eq!(
            GameDate::new(i32::MAX, 12, 31),
            Err(ValidationError::YearOutOfRange(i32::MAX))
        );
        assert_eq!(
            GameDate::new(MIN_YEAR - 1, 1, 1),
            Err(ValidationError::YearOutOfRange(MIN_YEAR - 1))
        );
        assert_eq!(GameDate::start_of_year(i32::MAX), d(MAX_YEAR, 1, 1));
    }

    #[test]
    fn last_accepted_year_rolls_over_without_panicking() {
        assert_eq!(d(MAX_YEAR, 12, 31).increment(1), GameDate::start_of_year(MAX_YEAR).increment(365));
        assert_eq!(d(MAX_YEAR, 12, 31).increment(1).year(), MAX_YEAR + 1);
        let far = d(MAX_YEAR, 12, 31).increment(365 * 10_000);
        assert_eq!(far, GameDate::start_of_year(MAX_YEAR).increment(365 * 10_001 - 1));
        assert_eq!(far.year(), MAX_YEAR + 10_000);
    }

    #[test]
    fn deserialize_rejects_out_of_range_year() {
        let bad = serde_json::from_str::<GameDate>(r#"{"year":2147483647,"month":12,"day":31}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn display_uses_short_month_name() {
        assert_eq!(d(2000, 1, 1).to_string(), "Jan 1, 2000");
        assert_eq!(d(2013, 9, 30).to_string(), "Sep 30, 2013");
    }

    #[test]
    fn deserialize_validates() {
        let ok: GameDate = serde_json::from_str(r#"{"year":2000,"month":2,"day":28}"#).unwrap();
        assert_eq!(ok, d(2000, 2, 28));
        let bad = serde_json::from_str::<GameDate>(r#"{"year":2000,"month":2,"day":30}"#);
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn increment_stays_normalized(y in 1900i32..2100, m in 1u32..=12, day in 1u32..=28, n in 0u32..5000) {
            let out = d(y, m, day).increment(n);
            prop_assert!((1..=12).contains(&out.month()));
            prop_assert!(out.day() >= 1);
            prop_assert!(out.day() <= days_in_month(out.month()).unwrap());
            prop_assert!(out >= d(y, m, day));
        }

        #[test]
        fn increment_is_additive(y in 1900i32..2100, m in 1u32..=12, day in 1u32..=28, a in 0u32..800, b in 0u32..800) {
            let start = d(y, m, day);
            prop_assert_eq!(start.increment(a).increment(b), start.increment(a + b));
        }
    }
}
