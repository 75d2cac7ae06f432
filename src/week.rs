use crate::TdigestError;
use chrono::{Datelike, Duration, NaiveDate};

/// A Monday..Sunday calendar week, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    /// The week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// The week ending on the most recent Sunday on or before `today`.
    pub fn last_completed(today: NaiveDate) -> Self {
        // Sunday: num_days_from_sunday() == 0, so the week ends today.
        let end = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        Self {
            start: end - Duration::days(6),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYYMMDD-YYYYMMDD`, used in stored file names.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

/// Resolve `--week-of` (YYYY-MM-DD) or fall back to the last completed week.
pub fn resolve_week(week_of: Option<&str>, today: NaiveDate) -> Result<WeekRange, TdigestError> {
    match week_of {
        Some(s) => {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                TdigestError::Config(format!("invalid --week-of {s:?} (expected YYYY-MM-DD): {e}"))
            })?;
            Ok(WeekRange::containing(date))
        }
        None => Ok(WeekRange::last_completed(today)),
    }
}
