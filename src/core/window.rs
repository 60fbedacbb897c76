use chrono::{Months, NaiveDate, TimeDelta};

use crate::{core::consumption::ConsumptionFilter, prelude::*};

/// Date to make the new reading for.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Target {
    /// The latest reading is too old: catch up one calendar month at a time.
    OneMonthAfter(NaiveDate),

    /// The latest reading is recent: read the meter today.
    Today(NaiveDate),
}

impl Target {
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        match self {
            Self::OneMonthAfter(date) | Self::Today(date) => date,
        }
    }

    /// Consumption filter covering the period from the anchor until the target.
    pub fn filter(self, anchor_date: NaiveDate) -> Result<ConsumptionFilter> {
        match self {
            Self::OneMonthAfter(to) => ConsumptionFilter::try_between(anchor_date, to),
            Self::Today(_) => Ok(ConsumptionFilter::Since(anchor_date)),
        }
    }
}

/// Choose the target date.
///
/// One month after 31 January is the last day of February: the day of month is clamped to the
/// length of the target month. The target never lies in the future.
pub fn plan(latest_date: NaiveDate, today: NaiveDate, gap_threshold: TimeDelta) -> Target {
    let target = if today - latest_date > gap_threshold {
        latest_date
            .checked_add_months(Months::new(1))
            .filter(|date| *date <= today)
            .map_or(Target::Today(today), Target::OneMonthAfter)
    } else {
        Target::Today(today)
    };
    debug!(%latest_date, %today, ?target, "planned");
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAP_THRESHOLD: TimeDelta = TimeDelta::days(30);

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn plan_one_month_ahead_ok() {
        assert_eq!(
            plan(date(2025, 1, 15), date(2025, 3, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2025, 2, 15)),
        );
    }

    #[test]
    fn plan_across_new_year_ok() {
        assert_eq!(
            plan(date(2024, 12, 20), date(2025, 4, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2025, 1, 20)),
        );
    }

    #[test]
    fn plan_clamps_day_of_month() {
        assert_eq!(
            plan(date(2025, 1, 31), date(2025, 6, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2025, 2, 28)),
        );
        assert_eq!(
            plan(date(2024, 1, 30), date(2024, 6, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2024, 2, 29)),
        );
        assert_eq!(
            plan(date(2025, 3, 31), date(2025, 6, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2025, 4, 30)),
        );
    }

    #[test]
    fn plan_first_of_long_month_moves_forward() {
        assert_eq!(
            plan(date(2025, 1, 1), date(2025, 3, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2025, 2, 1)),
        );
    }

    #[test]
    fn plan_today_within_threshold() {
        let today = date(2025, 3, 31);
        assert_eq!(plan(date(2025, 3, 1), today, GAP_THRESHOLD), Target::Today(today));
        assert_eq!(plan(today, today, GAP_THRESHOLD), Target::Today(today));
    }

    #[test]
    fn plan_just_over_threshold() {
        assert_eq!(
            plan(date(2025, 3, 1), date(2025, 4, 1), GAP_THRESHOLD),
            Target::OneMonthAfter(date(2025, 4, 1)),
        );
    }

    #[test]
    fn plan_never_targets_future() {
        let today = date(2025, 6, 15);
        assert_eq!(plan(date(2025, 6, 10), today, TimeDelta::days(1)), Target::Today(today));
        assert_eq!(
            plan(date(2025, 5, 15), today, TimeDelta::days(1)),
            Target::OneMonthAfter(today),
        );
    }

    #[test]
    fn filter_ok() -> Result {
        let anchor_date = date(2024, 2, 24);
        assert_eq!(
            Target::OneMonthAfter(date(2025, 2, 15)).filter(anchor_date)?,
            ConsumptionFilter::Between { from: anchor_date, to: date(2025, 2, 15) },
        );
        assert_eq!(
            Target::Today(date(2025, 6, 1)).filter(anchor_date)?,
            ConsumptionFilter::Since(anchor_date),
        );
        Ok(())
    }
}
