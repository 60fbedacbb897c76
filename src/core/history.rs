use chrono::{NaiveDate, TimeDelta};

use crate::{core::reading::Reading, prelude::*};

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct History {
    /// Oldest reading that is still recent enough to extrapolate from.
    pub earliest_eligible: Reading,

    pub latest: Reading,
}

#[derive(Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ScanError {
    #[display("no readings have been submitted yet")]
    NoReadings,

    #[display("no reading in {since}..{until} to anchor the new reading at")]
    NoEligibleAnchor { since: NaiveDate, until: NaiveDate },
}

/// Find the latest reading and the anchor in `[today - eligibility_window, latest.date)`.
///
/// Readings older than the window typically come from a previous supplier, whose consumption
/// the feed knows nothing about.
pub fn scan(
    readings: &[Reading],
    eligibility_window: TimeDelta,
    today: NaiveDate,
) -> Result<History, ScanError> {
    let latest =
        readings.iter().copied().max_by_key(|reading| reading.date).ok_or(ScanError::NoReadings)?;
    let since = today.checked_sub_signed(eligibility_window).unwrap_or(NaiveDate::MIN);
    let earliest_eligible = readings
        .iter()
        .copied()
        .filter(|reading| (since..latest.date).contains(&reading.date))
        .min_by_key(|reading| reading.date)
        .ok_or(ScanError::NoEligibleAnchor { since, until: latest.date })?;
    info!(%earliest_eligible, %latest, n_readings = readings.len(), "scanned");
    Ok(History { earliest_eligible, latest })
}
