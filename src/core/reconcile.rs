use crate::{
    core::reading::{Reading, ReadingWindow},
    prelude::*,
};

#[derive(Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ReconcileError {
    #[display("new reading {new_reading} is lower than the latest submitted reading {latest}")]
    NotMonotonic { new_reading: u64, latest: Reading },
}

/// Extrapolate the anchor by the consumption and make sure the meter does not run backwards.
///
/// Tado only accepts whole units, so the new reading is truncated.
pub fn reconcile(
    window: ReadingWindow,
    consumption: f64,
    latest: Reading,
) -> Result<Reading, ReconcileError> {
    let candidate = Reading::new(window.target_date, extrapolate(window.anchor.value, consumption));
    if candidate.value < latest.value {
        warn!(
            new_reading = candidate.value,
            latest = latest.value,
            "the new reading is lower than the latest submitted one, the feed may lack data",
        );
        error!(%candidate, %latest, "refusing to submit a decreasing reading");
        return Err(ReconcileError::NotMonotonic { new_reading: candidate.value, latest });
    }
    info!(anchor = %window.anchor, consumption, %candidate, "reconciled");
    Ok(candidate)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn extrapolate(anchor: u64, consumption: f64) -> u64 {
    (anchor as f64 + consumption) as u64
}
