use async_trait::async_trait;
use bon::Builder;
use chrono::{NaiveDate, TimeDelta};

use crate::{
    core::{
        consumption::ConsumptionFeed,
        history::{History, scan},
        reading::{Reading, ReadingWindow},
        reconcile::reconcile,
        window::{Target, plan},
    },
    prelude::*,
};

/// Meter reading history on the thermostat side.
#[async_trait]
pub trait MeterReadings: Sync {
    async fn get_readings(&self) -> Result<Vec<Reading>>;

    async fn submit(&self, reading: Reading) -> Result;
}

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Submitted(Reading),
    DryRun(Reading),

    /// There is already a reading for the target date or later.
    UpToDate,
}

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Report {
    pub history: History,
    pub target: Target,
    pub consumption: Option<f64>,
    pub outcome: Outcome,
}

#[derive(Builder)]
pub struct Synchronizer<'a, F, M> {
    feed: &'a F,
    meter: &'a M,
    today: NaiveDate,
    eligibility_window: TimeDelta,
    gap_threshold: TimeDelta,

    #[builder(default)]
    dry_run: bool,
}

impl<F: ConsumptionFeed, M: MeterReadings> Synchronizer<'_, F, M> {
    #[instrument(skip_all, fields(today = %self.today, dry_run = self.dry_run))]
    pub async fn run(self) -> Result<Report> {
        let readings =
            self.meter.get_readings().await.context("failed to fetch the submitted readings")?;
        let history = scan(&readings, self.eligibility_window, self.today)?;
        let target = plan(history.latest.date, self.today, self.gap_threshold);

        if target.date() <= history.latest.date {
            info!(latest = %history.latest, "already up to date");
            return Ok(Report { history, target, consumption: None, outcome: Outcome::UpToDate });
        }

        let anchor = history.earliest_eligible;
        let consumption = self.feed.fetch_total(target.filter(anchor.date)?).await;
        let candidate = reconcile(
            ReadingWindow { anchor, target_date: target.date() },
            consumption,
            history.latest,
        )?;

        let outcome = if self.dry_run {
            info!(%candidate, "dry run, not submitting");
            Outcome::DryRun(candidate)
        } else {
            info!(%candidate, "submitting…");
            self.meter.submit(candidate).await.context("failed to submit the new reading")?;
            Outcome::Submitted(candidate)
        };
        Ok(Report { history, target, consumption: Some(consumption), outcome })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::{
        consumption::{
            ConsumptionFilter,
            tests::{FakeFeed, Request},
        },
        history::ScanError,
        reconcile::ReconcileError,
    };

    struct FakeMeter {
        readings: Mutex<Vec<Reading>>,
        submitted: Mutex<Vec<Reading>>,
    }

    impl FakeMeter {
        fn new(readings: impl Into<Vec<Reading>>) -> Self {
            Self { readings: Mutex::new(readings.into()), submitted: Mutex::default() }
        }

        fn submitted(&self) -> Vec<Reading> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MeterReadings for FakeMeter {
        async fn get_readings(&self) -> Result<Vec<Reading>> {
            Ok(self.readings.lock().unwrap().clone())
        }

        async fn submit(&self, reading: Reading) -> Result {
            self.readings.lock().unwrap().push(reading);
            self.submitted.lock().unwrap().push(reading);
            Ok(())
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn anchor() -> Reading {
        Reading::new(date(2024, 2, 24), 1000)
    }

    async fn run(feed: &FakeFeed, meter: &FakeMeter, today: NaiveDate) -> Result<Report> {
        Synchronizer::builder()
            .feed(feed)
            .meter(meter)
            .today(today)
            .eligibility_window(TimeDelta::days(2 * 365 - 30))
            .gap_threshold(TimeDelta::days(30))
            .build()
            .run()
            .await
    }

    #[tokio::test]
    async fn catch_up_one_month_ok() -> Result {
        let feed = FakeFeed::new(vec![vec![20.5], vec![30.2]]);
        let meter = FakeMeter::new([anchor(), Reading::new(date(2025, 1, 15), 1030)]);

        let report = run(&feed, &meter, date(2025, 6, 15)).await?;

        let expected = Reading::new(date(2025, 2, 15), 1050);
        assert_eq!(report.outcome, Outcome::Submitted(expected));
        assert_eq!(meter.submitted(), [expected]);
        assert_eq!(
            feed.requests.lock().unwrap()[0],
            Request::First(ConsumptionFilter::Between { from: anchor().date, to: date(2025, 2, 15) }),
        );
        Ok(())
    }

    #[tokio::test]
    async fn recent_reading_submits_today_ok() -> Result {
        let today = date(2025, 6, 15);
        let feed = FakeFeed::new(vec![vec![60.0, 12.0]]);
        let meter = FakeMeter::new([Reading::new(date(2025, 6, 1), 1065), anchor()]);

        let report = run(&feed, &meter, today).await?;

        assert_eq!(report.target, Target::Today(today));
        assert_eq!(meter.submitted(), [Reading::new(today, 1072)]);
        assert_eq!(
            *feed.requests.lock().unwrap(),
            [Request::First(ConsumptionFilter::Since(anchor().date))],
        );
        Ok(())
    }

    #[tokio::test]
    async fn decreasing_reading_is_not_submitted() {
        let feed = FakeFeed::new(vec![vec![5.0]]);
        let meter = FakeMeter::new([anchor(), Reading::new(date(2025, 1, 15), 1030)]);

        let error = run(&feed, &meter, date(2025, 6, 15)).await.unwrap_err();

        assert_eq!(
            error.downcast_ref::<ReconcileError>(),
            Some(&ReconcileError::NotMonotonic {
                new_reading: 1005,
                latest: Reading::new(date(2025, 1, 15), 1030),
            }),
        );
        assert!(meter.submitted().is_empty());
    }

    #[tokio::test]
    async fn dry_run_does_not_submit() -> Result {
        let feed = FakeFeed::new(vec![vec![50.7]]);
        let meter = FakeMeter::new([anchor(), Reading::new(date(2025, 1, 15), 1030)]);

        let report = Synchronizer::builder()
            .feed(&feed)
            .meter(&meter)
            .today(date(2025, 6, 15))
            .eligibility_window(TimeDelta::days(700))
            .gap_threshold(TimeDelta::days(30))
            .dry_run(true)
            .build()
            .run()
            .await?;

        assert_eq!(report.outcome, Outcome::DryRun(Reading::new(date(2025, 2, 15), 1050)));
        assert!(meter.submitted().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_anchor_aborts_before_fetching() {
        let feed = FakeFeed::new(vec![vec![1.0]]);
        let meter = FakeMeter::new([Reading::new(date(2025, 6, 1), 1000)]);

        let error = run(&feed, &meter, date(2025, 6, 15)).await.unwrap_err();

        assert!(matches!(
            error.downcast_ref::<ScanError>(),
            Some(ScanError::NoEligibleAnchor { .. }),
        ));
        assert!(feed.requests.lock().unwrap().is_empty());
        assert!(meter.submitted().is_empty());
    }

    #[tokio::test]
    async fn second_run_on_same_day_is_up_to_date() -> Result {
        let today = date(2025, 6, 15);
        let feed = FakeFeed::new(vec![vec![72.0]]);
        let meter = FakeMeter::new([anchor(), Reading::new(date(2025, 6, 1), 1065)]);

        assert_eq!(
            run(&feed, &meter, today).await?.outcome,
            Outcome::Submitted(Reading::new(today, 1072)),
        );
        let report = run(&feed, &meter, today).await?;

        assert_eq!(report.outcome, Outcome::UpToDate);
        assert_eq!(report.history.latest, Reading::new(today, 1072));
        assert_eq!(meter.submitted().len(), 1);
        assert_eq!(feed.requests.lock().unwrap().len(), 1, "the second run must not fetch");
        Ok(())
    }

    #[tokio::test]
    async fn short_gap_threshold_does_not_submit_future_reading() -> Result {
        let today = date(2025, 6, 15);
        let feed = FakeFeed::new(vec![vec![40.0]]);
        let meter = FakeMeter::new([anchor(), Reading::new(date(2025, 6, 10), 1030)]);

        let report = Synchronizer::builder()
            .feed(&feed)
            .meter(&meter)
            .today(today)
            .eligibility_window(TimeDelta::days(700))
            .gap_threshold(TimeDelta::days(1))
            .build()
            .run()
            .await?;

        assert_eq!(report.target, Target::Today(today));
        assert_eq!(meter.submitted(), [Reading::new(today, 1040)]);
        assert_eq!(
            *feed.requests.lock().unwrap(),
            [Request::First(ConsumptionFilter::Since(anchor().date))],
        );
        Ok(())
    }

    #[tokio::test]
    async fn repeated_catch_up_moves_forward() -> Result {
        let feed = FakeFeed::new(vec![vec![50.7]]);
        let meter = FakeMeter::new([anchor(), Reading::new(date(2025, 1, 15), 1030)]);
        let today = date(2025, 6, 15);

        let _ = run(&feed, &meter, today).await?;
        let _ = run(&feed, &meter, today).await?;

        assert_eq!(
            meter.submitted(),
            [Reading::new(date(2025, 2, 15), 1050), Reading::new(date(2025, 3, 15), 1050)],
        );
        Ok(())
    }
}
