use chrono::Local;
use clap::Parser;

use crate::{
    cli::{heartbeat::HeartbeatArgs, octopus::OctopusArgs, tado::TadoArgs, time_delta},
    core::synchronizer::Synchronizer,
    prelude::*,
    tables::build_report_table,
};

#[derive(Parser)]
pub struct SyncArgs {
    #[clap(flatten)]
    octopus: OctopusArgs,

    #[clap(flatten)]
    tado: TadoArgs,

    /// Only readings within this period before today may serve as the anchor.
    #[clap(long, env = "ELIGIBILITY_WINDOW", default_value = "700days")]
    eligibility_window: humantime::Duration,

    /// When the latest reading is older than this, catch up one month at a time.
    #[clap(long, env = "GAP_THRESHOLD", default_value = "30days")]
    gap_threshold: humantime::Duration,

    /// Compute the new reading, but do not submit it.
    #[clap(long)]
    dry_run: bool,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl SyncArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let feed = self.octopus.new_client()?;
        let meter = self.tado.connect().await?;
        let report = Synchronizer::builder()
            .feed(&feed)
            .meter(&meter)
            .today(Local::now().date_naive())
            .eligibility_window(time_delta(self.eligibility_window)?)
            .gap_threshold(time_delta(self.gap_threshold)?)
            .dry_run(self.dry_run)
            .build()
            .run()
            .await?;
        println!("{}", build_report_table(&report));
        self.heartbeat.send().await;
        Ok(())
    }
}
