use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::{
    cli::{heartbeat::HeartbeatArgs, octopus::OctopusArgs, tado::TadoArgs},
    core::{
        consumption::{ConsumptionFeed, ConsumptionFilter},
        reading::Reading,
        synchronizer::MeterReadings,
    },
    prelude::*,
    tables::build_readings_table,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub async fn run(self) -> Result {
        match self.command {
            BurrowCommand::Readings(args) => args.run().await,
            BurrowCommand::Consumption(args) => args.run().await,
            BurrowCommand::Submit(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// Print the meter readings submitted to tado°.
    Readings(BurrowReadingsArgs),

    /// Sum up the gas consumption known to Octopus Energy.
    Consumption(BurrowConsumptionArgs),

    /// Submit a meter reading to tado° manually.
    Submit(BurrowSubmitArgs),
}

#[derive(Parser)]
struct BurrowReadingsArgs {
    #[clap(flatten)]
    tado: TadoArgs,
}

impl BurrowReadingsArgs {
    async fn run(self) -> Result {
        let readings = self.tado.connect().await?.get_readings().await?;
        println!("{}", build_readings_table(&readings));
        Ok(())
    }
}

#[derive(Parser)]
struct BurrowConsumptionArgs {
    #[clap(flatten)]
    octopus: OctopusArgs,

    /// Start date, inclusive. Without it, the entire history is summed up.
    #[clap(long)]
    since: Option<NaiveDate>,

    #[clap(long, requires = "since")]
    until: Option<NaiveDate>,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl BurrowConsumptionArgs {
    fn filter(&self) -> Result<ConsumptionFilter> {
        match (self.since, self.until) {
            (None, None) => Ok(ConsumptionFilter::Unbounded),
            (Some(since), None) => Ok(ConsumptionFilter::Since(since)),
            (Some(since), Some(until)) => ConsumptionFilter::try_between(since, until),
            (None, Some(_)) => bail!("`--until` requires `--since`"),
        }
    }

    async fn run(self) -> Result {
        let filter = self.filter()?;
        let total = self.octopus.new_client()?.fetch_total(filter).await;
        println!("Consumption ({filter}): {total:.3}");
        self.heartbeat.send().await;
        Ok(())
    }
}

#[derive(Parser)]
struct BurrowSubmitArgs {
    #[clap(flatten)]
    tado: TadoArgs,

    #[clap(long)]
    reading: u64,

    /// Defaults to today.
    #[clap(long)]
    date: Option<NaiveDate>,
}

impl BurrowSubmitArgs {
    async fn run(self) -> Result {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        self.tado.connect().await?.submit(Reading::new(date, self.reading)).await
    }
}
