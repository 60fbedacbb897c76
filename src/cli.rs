mod burrow;
mod heartbeat;
mod octopus;
mod sync;
mod tado;

use chrono::TimeDelta;
use clap::{Parser, Subcommand};

use crate::{
    cli::{burrow::BurrowArgs, sync::SyncArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// Also log every consumption interval.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    #[must_use]
    pub const fn log_level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: compute the next gas meter reading and submit it to tado°.
    #[clap(name = "sync")]
    Sync(Box<SyncArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Sync(args) => args.run().await,
            Self::Burrow(args) => args.run().await,
        }
    }
}

fn time_delta(duration: humantime::Duration) -> Result<TimeDelta> {
    TimeDelta::from_std(duration.into()).context("the duration is too long")
}
