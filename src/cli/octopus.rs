use clap::Parser;
use reqwest::Url;

use crate::{
    api::{
        client,
        octopus::{Api, GroupBy},
    },
    prelude::*,
};

#[derive(Parser)]
pub struct OctopusArgs {
    #[clap(long = "octopus-api-key", env = "OCTOPUS_API_KEY")]
    api_key: String,

    /// Meter Point Reference Number of the gas meter.
    #[clap(long, env = "MPRN")]
    mprn: String,

    #[clap(long = "gas-serial-number", env = "GAS_SERIAL_NUMBER")]
    serial_number: String,

    /// Consumption aggregation period, fewer intervals means fewer pages.
    #[clap(long = "octopus-group-by", env = "OCTOPUS_GROUP_BY", default_value = "quarter")]
    group_by: GroupBy,

    #[clap(
        long = "octopus-base-url",
        env = "OCTOPUS_BASE_URL",
        default_value = "https://api.octopus.energy/v1/"
    )]
    base_url: Url,
}

impl OctopusArgs {
    pub fn new_client(&self) -> Result<Api> {
        Api::try_new(
            client::try_new()?,
            self.api_key.clone(),
            &self.base_url,
            &self.mprn,
            &self.serial_number,
            self.group_by,
        )
    }
}
