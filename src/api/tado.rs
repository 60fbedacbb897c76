//! tado° Energy IQ meter readings.

pub mod auth;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub use self::auth::{DeviceFlow, Session};
use crate::{
    core::{reading::Reading, synchronizer::MeterReadings},
    prelude::*,
};

const ME_URL: &str = "https://my.tado.com/api/v2/me";
const ENERGY_IQ_URL: &str = "https://energy-insights.tado.com/api";

pub struct Api {
    client: Client,
    access_token: String,
    home_id: u64,
}

impl Api {
    /// Use the specified home, or look up the account's first one.
    #[instrument(skip_all, fields(home_id = ?home_id))]
    pub async fn connect(client: Client, session: &Session, home_id: Option<u64>) -> Result<Self> {
        let access_token = session.access_token.clone();
        let home_id = match home_id {
            Some(home_id) => home_id,
            None => {
                let me: Me = client
                    .get(ME_URL)
                    .bearer_auth(&access_token)
                    .send()
                    .await
                    .context("failed to request the account details")?
                    .error_for_status()
                    .context("failed to get the account details")?
                    .json()
                    .await
                    .context("failed to deserialize the account details")?;
                me.first_home_id()?
            }
        };
        Ok(Self { client, access_token, home_id })
    }

    fn meter_readings_url(&self) -> String {
        format!("{ENERGY_IQ_URL}/homes/{}/meterReadings", self.home_id)
    }
}

#[async_trait]
impl MeterReadings for Api {
    #[instrument(skip_all, fields(home_id = self.home_id))]
    async fn get_readings(&self) -> Result<Vec<Reading>> {
        let response: MeterReadingsResponse = self
            .client
            .get(self.meter_readings_url())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("failed to request the meter readings")?
            .error_for_status()
            .context("failed to get the meter readings")?
            .json()
            .await
            .context("failed to deserialize the meter readings")?;
        info!(n_readings = response.readings.len(), "fetched");
        Ok(response.readings)
    }

    #[instrument(skip_all, fields(home_id = self.home_id, reading = %reading))]
    async fn submit(&self, reading: Reading) -> Result {
        let response = self
            .client
            .post(self.meter_readings_url())
            .bearer_auth(&self.access_token)
            .json(&reading)
            .send()
            .await
            .context("failed to submit the meter reading")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("tado° rejected the reading with status code {status} ({text})");
        }
        info!("submitted");
        Ok(())
    }
}

#[derive(Deserialize)]
struct MeterReadingsResponse {
    readings: Vec<Reading>,
}

#[derive(Deserialize)]
struct Me {
    homes: Vec<Home>,
}

#[derive(Deserialize)]
struct Home {
    id: u64,
    name: String,
}

impl Me {
    fn first_home_id(&self) -> Result<u64> {
        let home = self.homes.first().context("there are no homes on the account")?;
        if self.homes.len() > 1 {
            warn!(
                n_homes = self.homes.len(),
                home.id,
                %home.name,
                "multiple homes on the account, using the first one",
            );
        }
        Ok(home.id)
    }
}
