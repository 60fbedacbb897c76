//! [Octopus Energy](https://developer.octopus.energy/rest/guides/endpoints) consumption client.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use clap::ValueEnum;
use reqwest::{Client, StatusCode, Url};

use crate::{
    core::consumption::{
        ConsumptionFeed,
        ConsumptionFilter,
        ConsumptionPage,
        Cursor,
        TransportError,
    },
    prelude::*,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum GroupBy {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
}

impl GroupBy {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
        }
    }
}

pub struct Api {
    client: Client,
    api_key: String,
    consumption_url: Url,
    group_by: GroupBy,
}

impl Api {
    /// Build the client for the gas meter consumption resource.
    pub fn try_new(
        client: Client,
        api_key: String,
        base_url: &Url,
        mprn: &str,
        serial_number: &str,
        group_by: GroupBy,
    ) -> Result<Self> {
        let mut consumption_url = base_url.clone();
        consumption_url
            .path_segments_mut()
            .map_err(|()| anyhow!("`{base_url}` cannot be a base URL"))?
            .pop_if_empty()
            .extend(["gas-meter-points", mprn, "meters", serial_number, "consumption", ""]);
        Ok(Self { client, api_key, consumption_url, group_by })
    }

    fn first_page_url(&self, filter: ConsumptionFilter) -> Url {
        let mut pairs = vec![("group_by", self.group_by.as_str().to_string())];
        if let Some(from) = filter.period_from() {
            pairs.push(("period_from", format_period(from)));
        }
        if let Some(to) = filter.period_to() {
            pairs.push(("period_to", format_period(to)));
        }
        let mut url = self.consumption_url.clone();
        url.query_pairs_mut().extend_pairs(pairs);
        url
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(url = %url))]
    async fn get(&self, url: Url) -> Result<ConsumptionPage> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.api_key, None::<&str>)
            .send()
            .await
            .with_context(|| format!("failed to request `{url}`"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read the response from `{url}`"))?;
        parse_page(status, body).with_context(|| format!("failed to fetch `{url}`"))
    }
}

/// Non-success statuses turn into [`TransportError`], carrying the response body.
fn parse_page(status: StatusCode, body: String) -> Result<ConsumptionPage> {
    if !status.is_success() {
        return Err(TransportError { status: status.as_u16(), text: body }.into());
    }
    serde_json::from_str(&body).context("failed to deserialize the consumption page")
}

#[async_trait]
impl ConsumptionFeed for Api {
    async fn first_page(&self, filter: ConsumptionFilter) -> Result<ConsumptionPage> {
        self.get(self.first_page_url(filter)).await
    }

    async fn next_page(&self, cursor: &Cursor) -> Result<ConsumptionPage> {
        let url = Url::parse(cursor.as_str()).with_context(|| format!("invalid cursor `{cursor}`"))?;
        self.get(url).await
    }
}

/// Midnight UTC in ISO 8601.
fn format_period(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).and_utc().to_rfc3339_opts(SecondsFormat::Secs, true)
}
