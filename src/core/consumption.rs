use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::prelude::*;

/// Part of the consumption feed to sum up.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsumptionFilter {
    Unbounded,
    Since(NaiveDate),
    Between { from: NaiveDate, to: NaiveDate },
}

impl ConsumptionFilter {
    pub fn try_between(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        ensure!(from <= to, "the period end `{to}` precedes its start `{from}`");
        Ok(Self::Between { from, to })
    }

    #[must_use]
    pub const fn period_from(self) -> Option<NaiveDate> {
        match self {
            Self::Unbounded => None,
            Self::Since(from) | Self::Between { from, .. } => Some(from),
        }
    }

    #[must_use]
    pub const fn period_to(self) -> Option<NaiveDate> {
        match self {
            Self::Unbounded | Self::Since(_) => None,
            Self::Between { to, .. } => Some(to),
        }
    }
}

impl Display for ConsumptionFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(f, "all time"),
            Self::Since(from) => write!(f, "since {from}"),
            Self::Between { from, to } => write!(f, "{from}..{to}"),
        }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct ConsumptionInterval {
    #[serde(rename = "interval_start")]
    pub start: DateTime<FixedOffset>,

    #[serde(rename = "interval_end")]
    pub end: DateTime<FixedOffset>,

    pub consumption: f64,
}

/// Opaque continuation token. The feed gets it back exactly as it handed it out.
#[derive(Clone, Debug, Eq, PartialEq, derive_more::Display, derive_more::From)]
pub struct Cursor(String);

impl Cursor {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Missing, `null`, and empty cursors all mean «no more pages».
    fn deserialize_optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Self>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .filter(|cursor| !cursor.is_empty())
            .map(Self))
    }
}

#[must_use]
#[derive(Debug, Deserialize)]
pub struct ConsumptionPage {
    pub results: Vec<ConsumptionInterval>,

    #[serde(default, deserialize_with = "Cursor::deserialize_optional")]
    pub next: Option<Cursor>,
}

/// Non-success response from the feed.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("status code {status} ({text})")]
pub struct TransportError {
    pub status: u16,
    pub text: String,
}

#[async_trait]
pub trait ConsumptionFeed: Sync {
    /// Sum up the consumption over all the pages matching the filter.
    ///
    /// Pagination stops at the first failed page, and the total accumulated so far is returned.
    #[instrument(skip_all, fields(filter = %filter))]
    async fn fetch_total(&self, filter: ConsumptionFilter) -> f64 {
        let mut total = 0.0;
        let mut n_pages = 0_usize;
        let mut page = self.first_page(filter).await;

        loop {
            let ConsumptionPage { results, next } = match page {
                Ok(page) => page,
                Err(error) => {
                    error!(n_pages, total, "failed to fetch the consumption: {error:#}");
                    break;
                }
            };
            n_pages += 1;
            for interval in results {
                total += interval.consumption;
                debug!(
                    start = %interval.start,
                    end = %interval.end,
                    consumption = interval.consumption,
                    total,
                );
            }
            let Some(cursor) = next else {
                break;
            };
            page = self.next_page(&cursor).await;
        }

        info!(n_pages, total, "fetched");
        total
    }

    async fn first_page(&self, filter: ConsumptionFilter) -> Result<ConsumptionPage>;

    async fn next_page(&self, cursor: &Cursor) -> Result<ConsumptionPage>;
}
