use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cumulative meter reading as Tado Energy IQ knows it.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Reading {
    pub date: NaiveDate,

    #[serde(rename = "reading")]
    pub value: u64,
}

impl Reading {
    pub const fn new(date: NaiveDate, value: u64) -> Self {
        Self { date, value }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.value, self.date)
    }
}

/// Anchor to extrapolate from and the date the new reading is made for.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReadingWindow {
    pub anchor: Reading,
    pub target_date: NaiveDate,
}
