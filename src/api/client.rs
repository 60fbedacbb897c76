use std::time::Duration;

use clap::crate_name;
use reqwest::Client;

use crate::prelude::*;

/// Build a default client.
pub fn try_new() -> Result<Client> {
    Ok(Client::builder().user_agent(crate_name!()).timeout(Duration::from_secs(10)).build()?)
}
