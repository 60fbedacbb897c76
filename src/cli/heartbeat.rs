use clap::Parser;
use reqwest::Url;

use crate::{api::client, prelude::*};

#[derive(Parser)]
pub struct HeartbeatArgs {
    /// Pinged after a successful run, for example, a Healthchecks.io check.
    #[clap(long = "heartbeat-url", env = "HEARTBEAT_URL")]
    url: Option<Url>,
}

impl HeartbeatArgs {
    /// Send the heartbeat, if configured. Failures are only logged.
    pub async fn send(&self) {
        if let Some(url) = &self.url
            && let Err(error) = Self::try_send(url.clone()).await
        {
            warn!("failed to send the heartbeat: {error:#}");
        }
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn try_send(url: Url) -> Result {
        info!("sending a heartbeat…");
        client::try_new()?.post(url).send().await?.error_for_status()?;
        Ok(())
    }
}
