use clap::Parser;

use crate::{
    api::{
        client,
        tado::{Api, DeviceFlow, Session},
    },
    prelude::*,
};

#[derive(Parser)]
pub struct TadoArgs {
    /// Refresh token printed by a previous run. Without it, the device has to be authorized in a
    /// browser.
    #[clap(long = "tado-refresh-token", env = "TADO_REFRESH_TOKEN")]
    refresh_token: Option<String>,

    /// Home to submit the readings to, defaults to the first home on the account.
    #[clap(long = "tado-home-id", env = "TADO_HOME_ID")]
    home_id: Option<u64>,
}

impl TadoArgs {
    #[instrument(skip_all)]
    pub async fn connect(&self) -> Result<Api> {
        let client = client::try_new()?;
        let session = match &self.refresh_token {
            Some(refresh_token) => Session::refresh(&client, refresh_token).await?,
            None => DeviceFlow::start(&client).await?.complete().await?,
        };
        // The old refresh token is no longer valid:
        println!("tado° refresh token for the next run: {}", session.refresh_token);
        Api::connect(client, &session, self.home_id).await
    }
}
