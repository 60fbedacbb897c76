//! OAuth 2.0 device authorization grant against the tado° identity provider.

use std::{
    fmt::{Debug, Formatter},
    time::Duration,
};

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_with::serde_as;
use tokio::time::{Instant, sleep};

use crate::prelude::*;

/// Public client ID of the tado° web app.
const CLIENT_ID: &str = "1bb50063-6b0c-4d11-bd99-387f4a91cc46";

const DEVICE_AUTHORIZE_URL: &str = "https://login.tado.com/oauth2/device_authorize";
const TOKEN_URL: &str = "https://login.tado.com/oauth2/token";
const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Added to the polling interval on `slow_down`.
const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

#[derive(Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AuthorizationError {
    #[display("the device has not been authorized in time")]
    Pending,

    #[display("the device authorization was denied")]
    Denied,

    #[display("the device code has expired")]
    Expired,
}

#[must_use]
#[serde_as]
#[derive(Clone, Deserialize)]
pub struct Session {
    pub access_token: String,

    /// Rotated on every use.
    pub refresh_token: String,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(rename = "expires_in")]
    pub lifetime: Duration,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("lifetime", &self.lifetime).finish_non_exhaustive()
    }
}

impl Session {
    #[instrument(skip_all)]
    pub async fn refresh(client: &Client, refresh_token: &str) -> Result<Self> {
        info!("refreshing the session…");
        client
            .post(TOKEN_URL)
            .query(&[
                ("client_id", CLIENT_ID),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .context("failed to request the token")?
            .error_for_status()
            .context("failed to refresh the session, the refresh token may have expired")?
            .json()
            .await
            .context("failed to deserialize the token")
    }
}

#[must_use]
pub enum Status {
    Pending,
    Completed(Session),
}

#[serde_as]
#[derive(Deserialize)]
struct DeviceAuthorization {
    device_code: String,

    user_code: String,

    #[serde_as(as = "serde_with::DisplayFromStr")]
    verification_uri_complete: Url,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    expires_in: Duration,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "DeviceAuthorization::default_interval")]
    interval: Duration,
}

impl DeviceAuthorization {
    const fn default_interval() -> Duration {
        Duration::from_secs(5)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Granted(Session),
    Failed { error: String, error_description: Option<String> },
}

enum Poll {
    Pending,
    SlowDown,
    Granted(Session),
}

impl TokenResponse {
    fn into_poll(self) -> Result<Poll> {
        match self {
            Self::Granted(session) => Ok(Poll::Granted(session)),
            Self::Failed { error, error_description } => match error.as_str() {
                "authorization_pending" => Ok(Poll::Pending),
                "slow_down" => Ok(Poll::SlowDown),
                "access_denied" => Err(AuthorizationError::Denied.into()),
                "expired_token" => Err(AuthorizationError::Expired.into()),
                _ => Err(anyhow!(
                    "token request failed: {error} ({})",
                    error_description.as_deref().unwrap_or("no description")
                )),
            },
        }
    }
}

/// Pending device authorization: the user confirms it in a browser.
pub struct DeviceFlow<'a> {
    client: &'a Client,
    authorization: DeviceAuthorization,
    polling_interval: Duration,
}

impl<'a> DeviceFlow<'a> {
    #[instrument(skip_all)]
    pub async fn start(client: &'a Client) -> Result<Self> {
        let authorization: DeviceAuthorization = client
            .post(DEVICE_AUTHORIZE_URL)
            .query(&[("client_id", CLIENT_ID), ("scope", "offline_access")])
            .send()
            .await
            .context("failed to request the device authorization")?
            .error_for_status()
            .context("the device authorization request failed")?
            .json()
            .await
            .context("failed to deserialize the device authorization")?;
        info!(
            user_code = %authorization.user_code,
            expires_in = ?authorization.expires_in,
            "open {} to authorize",
            authorization.verification_uri_complete,
        );
        let polling_interval = authorization.interval;
        Ok(Self { client, authorization, polling_interval })
    }

    /// Poll the token endpoint once.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn status(&mut self) -> Result<Status> {
        let body = self
            .client
            .post(TOKEN_URL)
            .query(&[
                ("client_id", CLIENT_ID),
                ("device_code", self.authorization.device_code.as_str()),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ])
            .send()
            .await
            .context("failed to request the token")?
            .text()
            .await
            .context("failed to read the token response")?;
        let response = serde_json::from_str::<TokenResponse>(&body)
            .with_context(|| format!("unexpected token response: `{body}`"))?;
        Ok(self.advance(response.into_poll()?))
    }

    fn advance(&mut self, poll: Poll) -> Status {
        match poll {
            Poll::Granted(session) => Status::Completed(session),
            Poll::Pending => Status::Pending,
            Poll::SlowDown => {
                self.polling_interval += SLOW_DOWN_INCREMENT;
                warn!(polling_interval = ?self.polling_interval, "slowing down");
                Status::Pending
            }
        }
    }

    /// Wait until the user authorizes the device.
    #[instrument(skip_all)]
    pub async fn complete(mut self) -> Result<Session> {
        let deadline = Instant::now() + self.authorization.expires_in;
        while Instant::now() < deadline {
            sleep(self.polling_interval).await;
            if let Status::Completed(session) = self.status().await? {
                info!("authorized");
                return Ok(session);
            }
            debug!("still pending…");
        }
        Err(AuthorizationError::Pending.into())
    }
}
