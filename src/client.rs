use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::decode::DeviceStatus;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    CONFIG_ENDPOINT, CONTROL_ENDPOINT, DEFAULT_BASE_URL, DEFAULT_LOGIN_SOURCE,
    DEFAULT_PROTOCOL_ID, Envelope, STATUS_ENDPOINT, config_body, control_body, mode_command,
    power_command, status_body, temperature_command,
};
use crate::session::{Reply, Session};
use crate::types::*;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ClientBuilder {
    credentials: Credentials,
    device_code: String,
    base_url: String,
    protocol_id: String,
    timeout: Duration,
    login_source: String,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl ClientBuilder {
    pub fn new(credentials: Credentials, device_code: impl Into<String>) -> Self {
        Self {
            credentials,
            device_code: device_code.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            protocol_id: DEFAULT_PROTOCOL_ID.to_string(),
            timeout: DEFAULT_TIMEOUT,
            login_source: DEFAULT_LOGIN_SOURCE.to_string(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn protocol_id(mut self, id: impl Into<String>) -> Self {
        self.protocol_id = id.into();
        self
    }

    /// Applies to every HTTP exchange, login included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn login_source(mut self, source: impl Into<String>) -> Self {
        self.login_source = source.into();
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<PhnixClient> {
        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(PhnixClient {
            session: Session::new(
                self.credentials,
                self.base_url,
                self.login_source,
                self.timeout,
                logger,
            ),
            device_code: self.device_code,
            protocol_id: self.protocol_id,
        })
    }
}

/// Why the server turned a request away.
enum Rejection {
    Status,
    Envelope(Envelope),
}

impl Rejection {
    fn into_error(self) -> Error {
        match self {
            Rejection::Status => Error::Auth("request rejected after re-login (HTTP 401)".into()),
            Rejection::Envelope(envelope) => {
                let message = envelope.message();
                Error::api(envelope.error_code, message)
            }
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Status => write!(f, "HTTP 401"),
            Rejection::Envelope(envelope) => write!(f, "{}", envelope.message()),
        }
    }
}

enum Outcome {
    Done(Envelope),
    Rejected(Rejection),
}

/// Client for one heat pump registered with the Phnix cloud.
///
/// All methods take `&self`; the client can be shared between tasks behind
/// an `Arc`.
pub struct PhnixClient {
    session: Session,
    device_code: String,
    protocol_id: String,
}

impl PhnixClient {
    pub fn builder(credentials: Credentials, device_code: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(credentials, device_code)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = ClientBuilder::new(config.credentials()?, config.device_code.clone())
            .protocol_id(config.protocol_id.clone())
            .timeout(config.timeout());
        if let Some(url) = &config.base_url {
            builder = builder.base_url(url.clone());
        }
        builder.build()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn device_code(&self) -> &str {
        &self.device_code
    }

    pub fn protocol_id(&self) -> &str {
        &self.protocol_id
    }

    /// Submits credentials now instead of on the first request.
    pub async fn login(&self) -> Result<SecretString> {
        let token = self.session.login().await?;
        info!(device = %self.device_code, "logged in to Phnix cloud");
        Ok(token)
    }

    pub async fn ensure_auth(&self) -> Result<()> {
        self.session.ensure_token().await.map(|_| ())
    }

    async fn attempt(
        &self,
        endpoint: &str,
        body: &Value,
        token: &SecretString,
    ) -> Result<Outcome> {
        Ok(match self.session.post(endpoint, body, Some(token)).await? {
            Reply::Unauthorized => Outcome::Rejected(Rejection::Status),
            Reply::Envelope(envelope) if envelope.is_auth_failure() => {
                Outcome::Rejected(Rejection::Envelope(envelope))
            }
            Reply::Envelope(envelope) => Outcome::Done(envelope),
        })
    }

    /// Posts `body` with the current token. An auth rejection triggers one
    /// re-login and one resend of the same body; whatever the resend yields
    /// is final.
    pub async fn send(&self, endpoint: &str, body: &Value) -> Result<Envelope> {
        let token = self.session.ensure_token().await?;

        let rejection = match self.attempt(endpoint, body, &token).await? {
            Outcome::Done(envelope) => return envelope.into_result(),
            Outcome::Rejected(rejection) => rejection,
        };

        warn!(endpoint, reason = %rejection, "token rejected, logging in again");
        let token = self.session.reauthenticate(&token).await?;

        match self.attempt(endpoint, body, &token).await? {
            Outcome::Done(envelope) => envelope.into_result(),
            Outcome::Rejected(rejection) => {
                warn!(endpoint, reason = %rejection, "fresh token rejected");
                self.session.discard(&token).await;
                Err(rejection.into_error())
            }
        }
    }

    async fn write(&self, action: &str, command: ControlCommand) -> Result<()> {
        self.session.log_command(action, &command);
        debug!(
            action,
            address = command.address,
            value = %command.value,
            "sending control command"
        );
        let body = control_body(&self.device_code, &self.protocol_id, &command);
        self.send(CONTROL_ENDPOINT, &body).await?;
        Ok(())
    }

    pub async fn set_power(&self, on: bool) -> Result<()> {
        self.write("set_power", power_command(on)).await
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.set_power(true).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_power(false).await
    }

    pub async fn set_mode(&self, mode: HeatPumpMode) -> Result<()> {
        self.write("set_mode", mode_command(mode)).await
    }

    /// Writes the setpoint for `mode` without checking its range. Fractional
    /// degrees are truncated; NaN and infinities are refused.
    pub async fn set_temperature(&self, value: f64, mode: HeatPumpMode) -> Result<()> {
        self.write("set_temperature", temperature_command(value, mode)?)
            .await
    }

    /// Like [`set_temperature`](Self::set_temperature), but rejects values
    /// outside the mode's range before anything is sent.
    pub async fn set_target_temperature(&self, value: f64, mode: HeatPumpMode) -> Result<()> {
        mode.validate_setpoint(value)?;
        self.set_temperature(value, mode).await
    }

    /// `Off` powers the unit down. `Cool` and `Heat` power it up first and
    /// then select the mode.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        match mode {
            HvacMode::Off => self.set_power(false).await,
            HvacMode::Cool => self.power_up_in(HeatPumpMode::Cool).await,
            HvacMode::Heat => self.power_up_in(HeatPumpMode::Heat).await,
        }
    }

    async fn power_up_in(&self, mode: HeatPumpMode) -> Result<()> {
        self.set_power(true).await?;
        self.set_mode(mode).await
    }

    pub async fn get_status(&self) -> Result<Vec<TelemetryRecord>> {
        let body = status_body(&self.device_code, &self.protocol_id);
        let envelope = self.send(STATUS_ENDPOINT, &body).await?;
        let records: Vec<TelemetryRecord> = envelope.data_list()?;
        debug!(count = records.len(), "status poll");
        self.session.log_poll(&records);
        Ok(records)
    }

    pub async fn get_config(&self, address: &str) -> Result<Vec<Value>> {
        let body = config_body(&self.device_code, address);
        let envelope = self.send(CONFIG_ENDPOINT, &body).await?;
        envelope.data_list()
    }

    /// Polls the unit and decodes the result.
    pub async fn status(&self) -> Result<DeviceStatus> {
        let records = self.get_status().await?;
        Ok(DeviceStatus::from_records(&records))
    }

    pub fn close(&self) {
        self.session.close();
    }
}
