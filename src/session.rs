use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::logger::MessageLogger;
use crate::protocol::{Envelope, LOGIN_ENDPOINT, TOKEN_HEADER, hash_password, login_body};
use crate::types::{ControlCommand, Credentials, TelemetryRecord};
use crate::{Error, Result};

enum Connection {
    Idle,
    Open(reqwest::Client),
    Closed,
}

/// What came back from one HTTP exchange, before the retry policy looks at it.
pub(crate) enum Reply {
    Unauthorized,
    Envelope(Envelope),
}

/// Owns the credentials, the current token and the HTTP connection pool.
///
/// The token lives behind an async mutex that is held for the whole login
/// exchange, so concurrent callers that find no token queue up behind a
/// single credential submission and then reuse its result.
pub struct Session {
    credentials: Credentials,
    base_url: String,
    login_source: String,
    timeout: Duration,
    token: tokio::sync::Mutex<Option<SecretString>>,
    connection: Mutex<Connection>,
    logger: Option<Mutex<MessageLogger>>,
}

impl Session {
    pub(crate) fn new(
        credentials: Credentials,
        base_url: String,
        login_source: String,
        timeout: Duration,
        logger: Option<MessageLogger>,
    ) -> Self {
        Self {
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            login_source,
            timeout,
            token: tokio::sync::Mutex::new(None),
            connection: Mutex::new(Connection::Idle),
            logger: logger.map(Mutex::new),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            *self.connection.lock().unwrap_or_else(PoisonError::into_inner),
            Connection::Closed
        )
    }

    /// Current token without triggering a login.
    pub async fn token(&self) -> Option<SecretString> {
        self.token.lock().await.clone()
    }

    pub async fn ensure_token(&self) -> Result<SecretString> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.submit_login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Always submits credentials, replacing any held token.
    pub async fn login(&self) -> Result<SecretString> {
        let mut guard = self.token.lock().await;
        *guard = None;
        let token = self.submit_login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    /// Replaces a token the server just rejected. If another caller already
    /// swapped it out, that newer token is reused instead of logging in again.
    pub(crate) async fn reauthenticate(&self, rejected: &SecretString) -> Result<SecretString> {
        let mut guard = self.token.lock().await;
        if let Some(current) = guard.as_ref()
            && !same_token(current, rejected)
        {
            debug!("token already refreshed by a concurrent request");
            return Ok(current.clone());
        }
        *guard = None;

        if let Credentials::Token(_) = self.credentials {
            return Err(Error::Auth(
                "pre-issued token was rejected and no password is configured".to_string(),
            ));
        }

        let token = self.submit_login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Forgets `rejected` if it is still the held token, so the next request
    /// starts with a fresh login.
    pub(crate) async fn discard(&self, rejected: &SecretString) {
        let mut guard = self.token.lock().await;
        if guard.as_ref().is_some_and(|current| same_token(current, rejected)) {
            *guard = None;
        }
    }

    /// Drops the connection pool. Later requests fail with `Error::Closed`.
    pub fn close(&self) {
        let mut conn = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *conn {
            Connection::Closed => trace!("session already closed"),
            Connection::Open(_) => debug!("closing HTTP connection pool"),
            Connection::Idle => debug!("closing unused session"),
        }
        *conn = Connection::Closed;
    }

    fn http(&self) -> Result<reqwest::Client> {
        let mut conn = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match &*conn {
            Connection::Open(client) => Ok(client.clone()),
            Connection::Closed => Err(Error::Closed),
            Connection::Idle => {
                let client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .user_agent(concat!("phnix-cloud/", env!("CARGO_PKG_VERSION")))
                    .build()?;
                debug!(base_url = %self.base_url, "opened HTTP connection pool");
                *conn = Connection::Open(client.clone());
                Ok(client)
            }
        }
    }

    async fn submit_login(&self) -> Result<SecretString> {
        let (username, password) = match &self.credentials {
            Credentials::Token(token) => return Ok(token.clone()),
            Credentials::Password { username, password } => (username, password),
        };

        debug!(user = %username, "logging in");
        let body = login_body(&self.login_source, username, &hash_password(password));

        let reply = self
            .post(LOGIN_ENDPOINT, &body, None)
            .await
            .map_err(|e| match e {
                Error::Api { code, message } => Error::Auth(match code {
                    Some(code) => format!("login rejected ({code}): {message}"),
                    None => format!("login rejected: {message}"),
                }),
                other => other,
            })?;

        let envelope = match reply {
            Reply::Unauthorized => {
                return Err(Error::Auth("credentials rejected (HTTP 401)".to_string()));
            }
            Reply::Envelope(envelope) => envelope,
        };

        if !envelope.is_success() {
            let message = envelope.message();
            warn!(code = ?envelope.error_code, "login refused by server");
            return Err(Error::Auth(match envelope.error_code {
                Some(code) => format!("login refused ({code}): {message}"),
                None => format!("login refused: {message}"),
            }));
        }

        let token = envelope
            .token()
            .map(|t| SecretString::from(t.to_string()))
            .ok_or_else(|| Error::Auth("login response carried no token".to_string()))?;
        debug!("login succeeded");
        Ok(token)
    }

    /// One POST to `endpoint`. HTTP 401 is reported as `Reply::Unauthorized`;
    /// any other non-success status becomes `Error::Api` unless its body is an
    /// envelope asking for a fresh login.
    pub(crate) async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        token: Option<&SecretString>,
    ) -> Result<Reply> {
        let http = self.http()?;
        let url = format!("{}{}", self.base_url, endpoint);
        let request_id = Uuid::new_v4().to_string();

        if let Some(logger) = &self.logger {
            logger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .log_request(&request_id, endpoint, body);
        }

        trace!(url = %url, id = %request_id, "POST");
        let mut request = http
            .post(&url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .json(body);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token.expose_secret());
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if let Some(logger) = &self.logger {
            let logged = serde_json::from_str(&text).unwrap_or(Value::Null);
            logger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .log_response(&request_id, endpoint, status.as_u16(), &logged);
        }

        if status == StatusCode::UNAUTHORIZED {
            debug!(url = %url, "HTTP 401");
            return Ok(Reply::Unauthorized);
        }

        if !status.is_success() {
            return match Envelope::parse(&text) {
                Ok(envelope) if envelope.is_auth_failure() => Ok(Reply::Envelope(envelope)),
                Ok(envelope) if envelope.error_code.is_some() || envelope.error_msg.is_some() => {
                    Err(Error::api(envelope.error_code.clone(), envelope.message()))
                }
                _ => Err(Error::api(
                    Some(status.as_u16().to_string()),
                    status.canonical_reason().unwrap_or("unexpected HTTP status"),
                )),
            };
        }

        Envelope::parse(&text).map(Reply::Envelope)
    }

    pub(crate) fn log_command(&self, action: &str, command: &ControlCommand) {
        if let Some(logger) = &self.logger {
            logger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .log_command(action, command);
        }
    }

    pub(crate) fn log_poll(&self, records: &[TelemetryRecord]) {
        if let Some(logger) = &self.logger {
            logger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .log_poll(records);
        }
    }
}

fn same_token(a: &SecretString, b: &SecretString) -> bool {
    a.expose_secret() == b.expose_secret()
}
