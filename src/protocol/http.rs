// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Z-Way controller REST API.

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;

use super::session::{SessionState, SessionStore, redact};
use super::ControllerClient;
use crate::command::RunCommand;
use crate::error::{AuthError, Result, TransportError};
use crate::telemetry::SnapshotSet;

/// Base path of the automation API (status, login, profiles).
const AUTOMATION_API: &str = "ZAutomation/api/v1";
/// Path of the full data snapshot.
const DATA_PATH: &str = "ZWaveAPI/Data/0";
/// Base path of command class invocations.
const RUN_PATH: &str = "ZWave.zway/Run";
/// Name of the session cookie and header.
const SESSION_COOKIE: &str = "ZWAYSession";
const CLIENT_USER_AGENT: &str = "zway-pump-bridge";

// ============================================================================
// ZWayConfig - Connection parameters
// ============================================================================

/// Configuration for a Z-Way controller connection.
///
/// # Examples
///
/// ```
/// use zway_pump_bridge::protocol::ZWayConfig;
/// use std::time::Duration;
///
/// let config = ZWayConfig::new("192.168.1.20:8083")
///     .with_credentials("admin", "secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://192.168.1.20:8083");
/// ```
#[derive(Clone)]
pub struct ZWayConfig {
    host: String,
    credentials: (String, String),
    timeout: Duration,
}

impl ZWayConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the specified host.
    ///
    /// The host may carry a scheme and port (`http://zway.local:8083/`).
    /// Without a scheme, plain HTTP is used.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credentials: (String::new(), String::new()),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.credentials = (user.into(), pass.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host as configured.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the login user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.credentials.0
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }

    /// Creates a [`ZWayClient`] persisting its session in `store`.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client<S>(self, store: S) -> Result<ZWayClient>
    where
        S: SessionStore + 'static,
    {
        if self.host.trim().is_empty() {
            return Err(TransportError::InvalidAddress("host is required".to_string()).into());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(TransportError::Http)?;

        let base_url = self.base_url();
        let (user, pass) = self.credentials;

        Ok(ZWayClient {
            base_url,
            client,
            user,
            pass,
            store: Box::new(store),
            session: Mutex::new(SessionState::NoSession),
            auth_gate: tokio::sync::Mutex::new(()),
        })
    }
}

impl std::fmt::Debug for ZWayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZWayConfig")
            .field("host", &self.host)
            .field("user", &self.credentials.0)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ZWayClient - Session-managing controller client
// ============================================================================

/// Controller client speaking the Z-Way HTTP API.
///
/// The client holds one session. On first use it validates a persisted token
/// with a status call and logs in when there is none or it was rejected. A
/// request answered with 401 or 403 triggers one fresh login and one retry.
///
/// # Examples
///
/// ```no_run
/// use zway_pump_bridge::protocol::{ControllerClient, MemorySessionStore, ZWayConfig};
///
/// # async fn example() -> zway_pump_bridge::Result<()> {
/// let client = ZWayConfig::new("http://192.168.1.20:8083")
///     .with_credentials("admin", "secret")
///     .into_client(MemorySessionStore::new())?;
///
/// let snapshot = client.fetch_snapshot().await?;
/// println!("{} devices", snapshot.devices().count());
/// # Ok(())
/// # }
/// ```
pub struct ZWayClient {
    base_url: String,
    client: Client,
    user: String,
    pass: String,
    store: Box<dyn SessionStore>,
    session: Mutex<SessionState>,
    // Serializes login flows; never held by plain requests.
    auth_gate: tokio::sync::Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    sid: Option<String>,
}

impl ZWayClient {
    /// Returns the base URL of the controller.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the current session state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session.lock().clone()
    }

    fn set_state(&self, state: SessionState) {
        tracing::trace!(state = ?state, "Session state");
        *self.session.lock() = state;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(token) = token {
            builder = builder
                .header(COOKIE, format!("{SESSION_COOKIE}={token}"))
                .header(SESSION_COOKIE, token);
        }
        builder
    }

    /// Returns a valid session token, validating or logging in as needed.
    async fn ensure_session(&self) -> Result<String> {
        if let Some(token) = self.session.lock().token() {
            return Ok(token.to_string());
        }

        let _gate = self.auth_gate.lock().await;
        // Another flow may have finished while we waited.
        if let Some(token) = self.session.lock().token() {
            return Ok(token.to_string());
        }

        tracing::debug!("No session held, looking for a persisted one");
        if let Some(token) = self.store.load() {
            tracing::info!(session = %redact(&token), "Found persisted session, validating");
            self.set_state(SessionState::Validating);
            if self.validate(&token).await {
                tracing::info!("Persisted session is valid");
                self.set_state(SessionState::Valid(token.clone()));
                return Ok(token);
            }
        }

        self.login().await
    }

    async fn validate(&self, token: &str) -> bool {
        let path = format!("{AUTOMATION_API}/status");
        match self.request(Method::GET, &path, Some(token)).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::info!(status = response.status().as_u16(), "Persisted session was rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to validate persisted session");
                false
            }
        }
    }

    /// Submits credentials. Must be called with the auth gate held.
    async fn login(&self) -> Result<String> {
        tracing::info!(user = %self.user, "Logging in to controller");
        self.set_state(SessionState::LoggingIn);

        let path = format!("{AUTOMATION_API}/login");
        let body = serde_json::json!({ "login": self.user, "password": self.pass });
        let response = match self.request(Method::POST, &path, None).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                self.set_state(SessionState::NoSession);
                return Err(TransportError::Http(e).into());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!(
                status = status.as_u16(),
                "Login rejected, check the configured credentials"
            );
            self.set_state(SessionState::NoSession);
            return Err(AuthError::LoginRejected {
                status: status.as_u16(),
            }
            .into());
        }

        let cookie_token = session_cookie(&response);
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                self.set_state(SessionState::NoSession);
                return Err(TransportError::Http(e).into());
            }
        };
        let data = serde_json::from_str::<LoginResponse>(&text)
            .ok()
            .and_then(|r| r.data);

        let Some(token) = cookie_token.or_else(|| data.as_ref().and_then(|d| d.sid.clone())) else {
            self.set_state(SessionState::NoSession);
            return Err(AuthError::MissingSessionToken.into());
        };

        tracing::info!(session = %redact(&token), "Session established");
        self.set_state(SessionState::Valid(token.clone()));

        if let Err(e) = self.store.save(&token) {
            tracing::warn!(error = %e, "Failed to persist session");
        }

        match data.and_then(|d| d.id).map(|id| user_id(&id)) {
            Some(user_id) => self.extend_session(&user_id, &token).await,
            None => tracing::warn!("Login response has no user id, session may expire"),
        }

        Ok(token)
    }

    /// Asks the controller not to expire the token. Failure is not fatal.
    async fn extend_session(&self, user_id: &str, token: &str) {
        let path = format!(
            "{AUTOMATION_API}/profiles/{}/token/{}",
            urlencoding::encode(user_id),
            urlencoding::encode(&redact(token))
        );
        tracing::debug!(path = %path, "Extending session lifetime");

        match self.request(Method::PUT, &path, Some(token)).json(&serde_json::json!({})).send().await {
            Ok(response) if response.status().as_u16() < 300 => {
                tracing::info!("Session set as non-expiring, the password may be removed from the configuration");
            }
            Ok(response) => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    "Unable to set session as non-expiring, re-authentication delays may occur"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Unable to set session as non-expiring, re-authentication delays may occur"
                );
            }
        }
    }

    /// Drops a rejected token and logs in again, once.
    async fn relogin(&self, rejected: &str) -> Result<String> {
        let _gate = self.auth_gate.lock().await;
        if let Some(token) = self.session.lock().token()
            && token != rejected
        {
            return Ok(token.to_string());
        }
        self.set_state(SessionState::NoSession);
        self.login().await
    }

    /// Sends an authenticated request and returns the body.
    async fn send(&self, method: Method, path: &str, body: bool) -> Result<String> {
        let token = self.ensure_session().await?;
        tracing::debug!(method = %method, path = %path, "Sending controller request");

        let response = self.dispatch(method.clone(), path, &token, body).await?;
        if !is_session_failure(response.status()) {
            return read_body(response, path).await;
        }

        tracing::warn!(
            status = response.status().as_u16(),
            session = %redact(&token),
            "Session rejected, logging in again"
        );
        let token = self.relogin(&token).await?;
        let response = self.dispatch(method, path, &token, body).await?;
        let status = response.status();
        if is_session_failure(status) {
            self.set_state(SessionState::NoSession);
            return Err(AuthError::SessionRejected {
                status: status.as_u16(),
            }
            .into());
        }
        read_body(response, path).await
    }

    async fn dispatch(&self, method: Method, path: &str, token: &str, body: bool) -> Result<Response> {
        let mut builder = self.request(method, path, Some(token));
        if body {
            builder = builder.json(&serde_json::json!({}));
        }
        Ok(builder.send().await.map_err(TransportError::Http)?)
    }
}

impl ControllerClient for ZWayClient {
    async fn fetch_snapshot(&self) -> Result<SnapshotSet> {
        let body = self.send(Method::GET, DATA_PATH, false).await?;
        let snapshot = SnapshotSet::from_json(&body)?;
        tracing::trace!(
            update_time = snapshot.update_time(),
            devices = snapshot.devices().count(),
            "Fetched snapshot"
        );
        Ok(snapshot)
    }

    async fn run_command(&self, command: &RunCommand) -> Result<()> {
        let path = format!("{RUN_PATH}/{}", command.run_path());
        self.send(Method::POST, &path, true).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ZWayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZWayClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("session", &*self.session.lock())
            .finish_non_exhaustive()
    }
}

fn is_session_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn read_body(response: Response, path: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        }
        .into());
    }
    Ok(response.text().await.map_err(TransportError::Http)?)
}

/// Extracts the session token from the `Set-Cookie` headers.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE && !value.trim().is_empty())
                .then(|| value.trim().to_string())
        })
}

fn user_id(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
