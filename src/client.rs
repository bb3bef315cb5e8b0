// MIT License - Copyright (c) 2026 Peter Wright
// Sector Alarm REST client

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::{ArmMode, SessionConfig};
use crate::constants::{
    IMAGE_FIELD, JSON_CONTENT_TYPE, LOCK_STATUS_PATH, LOGIN_PATH, PANEL_LIST_PATH, TOKEN_FIELD,
};
use crate::endpoints::{ActionEndpoint, DataEndpoint, HttpMethod};
use crate::error::{RequestError, Result, SectorError, ValidationError};
use crate::session::Session;
use crate::snapshot::PanelSnapshot;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    user_id: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PanelRequest<'a> {
    panel_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ArmRequest<'a> {
    arm_code: &'a str,
    panel_id: &'a str,
    arm_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DisarmRequest<'a> {
    disarm_code: &'a str,
    panel_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LockRequest<'a> {
    lock_serial: &'a str,
    panel_code: &'a str,
    panel_id: &'a str,
    serial_no: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SmartplugRequest<'a> {
    panel_id: &'a str,
    device_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CameraRequest<'a> {
    panel_id: &'a str,
    serial_no: &'a str,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one panel on the Sector Alarm API.
///
/// `login` must succeed before anything else returns data. Requests made
/// without a token are logged and answered with absence, and nothing is
/// sent. The client never logs in again by itself; when the token expires
/// server-side, requests start failing until the owner calls `login` again.
///
/// # Example
///
/// ```no_run
/// use sector_alarm::{ArmMode, SectorAlarmClient, SessionConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = SessionConfig::builder()
///         .email("me@example.com")
///         .password("secret")
///         .panel_id("01234567")
///         .panel_code("1234")
///         .build();
///
///     let mut client = SectorAlarmClient::new(config)?;
///     client.login().await?;
///
///     let snapshot = client.retrieve_all_data().await;
///     println!("Lock status: {}", snapshot.lock_status());
///
///     if !client.arm_system(ArmMode::Total).await {
///         eprintln!("arming failed");
///     }
///     Ok(())
/// }
/// ```
pub struct SectorAlarmClient {
    http: Client,
    config: SessionConfig,
    session: Session,
}

impl SectorAlarmClient {
    pub fn new(config: SessionConfig) -> Result<Self> {
        for (name, value) in [
            ("email", &config.email),
            ("password", &config.password),
            ("panel_id", &config.panel_id),
        ] {
            if value.is_empty() {
                return Err(SectorError::InvalidConfig {
                    details: format!("{name} is empty"),
                });
            }
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            session: Session::new(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token()
    }

    /// Check a set of credentials the way a setup form would: log in,
    /// fetch everything once, log out.
    pub async fn validate_credentials(
        config: SessionConfig,
    ) -> std::result::Result<(), ValidationError> {
        let mut client = Self::new(config)?;
        client.login().await?;
        let snapshot = client.retrieve_all_data().await;
        debug!("Validation retrieved {} data entries", snapshot.len());
        client.logout().await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Authenticate and store the bearer token.
    ///
    /// Every failure (bad status, no token, timeout, transport error) comes
    /// back as [`SectorError::Authentication`].
    pub async fn login(&mut self) -> Result<()> {
        let url = self.config.url(LOGIN_PATH);
        let payload = LoginRequest {
            user_id: &self.config.email,
            password: &self.config.password,
        };

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(login_transport_error)?;

        if response.status() != StatusCode::OK {
            error!("Login failed with status code {}", response.status().as_u16());
            return Err(SectorError::authentication("Invalid credentials"));
        }

        let data: Value = response.json().await.map_err(login_transport_error)?;
        let token = data
            .get(TOKEN_FIELD)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                error!("Login failed: No access token received");
                SectorError::authentication("Invalid credentials")
            })?;

        self.session.authenticate(token)?;
        info!("Logged in to Sector Alarm as {}", self.config.email);
        Ok(())
    }

    /// Tell the server to end the session.
    ///
    /// The stored token is left in place: the client stays "authenticated"
    /// locally and later calls fail server-side until `login` runs again.
    pub async fn logout(&self) -> bool {
        let url = ActionEndpoint::Logout.url(&self.config);
        let ok = self.post(&url, &serde_json::json!({})).await.is_some();
        if ok {
            info!("Logged out");
        }
        ok
    }

    // -----------------------------------------------------------------------
    // Request executor
    // -----------------------------------------------------------------------

    async fn execute(&self, request: RequestBuilder) -> std::result::Result<Value, RequestError> {
        let headers = self
            .session
            .headers()
            .ok_or(RequestError::NotAuthenticated)?;

        let response = request
            .headers(headers.clone())
            .send()
            .await
            .map_err(RequestError::from_reqwest)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status { status, body });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains(JSON_CONTENT_TYPE) {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::NotJson { content_type, body });
        }

        let bytes = response.bytes().await.map_err(RequestError::from_reqwest)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::Empty);
        }
        match serde_json::from_slice(&bytes).map_err(RequestError::Decode)? {
            Value::Null => Err(RequestError::Empty),
            value => Ok(value),
        }
    }

    /// GET with the session headers. `None` means "no data, already logged".
    pub async fn get(&self, url: &str) -> Option<Value> {
        match self.execute(self.http.get(url)).await {
            Ok(value) => Some(value),
            Err(e) => {
                error!("GET request to {url}: {e}");
                None
            }
        }
    }

    /// POST a JSON body with the session headers. `None` means "no data,
    /// already logged".
    pub async fn post(&self, url: &str, payload: &impl Serialize) -> Option<Value> {
        match self.execute(self.http.post(url).json(payload)).await {
            Ok(value) => Some(value),
            Err(e) => {
                error!("POST request to {url}: {e}");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Data retrieval
    // -----------------------------------------------------------------------

    /// Fetch every data endpoint plus the lock status.
    pub async fn retrieve_all_data(&self) -> PanelSnapshot {
        self.retrieve_data(&DataEndpoint::ALL).await
    }

    /// Fetch the given endpoints in order, then the lock status.
    ///
    /// One endpoint failing never stops the rest; it is just missing from
    /// the snapshot. Empty answers (`[]`, `{}`, `""`, `0`, `false`) are
    /// treated as no data.
    pub async fn retrieve_data(&self, endpoints: &[DataEndpoint]) -> PanelSnapshot {
        let mut data = BTreeMap::new();

        for endpoint in endpoints {
            let url = endpoint.url(&self.config);
            let response = match endpoint.method() {
                HttpMethod::Get => self.get(&url).await,
                HttpMethod::Post => {
                    let payload = PanelRequest {
                        panel_id: &self.config.panel_id,
                    };
                    self.post(&url, &payload).await
                }
            };

            match response.filter(has_content) {
                Some(value) => {
                    data.insert(endpoint.key().to_string(), value);
                }
                None => info!("No data retrieved for {}", endpoint.key()),
            }
        }

        let lock_status = self.get_lock_status().await;
        PanelSnapshot::new(data, lock_status)
    }

    /// Lock status for the panel, or an empty array on failure.
    pub async fn get_lock_status(&self) -> Value {
        let url = format!(
            "{}?panelId={}",
            self.config.url(LOCK_STATUS_PATH),
            self.config.panel_id
        );
        match self.get(&url).await.filter(has_content) {
            Some(value) => value,
            None => {
                error!("Failed to retrieve lock status");
                Value::Array(Vec::new())
            }
        }
    }

    /// Panel ids available to the logged-in account.
    pub async fn get_panel_list(&self) -> Vec<String> {
        let url = self.config.url(PANEL_LIST_PATH);
        let Some(response) = self.get(&url).await.filter(has_content) else {
            error!("Failed to retrieve any panels");
            return Vec::new();
        };
        debug!("Panel list: {response}");
        extract_panel_ids(&response)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    async fn execute_action(
        &self,
        endpoint: ActionEndpoint,
        payload: &impl Serialize,
        what: &str,
    ) -> bool {
        let url = endpoint.url(&self.config);
        if self.post(&url, payload).await.is_some() {
            debug!("{what}: success");
            true
        } else {
            error!("Failed to {what}");
            false
        }
    }

    pub async fn arm_system(&self, mode: ArmMode) -> bool {
        let payload = ArmRequest {
            arm_code: &self.config.panel_code,
            panel_id: &self.config.panel_id,
            arm_type: mode.as_str(),
        };
        self.execute_action(ActionEndpoint::Arm, &payload, &format!("arm system ({mode})"))
            .await
    }

    pub async fn disarm_system(&self) -> bool {
        let payload = DisarmRequest {
            disarm_code: &self.config.panel_code,
            panel_id: &self.config.panel_id,
        };
        self.execute_action(ActionEndpoint::Disarm, &payload, "disarm system")
            .await
    }

    pub async fn lock_door(&self, serial_no: &str) -> bool {
        let payload = self.lock_request(serial_no);
        self.execute_action(ActionEndpoint::Lock, &payload, &format!("lock door {serial_no}"))
            .await
    }

    pub async fn unlock_door(&self, serial_no: &str) -> bool {
        let payload = self.lock_request(serial_no);
        self.execute_action(
            ActionEndpoint::Unlock,
            &payload,
            &format!("unlock door {serial_no}"),
        )
        .await
    }

    fn lock_request<'a>(&'a self, serial_no: &'a str) -> LockRequest<'a> {
        LockRequest {
            lock_serial: serial_no,
            panel_code: &self.config.panel_code,
            panel_id: &self.config.panel_id,
            serial_no,
        }
    }

    pub async fn turn_on_smartplug(&self, plug_id: &str) -> bool {
        let payload = SmartplugRequest {
            panel_id: &self.config.panel_id,
            device_id: plug_id,
        };
        self.execute_action(
            ActionEndpoint::SmartplugOn,
            &payload,
            &format!("turn on smart plug {plug_id}"),
        )
        .await
    }

    pub async fn turn_off_smartplug(&self, plug_id: &str) -> bool {
        let payload = SmartplugRequest {
            panel_id: &self.config.panel_id,
            device_id: plug_id,
        };
        self.execute_action(
            ActionEndpoint::SmartplugOff,
            &payload,
            &format!("turn off smart plug {plug_id}"),
        )
        .await
    }

    /// Latest still image from a camera, base64-decoded.
    pub async fn get_camera_image(&self, serial_no: &str) -> Option<Vec<u8>> {
        let url = ActionEndpoint::CameraImage.url(&self.config);
        let payload = CameraRequest {
            panel_id: &self.config.panel_id,
            serial_no,
        };

        let response = self.post(&url, &payload).await;
        let encoded = response
            .as_ref()
            .and_then(|r| r.get(IMAGE_FIELD))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());

        let Some(encoded) = encoded else {
            error!("Failed to retrieve image for camera {serial_no}");
            return None;
        };

        match STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Invalid image data for camera {serial_no}: {e}");
                None
            }
        }
    }
}

fn login_transport_error(err: reqwest::Error) -> SectorError {
    if err.is_timeout() {
        error!("Timeout occurred during login");
        SectorError::authentication("Timeout during login")
    } else {
        error!("Client error during login: {err}");
        SectorError::authentication("Client error during login")
    }
}

/// Whether a response counts as data. Empty collections, empty strings,
/// zero and `false` do not.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Collect `PanelId` from every list element that has one.
fn extract_panel_ids(response: &Value) -> Vec<String> {
    response
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item.get("PanelId")? {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
