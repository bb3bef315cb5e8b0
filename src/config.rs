// MIT License - Copyright (c) 2026 Peter Wright
// Session configuration

use std::fmt;
use std::time::Duration;

use crate::constants::{API_URL, DEFAULT_TIMEOUT};

/// Arm mode for [`SectorAlarmClient::arm_system`](crate::SectorAlarmClient::arm_system).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmMode {
    /// Full arm
    Total,
    /// Partial / home arm
    Partial,
}

impl ArmMode {
    /// The wire value sent in the `ArmType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for ArmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials and connection settings for one Sector Alarm panel.
#[derive(Clone)]
pub struct SessionConfig {
    /// Account e-mail, sent as `userId` on login
    pub email: String,
    pub password: String,
    /// Panel identifier
    pub panel_id: String,
    /// User PIN, sent with arm/disarm/lock actions
    pub panel_code: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            panel_id: String::new(),
            panel_code: String::new(),
            base_url: API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("panel_id", &self.panel_id)
            .field("panel_code", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SessionConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Builder for SessionConfig.
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.config.email = email.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn panel_id(mut self, id: impl Into<String>) -> Self {
        self.config.panel_id = id.into();
        self
    }

    pub fn panel_code(mut self, code: impl Into<String>) -> Self {
        self.config.panel_code = code.into();
        self
    }

    /// Override the API host (used against staging or a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}
