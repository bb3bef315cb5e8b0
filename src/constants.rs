// MIT License - Copyright (c) 2026 Peter Wright
// Sector Alarm API constants

use std::time::Duration;

/// Production API host.
pub const API_URL: &str = "https://mypagesapi.sectoralarm.net";

/// Per-request timeout applied to every call, login included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const LOGIN_PATH: &str = "/api/Login/Login";
pub const PANEL_LIST_PATH: &str = "/api/account/GetPanelList";
pub const LOCK_STATUS_PATH: &str = "/api/panel/GetLockStatus";

/// Snapshot key under which the lock status is always stored.
pub const LOCK_STATUS_KEY: &str = "Lock Status";

/// Login response field carrying the bearer token.
pub const TOKEN_FIELD: &str = "AuthorizationToken";

/// Camera response field carrying the base64 image.
pub const IMAGE_FIELD: &str = "ImageData";

/// Media type a successful response must advertise.
pub const JSON_CONTENT_TYPE: &str = "application/json";
