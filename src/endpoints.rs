// MIT License - Copyright (c) 2026 Peter Wright
// Sector Alarm endpoint table

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    /// POST with `{"PanelId": <panel id>}` as body
    Post,
}

/// Data queries issued by a bulk retrieval, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataEndpoint {
    PanelStatus,
    SmartplugStatus,
    PanelInfo,
    Logs,
    DoorsAndWindows,
    LeakageDetectors,
    SmokeDetectors,
    Cameras,
    Persons,
    Temperatures,
    Humidity,
}

impl DataEndpoint {
    pub const ALL: [DataEndpoint; 11] = [
        Self::PanelStatus,
        Self::SmartplugStatus,
        Self::PanelInfo,
        Self::Logs,
        Self::DoorsAndWindows,
        Self::LeakageDetectors,
        Self::SmokeDetectors,
        Self::Cameras,
        Self::Persons,
        Self::Temperatures,
        Self::Humidity,
    ];

    /// Logical key used in the panel snapshot.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PanelStatus => "Panel Status",
            Self::SmartplugStatus => "Smartplug Status",
            Self::PanelInfo => "Panel Info",
            Self::Logs => "Logs",
            Self::DoorsAndWindows => "Doors and Windows",
            Self::LeakageDetectors => "Leakage Detectors",
            Self::SmokeDetectors => "Smoke Detectors",
            Self::Cameras => "Cameras",
            Self::Persons => "Persons",
            Self::Temperatures => "Temperatures",
            Self::Humidity => "Humidity",
        }
    }

    /// Reverse lookup from a snapshot key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.key() == key)
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Self::PanelStatus
            | Self::SmartplugStatus
            | Self::PanelInfo
            | Self::Logs
            | Self::Cameras
            | Self::Persons => HttpMethod::Get,
            Self::DoorsAndWindows
            | Self::LeakageDetectors
            | Self::SmokeDetectors
            | Self::Temperatures
            | Self::Humidity => HttpMethod::Post,
        }
    }

    /// Path (and query) for this endpoint on the given panel.
    pub fn path(&self, panel_id: &str) -> String {
        match self {
            Self::PanelStatus => format!("/api/panel/GetPanelStatus?panelId={panel_id}"),
            Self::SmartplugStatus => format!("/api/panel/GetSmartplugStatus?panelId={panel_id}"),
            Self::PanelInfo => format!("/api/panel/GetPanel?panelId={panel_id}"),
            Self::Logs => format!("/api/panel/GetLogs?panelId={panel_id}"),
            Self::DoorsAndWindows => "/api/v2/housecheck/doorsandwindows".to_string(),
            Self::LeakageDetectors => "/api/v2/housecheck/leakagedetectors".to_string(),
            Self::SmokeDetectors => "/api/v2/housecheck/smokedetectors".to_string(),
            Self::Cameras => format!("/api/v2/housecheck/cameras/{panel_id}"),
            Self::Persons => format!("/api/persons/panels/{panel_id}"),
            Self::Temperatures => "/api/v2/housecheck/temperatures".to_string(),
            Self::Humidity => "/api/v2/housecheck/humidity".to_string(),
        }
    }

    pub fn url(&self, config: &SessionConfig) -> String {
        config.url(&self.path(&config.panel_id))
    }
}

/// Command endpoints. All are POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionEndpoint {
    /// Both arm modes; the mode travels in `ArmType`
    Arm,
    Disarm,
    Lock,
    Unlock,
    SmartplugOn,
    SmartplugOff,
    CameraImage,
    Logout,
}

impl ActionEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Arm => "/api/Panel/Arm",
            Self::Disarm => "/api/Panel/Disarm",
            Self::Lock => "/api/Panel/Lock",
            Self::Unlock => "/api/Panel/Unlock",
            Self::SmartplugOn => "/api/Panel/TurnOnSmartplug",
            Self::SmartplugOff => "/api/Panel/TurnOffSmartplug",
            Self::CameraImage => "/api/camera/GetCameraImage",
            Self::Logout => "/api/Login/Logout",
        }
    }

    pub fn url(&self, config: &SessionConfig) -> String {
        config.url(self.path())
    }
}
