// MIT License - Copyright (c) 2026 Peter Wright
//
//! # sector-alarm
//!
//! Client for the Sector Alarm REST API (`mypagesapi.sectoralarm.net`).
//!
//! Logs in with account credentials, polls panel and device state, and
//! sends commands: arm/disarm, door lock/unlock, smart plug on/off and
//! camera stills.
//!
//! Failures after login are soft: each request logs what went wrong and the
//! caller gets `None`, `false` or a missing snapshot key. Only `login` returns
//! an error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sector_alarm::{ArmMode, SectorAlarmClient, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::builder()
//!         .email("me@example.com")
//!         .password("secret")
//!         .panel_id("01234567")
//!         .panel_code("1234")
//!         .build();
//!
//!     let mut client = SectorAlarmClient::new(config)?;
//!     client.login().await?;
//!
//!     let snapshot = client.retrieve_all_data().await;
//!     for key in snapshot.data_keys() {
//!         if let Some(value) = snapshot.get(key) {
//!             println!("{key}: {value}");
//!         }
//!     }
//!
//!     client.arm_system(ArmMode::Partial).await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod endpoints;
pub mod error;
pub mod session;
pub mod snapshot;

// Re-exports for convenience
pub use client::SectorAlarmClient;
pub use config::{ArmMode, SessionConfig, SessionConfigBuilder};
pub use endpoints::{ActionEndpoint, DataEndpoint, HttpMethod};
pub use error::{Result, SectorError, ValidationError};
pub use snapshot::PanelSnapshot;
