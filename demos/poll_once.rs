//! Example: log in, print one snapshot, list panels.
//!
//! Credentials come from SECTOR_EMAIL, SECTOR_PASSWORD, SECTOR_PANEL_ID and
//! SECTOR_PANEL_CODE.

use anyhow::Context;
use sector_alarm::{SectorAlarmClient, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let env = |name: &str| std::env::var(name).with_context(|| format!("{name} is not set"));
    let config = SessionConfig::builder()
        .email(env("SECTOR_EMAIL")?)
        .password(env("SECTOR_PASSWORD")?)
        .panel_id(env("SECTOR_PANEL_ID")?)
        .panel_code(env("SECTOR_PANEL_CODE").unwrap_or_default())
        .build();

    let mut client = SectorAlarmClient::new(config)?;
    println!("Logging in...");
    client.login().await?;

    let panels = client.get_panel_list().await;
    println!("\n--- Panels ({}) ---", panels.len());
    for id in &panels {
        println!("  {id}");
    }

    let snapshot = client.retrieve_all_data().await;
    println!("\n--- Snapshot ({} endpoints answered) ---", snapshot.len());
    for key in snapshot.data_keys() {
        if let Some(value) = snapshot.get(key) {
            println!("  {key}: {value}");
        }
    }
    println!("  Lock Status: {}", snapshot.lock_status());

    client.logout().await;
    Ok(())
}
