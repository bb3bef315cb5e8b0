// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Mutex;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info, warn};

use sector_alarm::constants::API_URL;
use sector_alarm::{
    ArmMode, DataEndpoint, PanelSnapshot, SectorAlarmClient, SessionConfig, ValidationError,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "sector2mqtt")]
#[command(about = "Bridge between the Sector Alarm cloud API and MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Check the configured credentials and exit
    #[arg(long)]
    validate: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    sector: SectorToml,
    mqtt: MqttToml,
}

#[derive(Deserialize)]
struct SectorToml {
    email: String,
    password: String,
    panel_id: String,
    panel_code: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    poll_interval_secs: u64,
    /// Logical endpoint names to poll (e.g. "Panel Status"). Optional:
    /// when omitted, every endpoint is polled.
    #[serde(default)]
    endpoints: Option<Vec<String>>,
}

impl std::fmt::Debug for SectorToml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectorToml")
            .field("email", &self.email)
            .field("panel_id", &self.panel_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn default_base_url() -> String {
    API_URL.to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default = "default_subscribe_topic")]
    subscribe_topic: String,
    #[serde(default = "default_publish_topic")]
    publish_topic: String,
}

fn default_client_id() -> String {
    "sector-bridge".to_string()
}
fn default_subscribe_topic() -> String {
    "sector/cmd".to_string()
}
fn default_publish_topic() -> String {
    "sector".to_string()
}

fn load_config(path: &str) -> Result<Config> {
    let text = std::fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&text).context("Failed to parse config file")
}

fn build_session_config(toml: &SectorToml) -> SessionConfig {
    SessionConfig::builder()
        .email(&toml.email)
        .password(&toml.password)
        .panel_id(&toml.panel_id)
        .panel_code(&toml.panel_code)
        .base_url(&toml.base_url)
        .timeout(Duration::from_secs(toml.timeout_secs))
        .build()
}

fn parse_endpoints(names: Option<&[String]>) -> Result<Vec<DataEndpoint>> {
    match names {
        None => Ok(DataEndpoint::ALL.to_vec()),
        Some(names) => names
            .iter()
            .map(|name| {
                DataEndpoint::from_key(name)
                    .with_context(|| format!("Unknown endpoint: {name}"))
            })
            .collect(),
    }
}

/// Everything the bridge needs from one config load.
struct BridgeSettings {
    session: SessionConfig,
    endpoints: Vec<DataEndpoint>,
    poll_interval_secs: u64,
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_client_id: String,
    mqtt_credentials: Option<(String, String)>,
    publish_topic: String,
    subscribe_topic: String,
}

fn build_settings(config: Config) -> Result<BridgeSettings> {
    let endpoints = parse_endpoints(config.sector.endpoints.as_deref())?;
    let (mqtt_host, mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;
    let mqtt_credentials = match (config.mqtt.username, config.mqtt.password) {
        (Some(user), Some(pass)) => Some((user, pass)),
        (Some(user), None) => Some((user, String::new())),
        _ => None,
    };
    Ok(BridgeSettings {
        session: build_session_config(&config.sector),
        endpoints,
        poll_interval_secs: config.sector.poll_interval_secs.max(1),
        mqtt_host,
        mqtt_port,
        mqtt_client_id: config.mqtt.client_id,
        mqtt_credentials,
        publish_topic: config.mqtt.publish_topic,
        subscribe_topic: config.mqtt.subscribe_topic,
    })
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

// Published messages: all share {now, op, ...} flat structure

#[derive(Serialize)]
struct MqttSnapshot<'a> {
    now: u64,
    op: &'static str,
    state: &'a PanelSnapshot,
}

// CMD_ACK response
#[derive(Serialize)]
struct MqttCmdAck {
    now: u64,
    op: &'static str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

// Camera still, re-encoded as base64
#[derive(Serialize)]
struct MqttCameraImage {
    now: u64,
    op: &'static str,
    serial: String,
    image: String,
}

// Inbound command (subscribed)
#[derive(Debug, Deserialize)]
struct MqttCommand {
    op: String,
    #[serde(default)]
    #[allow(dead_code)]
    op_id: Option<String>,
    #[serde(default)]
    serial: Option<String>,
    #[serde(default)]
    device: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, retain, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

async fn publish_cmd_ack(
    client: &AsyncClient,
    topic: &str,
    success: bool,
    src: Option<serde_json::Value>,
    data: Option<serde_json::Value>,
) {
    let msg = MqttCmdAck {
        now: now_epoch_ms(),
        op: "CMD_ACK",
        success,
        src,
        data,
    };
    publish_json(client, topic, &msg, false).await;
}

async fn publish_snapshot(client: &AsyncClient, topic: &str, snapshot: &PanelSnapshot) {
    let msg = MqttSnapshot {
        now: now_epoch_ms(),
        op: "SNAPSHOT",
        state: snapshot,
    };
    publish_json(client, topic, &msg, true).await;
}

/// An account always owns at least one panel, so an empty panel list after
/// an empty poll means the token is no longer accepted.
async fn session_expired(sector: &SectorAlarmClient) -> bool {
    sector.get_panel_list().await.is_empty()
}

/// Poll the API and publish the result.
///
/// The client never logs in again on its own. When a poll comes back with
/// no data and the panel list is gone too, log in again here and retry once.
async fn poll_and_publish(
    sector: &Mutex<SectorAlarmClient>,
    endpoints: &[DataEndpoint],
    client: &AsyncClient,
    topic: &str,
) -> PanelSnapshot {
    let mut sector = sector.lock().await;
    let mut snapshot = sector.retrieve_data(endpoints).await;
    if snapshot.is_empty() && !endpoints.is_empty() && session_expired(&sector).await {
        warn!("Poll returned no data and the session looks expired, logging in again");
        match sector.login().await {
            Ok(()) => snapshot = sector.retrieve_data(endpoints).await,
            Err(e) => error!("Re-login failed: {e}"),
        }
    }
    drop(sector);

    debug!("Poll complete: {} entries", snapshot.len());
    publish_snapshot(client, topic, &snapshot).await;
    snapshot
}

/// Await an action future and log the result. Returns `true` on success.
async fn exec_action(op: &str, label: &str, fut: impl std::future::Future<Output = bool>) -> bool {
    let success = fut.await;
    if success {
        info!("{op} {label}: success");
    } else {
        warn!("{op} {label}: failed");
    }
    success
}

/// Fetch the argument an op needs, or ack failure and return `None`.
async fn require_arg<'a>(
    arg: &'a Option<String>,
    name: &str,
    op: &str,
    client: &AsyncClient,
    topic: &str,
    src: &Option<serde_json::Value>,
) -> Option<&'a str> {
    match arg.as_deref() {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            warn!("{op}: missing {name}");
            publish_cmd_ack(client, topic, false, src.clone(), None).await;
            None
        }
    }
}

async fn handle_command(
    payload_str: &str,
    cmd: MqttCommand,
    client: &AsyncClient,
    topic: &str,
    sector: &Mutex<SectorAlarmClient>,
    endpoints: &[DataEndpoint],
) {
    // Parse the raw payload as a JSON value for the CMD_ACK src field
    let src_json = serde_json::from_str::<serde_json::Value>(payload_str).ok();

    match cmd.op.as_str() {
        "SNAPSHOT" => {
            debug!("Command: SNAPSHOT");
            let snapshot = poll_and_publish(sector, endpoints, client, topic).await;
            let snapshot_value = serde_json::to_value(&snapshot).ok();
            publish_cmd_ack(client, topic, true, src_json, snapshot_value).await;
        }

        "PING" => {
            info!("Command: PING");
            publish_cmd_ack(client, topic, true, src_json, None).await;
        }

        "ARM_TOTAL" | "ARM_PARTIAL" => {
            let mode = if cmd.op == "ARM_TOTAL" {
                ArmMode::Total
            } else {
                ArmMode::Partial
            };
            info!("Command: {} ({mode})", cmd.op);
            let sector = sector.lock().await;
            let success = exec_action(&cmd.op, "panel", sector.arm_system(mode)).await;
            publish_cmd_ack(client, topic, success, src_json, None).await;
        }

        "DISARM" => {
            info!("Command: DISARM");
            let sector = sector.lock().await;
            let success = exec_action("DISARM", "panel", sector.disarm_system()).await;
            publish_cmd_ack(client, topic, success, src_json, None).await;
        }

        "LOCK" | "UNLOCK" => {
            let op = cmd.op.as_str();
            let Some(serial) = require_arg(&cmd.serial, "serial", op, client, topic, &src_json).await
            else {
                return;
            };
            info!("Command: {op} lock {serial}");
            let label = format!("lock {serial}");
            let sector = sector.lock().await;
            let success = if op == "LOCK" {
                exec_action(op, &label, sector.lock_door(serial)).await
            } else {
                exec_action(op, &label, sector.unlock_door(serial)).await
            };
            publish_cmd_ack(client, topic, success, src_json, None).await;
        }

        "PLUG_ON" | "PLUG_OFF" => {
            let op = cmd.op.as_str();
            let Some(device) = require_arg(&cmd.device, "device", op, client, topic, &src_json).await
            else {
                return;
            };
            info!("Command: {op} plug {device}");
            let label = format!("plug {device}");
            let sector = sector.lock().await;
            let success = if op == "PLUG_ON" {
                exec_action(op, &label, sector.turn_on_smartplug(device)).await
            } else {
                exec_action(op, &label, sector.turn_off_smartplug(device)).await
            };
            publish_cmd_ack(client, topic, success, src_json, None).await;
        }

        "CAMERA_IMAGE" => {
            let Some(serial) =
                require_arg(&cmd.serial, "serial", "CAMERA_IMAGE", client, topic, &src_json).await
            else {
                return;
            };
            info!("Command: CAMERA_IMAGE camera {serial}");
            let image = sector.lock().await.get_camera_image(serial).await;
            let success = match image {
                Some(bytes) => {
                    let msg = MqttCameraImage {
                        now: now_epoch_ms(),
                        op: "CAMERA_IMAGE",
                        serial: serial.to_string(),
                        image: STANDARD.encode(&bytes),
                    };
                    publish_json(client, &format!("{topic}/camera"), &msg, false).await;
                    true
                }
                None => false,
            };
            publish_cmd_ack(client, topic, success, src_json, None).await;
        }

        other => {
            warn!("Unknown command: {other}");
            publish_cmd_ack(client, topic, false, src_json, None).await;
        }
    }
}

/// Run a command on its own task so the MQTT event loop keeps polling while
/// API calls wait on the client lock or the network.
fn spawn_command(
    payload: String,
    cmd: MqttCommand,
    client: AsyncClient,
    topic: String,
    sector: Arc<Mutex<SectorAlarmClient>>,
    endpoints: Arc<Vec<DataEndpoint>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        handle_command(&payload, cmd, &client, &topic, &sector, &endpoints).await;
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=sector_alarm=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let mut settings = build_settings(load_config(&cli.config)?)?;

    if cli.validate {
        return match SectorAlarmClient::validate_credentials(settings.session).await {
            Ok(()) => {
                info!("Credentials are valid");
                Ok(())
            }
            Err(ValidationError::AuthenticationFailed) => {
                anyhow::bail!("Validation failed: authentication failed")
            }
            Err(e @ ValidationError::Unknown(_)) => {
                error!("Unexpected error during validation: {:?}", e);
                anyhow::bail!("Validation failed: {e}")
            }
        };
    }

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        // Log in to the API
        info!(
            "Logging in to Sector Alarm at {} (panel {})",
            settings.session.base_url, settings.session.panel_id
        );
        let mut sector_client = SectorAlarmClient::new(settings.session.clone())?;
        sector_client
            .login()
            .await
            .context("Failed to log in to Sector Alarm")?;
        let sector = Arc::new(Mutex::new(sector_client));
        let endpoints = Arc::new(settings.endpoints.clone());

        // Set up MQTT
        let mut mqtt_opts =
            MqttOptions::new(&settings.mqtt_client_id, &settings.mqtt_host, settings.mqtt_port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        if let Some((user, pass)) = &settings.mqtt_credentials {
            mqtt_opts.set_credentials(user, pass);
        }
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

        client
            .subscribe(&settings.subscribe_topic, QoS::AtLeastOnce)
            .await
            .context("Failed to subscribe to MQTT topic")?;
        info!("MQTT: subscribed to {}", settings.subscribe_topic);

        // Task 1: MQTT event loop (receives messages, handles commands)
        let sector_cmds = Arc::clone(&sector);
        let endpoints_cmds = Arc::clone(&endpoints);
        let client_cmds = client.clone();
        let topic_cmds = settings.publish_topic.clone();
        let sub_topic = settings.subscribe_topic.clone();
        let mqtt_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // rumqttc does not resubscribe after a broker reconnect
                        info!("MQTT: connected, subscribing to {sub_topic}");
                        if let Err(e) = client_cmds.subscribe(&sub_topic, QoS::AtLeastOnce).await {
                            error!("Failed to subscribe to {sub_topic}: {e}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        if msg.topic == sub_topic {
                            let payload = String::from_utf8_lossy(&msg.payload);
                            match serde_json::from_str::<MqttCommand>(&payload) {
                                Ok(cmd) => {
                                    if cmd.op == "SNAPSHOT" {
                                        debug!("MQTT command received: {payload}");
                                    } else {
                                        info!("MQTT command received: {payload}");
                                    }
                                    spawn_command(
                                        payload.to_string(),
                                        cmd,
                                        client_cmds.clone(),
                                        topic_cmds.clone(),
                                        Arc::clone(&sector_cmds),
                                        Arc::clone(&endpoints_cmds),
                                    );
                                }
                                Err(e) => {
                                    warn!("Failed to parse MQTT command: {e}");
                                }
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        // Task 2: poll timer; the first tick fires immediately
        let sector_poll = Arc::clone(&sector);
        let endpoints_poll = Arc::clone(&endpoints);
        let client_poll = client.clone();
        let topic_poll = settings.publish_topic.clone();
        let poll_interval_secs = settings.poll_interval_secs;
        let poll_handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(poll_interval_secs));
            loop {
                ticker.tick().await;
                poll_and_publish(&sector_poll, &endpoints_poll, &client_poll, &topic_poll).await;
            }
        });

        // Wait for a signal
        info!("MQTT bridge running. Send SIGHUP to restart, SIGINT/SIGTERM to stop.");
        let restart = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                false
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                false
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config and restarting connections...");
                true
            }
        };

        mqtt_handle.abort();
        poll_handle.abort();

        if !sector.lock().await.logout().await {
            warn!("Logout request failed");
        }
        if let Err(e) = client.disconnect().await {
            debug!("MQTT disconnect: {e}");
        }

        if !restart {
            break;
        }

        // Reload config from disk; keep previous config on failure
        info!("Reloading config from {}", cli.config);
        match load_config(&cli.config).and_then(build_settings) {
            Ok(new_settings) => {
                settings = new_settings;
                info!("Config reloaded successfully");
            }
            Err(e) => warn!("Failed to reload config, keeping previous: {e:#}"),
        }

        info!("Reconnecting...");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}
