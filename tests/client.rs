// Integration tests for the REST client against a mock Sector Alarm API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sector_alarm::{
    ArmMode, DataEndpoint, SectorAlarmClient, SectorError, SessionConfig, ValidationError,
};

const PANEL_ID: &str = "01234567";
const PANEL_CODE: &str = "1234";

fn config_for(server: &MockServer) -> SessionConfig {
    SessionConfig::builder()
        .email("user@example.com")
        .password("hunter2")
        .panel_id(PANEL_ID)
        .panel_code(PANEL_CODE)
        .base_url(server.uri())
        .timeout(Duration::from_millis(500))
        .build()
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/Login/Login"))
        .and(body_json(json!({"userId": "user@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthorizationToken": token,
            "User": {"Email": "user@example.com"}
        })))
        .mount(server)
        .await;
}

async fn logged_in_client(server: &MockServer) -> SectorAlarmClient {
    mount_login(server, "abc123").await;
    let mut client = SectorAlarmClient::new(config_for(server)).expect("valid config");
    client.login().await.expect("login should succeed");
    client
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn login_stores_token_and_sends_bearer_header() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    assert!(client.is_authenticated());
    assert_eq!(client.access_token(), Some("abc123"));

    Mock::given(method("GET"))
        .and(path("/api/account/GetPanelList"))
        .and(header("Authorization", "Bearer abc123"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"PanelId": PANEL_ID}])))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.get_panel_list().await, vec![PANEL_ID.to_string()]);
}

#[tokio::test]
async fn login_non_200_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Login/Login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let mut client = SectorAlarmClient::new(config_for(&server)).unwrap();
    let err = client.login().await.unwrap_err();
    assert!(err.is_authentication(), "got {err:?}");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn login_without_token_field_is_same_error_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Login/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"User": {}})))
        .mount(&server)
        .await;

    let mut client = SectorAlarmClient::new(config_for(&server)).unwrap();
    let err = client.login().await.unwrap_err();
    assert!(matches!(err, SectorError::Authentication { .. }));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn login_with_empty_token_fails() {
    let server = MockServer::start().await;
    mount_login(&server, "").await;

    let mut client = SectorAlarmClient::new(config_for(&server)).unwrap();
    assert!(client.login().await.unwrap_err().is_authentication());
}

#[tokio::test]
async fn login_timeout_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Login/Login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"AuthorizationToken": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut client = SectorAlarmClient::new(config_for(&server)).unwrap();
    assert!(client.login().await.unwrap_err().is_authentication());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn login_connection_refused_is_authentication_error() {
    let config = SessionConfig::builder()
        .email("user@example.com")
        .password("hunter2")
        .panel_id(PANEL_ID)
        .base_url("http://127.0.0.1:1")
        .timeout(Duration::from_millis(500))
        .build();
    let mut client = SectorAlarmClient::new(config).unwrap();
    assert!(client.login().await.unwrap_err().is_authentication());
}

// =========================================================================
// Request executor
// =========================================================================

#[tokio::test]
async fn requests_before_login_send_nothing() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(0)
        .mount(&server)
        .await;

    let client = SectorAlarmClient::new(config_for(&server)).unwrap();
    let url = format!("{}/api/panel/GetPanelStatus?panelId={PANEL_ID}", server.uri());
    assert!(client.get(&url).await.is_none());
    assert!(!client.disarm_system().await);
    assert!(!client.lock_door("L1").await);
    assert!(client.get_camera_image("CAM1").await.is_none());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn non_json_content_type_returns_none() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/panel/GetPanelStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/Panel/Disarm"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let url = format!("{}/api/panel/GetPanelStatus?panelId={PANEL_ID}", server.uri());
    assert!(client.get(&url).await.is_none());
    assert!(!client.disarm_system().await);
}

#[tokio::test]
async fn non_200_and_empty_body_return_none() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/null"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&server)
        .await;

    for endpoint in ["fail", "null", "empty", "garbage"] {
        let url = format!("{}/api/{endpoint}", server.uri());
        assert!(client.post(&url, &json!({})).await.is_none(), "{endpoint}");
    }
}

#[tokio::test]
async fn json_with_charset_is_accepted() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/thing"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"Status": 3}"#, "application/json; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/api/thing", server.uri());
    assert_eq!(client.get(&url).await, Some(json!({"Status": 3})));
}

// =========================================================================
// Bulk retrieval
// =========================================================================

#[tokio::test]
async fn retrieve_all_data_keeps_successful_endpoints_only() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/panel/GetPanelStatus"))
        .and(query_param("panelId", PANEL_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": 1})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/housecheck/temperatures"))
        .and(body_json(json!({"PanelId": PANEL_ID})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"Label": "Hall", "Temprature": "21"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/housecheck/humidity"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/persons/panels/01234567"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let snapshot = client.retrieve_all_data().await;

    let keys: Vec<_> = snapshot.data_keys().collect();
    assert_eq!(keys, vec!["Panel Status", "Temperatures"]);
    assert_eq!(snapshot.endpoint(DataEndpoint::PanelStatus), Some(&json!({"Status": 1})));
    assert!(snapshot.endpoint(DataEndpoint::Humidity).is_none());
    // Empty list counts as no data
    assert!(snapshot.endpoint(DataEndpoint::Persons).is_none());
    // Lock status fetch failed (no mock) but the key is still there
    assert_eq!(snapshot.get("Lock Status"), Some(&json!([])));
}

#[tokio::test]
async fn retrieve_data_drops_falsy_scalars() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/panel/GetPanelStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/housecheck/temperatures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/housecheck/humidity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/panel/GetLockStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
        .mount(&server)
        .await;

    let snapshot = client
        .retrieve_data(&[
            DataEndpoint::PanelStatus,
            DataEndpoint::Temperatures,
            DataEndpoint::Humidity,
        ])
        .await;
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.lock_status(), &json!([]));
}

#[tokio::test]
async fn retrieve_all_data_includes_lock_status() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    let locks = json!([{"Serial": "L1", "Status": "lock"}]);
    Mock::given(method("GET"))
        .and(path("/api/panel/GetLockStatus"))
        .and(query_param("panelId", PANEL_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(locks.clone()))
        .mount(&server)
        .await;

    let snapshot = client.retrieve_all_data().await;
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.lock_status(), &locks);

    let flat = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(flat, json!({"Lock Status": locks}));
}

#[tokio::test]
async fn panel_list_skips_entries_without_id() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/account/GetPanelList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"PanelId": "111", "DisplayName": "Home"},
            {"DisplayName": "Cabin"},
            {"PanelId": "222"}
        ])))
        .mount(&server)
        .await;

    assert_eq!(client.get_panel_list().await, vec!["111", "222"]);
}

#[tokio::test]
async fn panel_list_failure_is_empty() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    assert!(client.get_panel_list().await.is_empty());
}

// =========================================================================
// Actions
// =========================================================================

#[tokio::test]
async fn actions_send_vendor_payloads() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    let cases = [
        (
            "/api/Panel/Arm",
            json!({"ArmCode": PANEL_CODE, "PanelId": PANEL_ID, "ArmType": "partial"}),
        ),
        (
            "/api/Panel/Disarm",
            json!({"DisarmCode": PANEL_CODE, "PanelId": PANEL_ID}),
        ),
        (
            "/api/Panel/Lock",
            json!({"LockSerial": "L1", "PanelCode": PANEL_CODE, "PanelId": PANEL_ID, "SerialNo": "L1"}),
        ),
        (
            "/api/Panel/Unlock",
            json!({"LockSerial": "L1", "PanelCode": PANEL_CODE, "PanelId": PANEL_ID, "SerialNo": "L1"}),
        ),
        (
            "/api/Panel/TurnOnSmartplug",
            json!({"PanelId": PANEL_ID, "DeviceId": "P9"}),
        ),
        (
            "/api/Panel/TurnOffSmartplug",
            json!({"PanelId": PANEL_ID, "DeviceId": "P9"}),
        ),
    ];
    for (action_path, body) in cases {
        Mock::given(method("POST"))
            .and(path(action_path))
            .and(header("Authorization", "Bearer abc123"))
            .and(body_json(body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    assert!(client.arm_system(ArmMode::Partial).await);
    assert!(client.disarm_system().await);
    assert!(client.lock_door("L1").await);
    assert!(client.unlock_door("L1").await);
    assert!(client.turn_on_smartplug("P9").await);
    assert!(client.turn_off_smartplug("P9").await);
}

#[tokio::test]
async fn actions_fail_without_a_response() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Panel/Lock"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Wrong code"))
        .mount(&server)
        .await;

    assert!(!client.arm_system(ArmMode::Total).await);
    assert!(!client.disarm_system().await);
    assert!(!client.lock_door("L1").await);
    assert!(!client.unlock_door("L1").await);
    assert!(!client.turn_on_smartplug("P9").await);
    assert!(!client.turn_off_smartplug("P9").await);
}

#[tokio::test]
async fn arming_twice_sends_two_requests() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Panel/Arm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Result": "ok"})))
        .expect(2)
        .mount(&server)
        .await;

    assert!(client.arm_system(ArmMode::Total).await);
    assert!(client.arm_system(ArmMode::Total).await);
}

#[tokio::test]
async fn camera_image_is_decoded() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    // "\x89PNG" base64-encoded
    Mock::given(method("POST"))
        .and(path("/api/camera/GetCameraImage"))
        .and(body_json(json!({"PanelId": PANEL_ID, "SerialNo": "CAM1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ImageData": "iVBORw=="})))
        .mount(&server)
        .await;

    let image = client.get_camera_image("CAM1").await;
    assert_eq!(image, Some(vec![0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn camera_image_missing_or_bad_data_is_none() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    for (serial, body) in [
        ("NOFIELD", json!({"Other": 1})),
        ("EMPTY", json!({"ImageData": ""})),
        ("BAD", json!({"ImageData": "***"})),
    ] {
        Mock::given(method("POST"))
            .and(path("/api/camera/GetCameraImage"))
            .and(body_json(json!({"PanelId": PANEL_ID, "SerialNo": serial})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    assert!(client.get_camera_image("NOFIELD").await.is_none());
    assert!(client.get_camera_image("EMPTY").await.is_none());
    assert!(client.get_camera_image("BAD").await.is_none());
    // No mock for this serial: request fails
    assert!(client.get_camera_image("UNKNOWN").await.is_none());
}

#[tokio::test]
async fn logout_keeps_local_token() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/Login/Logout"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Success": true})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.logout().await);
    assert_eq!(client.access_token(), Some("abc123"));
}

// =========================================================================
// Credential validation
// =========================================================================

#[tokio::test]
async fn validate_credentials_success() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;
    Mock::given(method("POST"))
        .and(path("/api/Login/Logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(SectorAlarmClient::validate_credentials(config_for(&server)).await.is_ok());
}

#[tokio::test]
async fn validate_credentials_reports_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Login/Login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = SectorAlarmClient::validate_credentials(config_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::AuthenticationFailed));
}

#[tokio::test]
async fn validate_credentials_reports_unknown_for_bad_config() {
    let config = SessionConfig::builder().password("pw").panel_id("1").build();
    let err = SectorAlarmClient::validate_credentials(config).await.unwrap_err();
    assert!(matches!(err, ValidationError::Unknown(_)));
}

// =========================================================================
// End to end
// =========================================================================

#[tokio::test]
async fn login_poll_with_timeout_then_arm() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    assert_eq!(client.access_token(), Some("abc123"));

    Mock::given(method("GET"))
        .and(path("/api/panel/GetPanelStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": 1})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/housecheck/doorsandwindows"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"Label": "Front door", "Closed": true}]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/housecheck/temperatures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"Label": "Hall"}])))
        .mount(&server)
        .await;

    let snapshot = client
        .retrieve_data(&[
            DataEndpoint::PanelStatus,
            DataEndpoint::DoorsAndWindows,
            DataEndpoint::Temperatures,
        ])
        .await;

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.to_map().len(), 3);
    assert!(snapshot.endpoint(DataEndpoint::DoorsAndWindows).is_none());
    assert!(snapshot.get("Lock Status").is_some());

    // No arm mock yet: fails
    assert!(!client.arm_system(ArmMode::Total).await);

    Mock::given(method("POST"))
        .and(path("/api/Panel/Arm"))
        .and(body_json(json!({"ArmCode": PANEL_CODE, "PanelId": PANEL_ID, "ArmType": "total"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.arm_system(ArmMode::Total).await);
}
