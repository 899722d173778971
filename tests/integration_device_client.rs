mod common;

use std::net::TcpListener;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use bellboard::board::Board;
use bellboard::config::SavedState;
use bellboard::device::{BellDevice, DeviceError, HttpBellDevice};
use bellboard::schedule::DayId;
use chrono::{DateTime, NaiveDate};
use common::{closed_port_url, FakeDevice};

fn thursday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()
}

#[test]
fn reads_device_time() {
    let fake = FakeDevice::json(r#"{"ok":true,"local":"2024-09-05 08:12:00","tzOffsetMinutes":300}"#);
    let device = HttpBellDevice::new(&fake.url).unwrap();

    let time = device.time().unwrap();
    assert!(time.ok);
    assert_eq!(time.local, "2024-09-05 08:12:00");
    assert_eq!(time.tz_offset_minutes, 300);

    let request = fake.request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/api/time");
}

#[test]
fn pushes_schedule_as_camel_case_config() {
    let fake = FakeDevice::json(r#"{"ok":true}"#);
    let device = HttpBellDevice::new(&format!("{}/", fake.url)).unwrap();
    let board = Board::from_saved(SavedState::default(), thursday());

    device.save_config(&board.bell_config(DayId::Thursday)).unwrap();

    let request = fake.request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/api/config");
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    let body = request.json();
    assert_eq!(body["bellDurationSec"], 5);
    assert_eq!(
        body["activeDays"],
        serde_json::json!([true, true, true, true, true, true, false])
    );
    assert_eq!(body["shift1"]["start"], "08:00");
    assert_eq!(body["shift1"]["end"], "12:15");
    assert_eq!(body["shift2"]["times"].as_array().unwrap().len(), 10);
}

#[test]
fn sync_time_sends_epoch_and_offset() {
    let fake = FakeDevice::json(r#"{"ok":true}"#);
    let device = HttpBellDevice::new(&fake.url).unwrap();
    let now = DateTime::parse_from_rfc3339("2024-09-05T08:00:00+05:00").unwrap();

    device.sync_time(now).unwrap();

    let request = fake.request();
    assert_eq!((request.method.clone(), request.path.as_str()), (Method::POST, "/api/time"));
    let body = request.json();
    assert_eq!(body["epoch"], now.timestamp());
    assert_eq!(body["tzOffsetMinutes"], 300);
}

#[test]
fn test_bell_accepts_plain_text_ack() {
    let fake = FakeDevice::respond(StatusCode::OK, "text/plain", "OK");
    let device = HttpBellDevice::new(&fake.url).unwrap();

    device.test_bell(3).unwrap();

    let request = fake.request();
    assert_eq!((request.method.clone(), request.path.as_str()), (Method::POST, "/api/test"));
    assert_eq!(request.json(), serde_json::json!({ "duration": 3 }));
}

#[test]
fn reads_back_device_config() {
    let fake = FakeDevice::json(
        r#"{"bellDurationSec":4,"activeDays":[true,true,true,true,true,false,false],
            "shift1":{"start":"08:00","end":"08:45","times":["08:00","08:45"]},
            "shift2":{"start":"13:00","end":"17:00","times":[]},
            "customTimes":["12:30"],"holidays":["2024-12-31"]}"#,
    );
    let device = HttpBellDevice::new(&fake.url).unwrap();

    let config = device.config().unwrap();
    assert_eq!(config.bell_duration_sec, 4);
    assert!(!config.active_days[5]);
    assert_eq!(config.shift1.times, vec!["08:00", "08:45"]);
    assert_eq!(
        config.holidays,
        vec![NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()]
    );
    let request = fake.request();
    assert_eq!((request.method, request.path.as_str()), (Method::GET, "/api/config"));
}

#[test]
fn non_success_status_is_reported() {
    let fake = FakeDevice::respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "boom");
    let device = HttpBellDevice::new(&fake.url).unwrap();

    let err = device.test_bell(1).unwrap_err();
    assert_matches!(err, DeviceError::Status { status: 500, .. });
    assert!(!err.is_unreachable());
    fake.request();
}

#[test]
fn malformed_json_is_a_decode_error() {
    let fake = FakeDevice::json("not json");
    let device = HttpBellDevice::new(&fake.url).unwrap();

    assert_matches!(device.time(), Err(DeviceError::Decode { .. }));
    fake.request();
}

#[test]
fn refused_connection_is_unreachable() {
    let device = HttpBellDevice::new(&closed_port_url()).unwrap();

    let err = device.test_bell(1).unwrap_err();
    assert!(err.is_unreachable(), "unexpected error: {err:?}");
}

#[test]
fn silent_device_times_out_as_unreachable() {
    // accepts connections into the backlog but never answers
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let device = HttpBellDevice::with_timeout(&url, Duration::from_millis(200)).unwrap();

    let err = device.time().unwrap_err();
    assert_matches!(err, DeviceError::Unreachable { .. });
    drop(listener);
}

#[test]
fn bare_address_gets_http_scheme() {
    let device = HttpBellDevice::new("192.168.4.1/").unwrap();
    assert_eq!(device.base_url(), "http://192.168.4.1");
    assert_matches!(
        HttpBellDevice::new("http://"),
        Err(DeviceError::InvalidUrl { .. })
    );
}
