//! Client for the bell-ringer device's local HTTP API.
//!
//! The device only knows ring times, so the weekly schedule is flattened into
//! a [`BellConfig`] before upload.

use chrono::{DateTime, FixedOffset, NaiveDate};
use itertools::Itertools;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::schedule::{DayId, Lesson, ShiftId, WeeklySchedule};
use crate::time_of_day::TimeOfDay;

pub const DEFAULT_DEVICE_URL: &str = "http://192.168.4.1";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TEST_BELL_SECS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device at {url} is unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("device rejected {endpoint}: {status} {reason}")]
    Status {
        endpoint: String,
        status: u16,
        reason: String,
    },

    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid device address {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl DeviceError {
    /// The device could not be reached at all (as opposed to answering badly).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, DeviceError::Unreachable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStatus {
    pub ok: bool,
    pub local: String,
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeSync {
    epoch: i64,
    tz_offset_minutes: i32,
}

#[derive(Debug, Serialize)]
struct BellTest {
    duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBells {
    pub start: String,
    pub end: String,
    pub times: Vec<String>,
}

impl ShiftBells {
    /// Shift window plus every distinct lesson boundary, sorted.
    /// Disabled lessons and unparseable times do not ring.
    pub fn from_lessons(lessons: &[Lesson], shift: ShiftId) -> Self {
        let ringing: Vec<(TimeOfDay, TimeOfDay)> = lessons
            .iter()
            .filter(|l| l.is_active)
            .filter_map(|l| Some((l.start()?, l.end()?)))
            .collect();

        let (fallback_start, fallback_end) = shift.fallback_window();
        let start = ringing
            .first()
            .map(|(s, _)| s.to_string())
            .unwrap_or_else(|| fallback_start.to_string());
        let end = ringing
            .last()
            .map(|(_, e)| e.to_string())
            .unwrap_or_else(|| fallback_end.to_string());
        let times = ringing
            .iter()
            .flat_map(|&(s, e)| [s, e])
            .sorted()
            .dedup()
            .map(|t| t.to_string())
            .collect();

        Self { start, end, times }
    }
}

/// The device's whole configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BellConfig {
    pub bell_duration_sec: u32,
    /// Monday first.
    pub active_days: [bool; 7],
    pub shift1: ShiftBells,
    pub shift2: ShiftBells,
    pub custom_times: Vec<String>,
    pub holidays: Vec<NaiveDate>,
}

impl BellConfig {
    /// Builds the upload for `day`'s two shifts; active days come from the
    /// whole week.
    pub fn from_schedule(week: &WeeklySchedule, day: DayId, config: &Config) -> Self {
        let mut active_days = [false; 7];
        for d in week.days().filter(|d| d.is_active) {
            active_days[d.day_id.device_index()] = true;
        }

        Self {
            bell_duration_sec: config.bell_duration_sec,
            active_days,
            shift1: ShiftBells::from_lessons(week.lessons(day, ShiftId::First), ShiftId::First),
            shift2: ShiftBells::from_lessons(week.lessons(day, ShiftId::Second), ShiftId::Second),
            custom_times: config.custom_times.clone(),
            holidays: config.holidays.clone(),
        }
    }
}

/// Operations the dashboard needs from a bell device.
pub trait BellDevice {
    fn time(&self) -> Result<TimeStatus, DeviceError>;
    fn sync_time(&self, now: DateTime<FixedOffset>) -> Result<(), DeviceError>;
    fn config(&self) -> Result<BellConfig, DeviceError>;
    fn save_config(&self, config: &BellConfig) -> Result<(), DeviceError>;
    fn test_bell(&self, duration_sec: u32) -> Result<(), DeviceError>;
}

/// Accepts `192.168.4.1`, `http://192.168.4.1/` and the like.
pub fn normalize_base_url(raw: &str) -> Result<String, DeviceError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let parsed = reqwest::Url::parse(&candidate).map_err(|e| DeviceError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.host_str().is_none() {
        return Err(DeviceError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(candidate)
}

#[derive(Debug, Clone)]
pub struct HttpBellDevice {
    base_url: String,
    client: Client,
}

impl HttpBellDevice {
    pub fn new(url: &str) -> Result<Self, DeviceError> {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, DeviceError> {
        let base_url = normalize_base_url(url)?;
        // the device sits on the local network; never route it through a proxy
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|source| DeviceError::Http {
                endpoint: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, DeviceError> {
        let body = self.send(endpoint, self.client.get(self.url(endpoint)))?;
        serde_json::from_str(&body).map_err(|source| DeviceError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// The device acknowledges with JSON or plain text; the body is ignored.
    fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<(), DeviceError> {
        let request = self.client.post(self.url(endpoint)).json(body);
        self.send(endpoint, request).map(|_| ())
    }

    fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<String, DeviceError> {
        let result = request
            .send()
            .map_err(|e| self.transport_error(endpoint, e))
            .and_then(|response| {
                let status = response.status();
                if !status.is_success() {
                    return Err(DeviceError::Status {
                        endpoint: endpoint.to_string(),
                        status: status.as_u16(),
                        reason: status.canonical_reason().unwrap_or_default().to_string(),
                    });
                }
                response.text().map_err(|e| self.transport_error(endpoint, e))
            });

        match &result {
            Ok(_) => tracing::debug!(url = %self.url(endpoint), "device request succeeded"),
            Err(err) => tracing::warn!(url = %self.url(endpoint), %err, "device request failed"),
        }
        result
    }

    fn transport_error(&self, endpoint: &str, source: reqwest::Error) -> DeviceError {
        if source.is_timeout() || source.is_connect() {
            DeviceError::Unreachable {
                url: self.base_url.clone(),
                source,
            }
        } else {
            DeviceError::Http {
                endpoint: endpoint.to_string(),
                source,
            }
        }
    }
}

impl BellDevice for HttpBellDevice {
    fn time(&self) -> Result<TimeStatus, DeviceError> {
        self.get("/api/time")
    }

    fn sync_time(&self, now: DateTime<FixedOffset>) -> Result<(), DeviceError> {
        let body = TimeSync {
            epoch: now.timestamp(),
            tz_offset_minutes: now.offset().local_minus_utc() / 60,
        };
        self.post("/api/time", &body)
    }

    fn config(&self) -> Result<BellConfig, DeviceError> {
        self.get("/api/config")
    }

    fn save_config(&self, config: &BellConfig) -> Result<(), DeviceError> {
        self.post("/api/config", config)
    }

    fn test_bell(&self, duration_sec: u32) -> Result<(), DeviceError> {
        self.post(
            "/api/test",
            &BellTest {
                duration: duration_sec,
            },
        )
    }
}
