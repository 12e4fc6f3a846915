//! InfluxDB v2 time-series store adapter.
//!
//! Points go out as line protocol in an HTTP `POST /api/v2/write`, one
//! request per telemetry cycle. `GET /ping` is the reachability probe
//! used at Cloud entry. URL and header construction is plain Rust and
//! tested on the host; the HTTP exchange uses the ESP-IDF client.

use core::fmt::Write as _;

#[cfg(target_os = "espidf")]
use log::{debug, warn};

#[cfg(target_os = "espidf")]
use crate::app::ports::TimeSeriesPort;
#[cfg(target_os = "espidf")]
use crate::cloud::line_protocol::Point;
use crate::config::SystemConfig;
#[cfg(target_os = "espidf")]
use crate::error::TransientError;

#[cfg(target_os = "espidf")]
const HTTP_TIMEOUT_MS: u64 = 5_000;

/// Percent-encode a query value (RFC 3986 unreserved set kept).
pub fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

/// 2xx, with 204 being the normal answer to both endpoints.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

pub struct InfluxStore {
    write_url: String,
    ping_url: String,
    auth_header: String,
}

impl InfluxStore {
    pub fn new(config: &SystemConfig) -> Self {
        let base = config.store_url.trim_end_matches('/');
        Self {
            write_url: format!(
                "{base}/api/v2/write?org={}&bucket={}&precision=s",
                encode_query(&config.store_org),
                encode_query(&config.store_bucket),
            ),
            ping_url: format!("{base}/ping"),
            auth_header: format!("Token {}", config.store_token),
        }
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    pub fn ping_url(&self) -> &str {
        &self.ping_url
    }

    #[cfg(target_os = "espidf")]
    fn exchange(
        &self,
        method: embedded_svc::http::Method,
        url: &str,
        body: &[u8],
    ) -> anyhow::Result<u16> {
        use embedded_svc::http::client::Client as HttpClient;
        use embedded_svc::io::Write;
        use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

        let conf = HttpClientConfiguration {
            timeout: Some(core::time::Duration::from_millis(HTTP_TIMEOUT_MS)),
            ..Default::default()
        };
        let mut client = HttpClient::wrap(EspHttpConnection::new(&conf)?);
        let len = body.len().to_string();
        let headers = [
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "text/plain; charset=utf-8"),
            ("Content-Length", len.as_str()),
        ];
        let mut request = client.request(method, url, &headers)?;
        if !body.is_empty() {
            request.write_all(body)?;
        }
        let response = request.submit()?;
        Ok(response.status())
    }
}

#[cfg(target_os = "espidf")]
impl TimeSeriesPort for InfluxStore {
    fn store_validate(&mut self) -> Result<(), TransientError> {
        match self.exchange(embedded_svc::http::Method::Get, &self.ping_url, &[]) {
            Ok(status) if is_success(status) => Ok(()),
            Ok(status) => {
                warn!("Store: ping answered HTTP {}", status);
                Err(TransientError::StoreUnreachable)
            }
            Err(e) => {
                warn!("Store: ping failed ({e:#})");
                Err(TransientError::StoreUnreachable)
            }
        }
    }

    fn store_write(&mut self, point: &Point) -> Result<(), TransientError> {
        let line = point.to_line();
        debug!("Store: {}", line);
        match self.exchange(embedded_svc::http::Method::Post, &self.write_url, line.as_bytes()) {
            Ok(status) if is_success(status) => Ok(()),
            Ok(status) => {
                warn!("Store: write answered HTTP {}", status);
                Err(TransientError::StoreWriteFailed)
            }
            Err(e) => {
                warn!("Store: write failed ({e:#})");
                Err(TransientError::StoreUnreachable)
            }
        }
    }
}
