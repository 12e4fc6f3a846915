//! Wi-Fi station bring-up and link queries.
//!
//! Credentials come from the build environment (`ORION_WIFI_SSID`,
//! `ORION_WIFI_PASS`). The station is started once from `main()` and
//! stays up for every mode; only the console and broker come and go.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` plus raw netif /
//!   driver queries for address and RSSI.
//! - **all other targets**: no link; queries report `None`.

use core::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials built in"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
        }
    }
}

impl std::error::Error for WifiError {}

/// Build-time credentials, if any were provided.
pub fn built_in_credentials() -> Option<(&'static str, &'static str)> {
    let ssid = option_env!("ORION_WIFI_SSID")?;
    Some((ssid, option_env!("ORION_WIFI_PASS").unwrap_or("")))
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

// ── Station bring-up ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn connect_station(
    modem: esp_idf_hal::modem::Modem,
    sys_loop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
) -> anyhow::Result<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>> {
    use anyhow::anyhow;
    use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
    use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
    use log::{info, warn};

    let (ssid, password) = built_in_credentials().ok_or(WifiError::NoCredentials)?;
    validate_ssid(ssid)?;
    validate_password(password)?;

    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sys_loop.clone(), Some(nvs))?, sys_loop)?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: ssid.try_into().map_err(|_| anyhow!("wifi ssid too long"))?,
        password: password.try_into().map_err(|_| anyhow!("wifi password too long"))?,
        auth_method: if password.is_empty() { AuthMethod::None } else { AuthMethod::WPAWPA2Personal },
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("WiFi: connecting to '{}'", ssid);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => break,
            Err(e) if attempt < 5 => {
                warn!("WiFi: attempt {} failed ({e}), retrying", attempt);
                let _ = wifi.disconnect();
                esp_idf_hal::delay::FreeRtos::delay_ms(2_000);
            }
            Err(e) => return Err(e.into()),
        }
    }
    info!("WiFi: connected, IP {:?}", station_ip());
    Ok(wifi)
}

// ── Link queries ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn station_ip() -> Option<Ipv4Addr> {
    use esp_idf_svc::sys::*;
    // SAFETY: read-only queries of the default STA netif; the handle is
    // owned by the Wi-Fi driver and outlives these calls.
    unsafe {
        let netif = esp_netif_get_handle_from_ifkey(c"WIFI_STA_DEF".as_ptr());
        if netif.is_null() {
            return None;
        }
        let mut info: esp_netif_ip_info_t = core::mem::zeroed();
        if esp_netif_get_ip_info(netif, &mut info) != ESP_OK as i32 || info.ip.addr == 0 {
            return None;
        }
        // lwIP keeps addresses in network order.
        Some(Ipv4Addr::from(info.ip.addr.to_le_bytes()))
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn station_ip() -> Option<Ipv4Addr> {
    None
}

#[cfg(target_os = "espidf")]
pub fn station_rssi() -> Option<i8> {
    use esp_idf_svc::sys::*;
    // SAFETY: fills a caller-owned record; fails cleanly when not associated.
    unsafe {
        let mut ap: wifi_ap_record_t = core::mem::zeroed();
        if esp_wifi_sta_get_ap_info(&mut ap) != ESP_OK as i32 {
            return None;
        }
        Some(ap.rssi)
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn station_rssi() -> Option<i8> {
    None
}
