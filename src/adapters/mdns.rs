//! mDNS service advertisement adapter.
//!
//! Publishes `<hostname>.local` and one service record (the line console,
//! `_telnet._tcp`) while Local mode is up. Uses the `esp-idf-svc` mDNS
//! wrapper on ESP-IDF and only logs on simulation targets.
//!
//! Lifecycle follows the console: start on Local entry, stop on exit.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::ServiceAdvert;
use crate::error::TransientError;

/// mDNS advertisement adapter.
#[derive(Default)]
pub struct MdnsAdapter {
    #[cfg(target_os = "espidf")]
    mdns: Option<esp_idf_svc::mdns::EspMdns>,
    hostname: String,
    active: bool,
}

impl MdnsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Host name last advertised, without `.local`.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Start hostname + service advertisement. Idempotent while active.
    /// Call after Wi-Fi is connected and has an IP.
    pub fn start(&mut self, advert: &ServiceAdvert<'_>) -> Result<(), TransientError> {
        if self.active {
            return Ok(());
        }
        self.platform_start(advert)?;
        self.hostname = advert.hostname.to_owned();
        self.active = true;
        info!(
            "mDNS: advertising {}.local -> {}.{}:{}",
            advert.hostname, advert.service, advert.proto, advert.port
        );
        Ok(())
    }

    /// Withdraw the advertisement.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self, advert: &ServiceAdvert<'_>) -> Result<(), TransientError> {
        use esp_idf_svc::mdns::EspMdns;

        let registered = EspMdns::take().and_then(|mut mdns| {
            mdns.set_hostname(advert.hostname)?;
            mdns.set_instance_name(advert.instance)?;
            mdns.add_service(
                Some(advert.instance),
                advert.service,
                advert.proto,
                advert.port,
                &[("version", env!("CARGO_PKG_VERSION"))],
            )?;
            Ok(mdns)
        });
        match registered {
            Ok(mdns) => {
                self.mdns = Some(mdns);
                Ok(())
            }
            Err(e) => {
                warn!("mDNS: registration failed ({e})");
                Err(TransientError::AdvertiseFailed)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self, advert: &ServiceAdvert<'_>) -> Result<(), TransientError> {
        info!(
            "mDNS(sim): registered {}.local {}.{}:{} v={}",
            advert.hostname,
            advert.service,
            advert.proto,
            advert.port,
            env!("CARGO_PKG_VERSION")
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        // Dropping the handle frees the responder.
        self.mdns = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        info!("mDNS(sim): unregistered");
    }
}
