//! Wall-clock adapter: timezone plus SNTP.
//!
//! - **`target_os = "espidf"`**: sets `TZ`, starts `EspSntp` against the
//!   configured servers and waits briefly for the first sync.
//! - **`not(target_os = "espidf")`**: the host clock is already set;
//!   sync is a no-op.
//!
//! Either way, `unix_time` refuses to report anything before 2020 so an
//! unsynced RTC never stamps a point with 1970.

use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_os = "espidf")]
use log::{info, warn};

use crate::app::ports::TimeSyncPort;
use crate::error::TransientError;

/// Anything earlier means the clock was never set.
const EPOCH_2020: u64 = 1_577_836_800;

#[cfg(target_os = "espidf")]
const SYNC_WAIT_MS: u32 = 4_000;
#[cfg(target_os = "espidf")]
const SYNC_POLL_MS: u32 = 100;

pub fn plausible_unix_time(secs: u64) -> Option<u64> {
    (secs >= EPOCH_2020).then_some(secs)
}

#[derive(Default)]
pub struct SntpClock {
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
}

impl SntpClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(target_os = "espidf")]
    fn set_timezone(tz: &str) {
        // SAFETY: TZ is only touched here, from the main task, and nothing
        // else reads the environment concurrently.
        unsafe {
            std::env::set_var("TZ", tz);
            esp_idf_svc::sys::tzset();
        }
    }
}

impl TimeSyncPort for SntpClock {
    #[cfg(target_os = "espidf")]
    fn sync_time(&mut self, timezone: &str, servers: &[String]) -> Result<(), TransientError> {
        use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};

        Self::set_timezone(timezone);

        if self.sntp.is_none() {
            let mut conf = SntpConf::default();
            // The service outlives every mode, so the names are leaked once.
            for (slot, server) in conf.servers.iter_mut().zip(servers) {
                *slot = Box::leak(server.clone().into_boxed_str());
            }
            let sntp = EspSntp::new(&conf).map_err(|e| {
                warn!("SNTP: start failed ({e})");
                TransientError::TimeSyncFailed
            })?;
            self.sntp = Some(sntp);
        }

        let Some(sntp) = &self.sntp else {
            return Err(TransientError::TimeSyncFailed);
        };
        let mut waited = 0;
        while sntp.get_sync_status() != SyncStatus::Completed {
            if waited >= SYNC_WAIT_MS {
                warn!("SNTP: no sync after {} ms", SYNC_WAIT_MS);
                return Err(TransientError::TimeSyncFailed);
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(SYNC_POLL_MS);
            waited += SYNC_POLL_MS;
        }
        info!("SNTP: clock synchronised ({})", timezone);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn sync_time(&mut self, timezone: &str, _servers: &[String]) -> Result<(), TransientError> {
        log::info!("SNTP(sim): host clock used, tz {}", timezone);
        Ok(())
    }

    fn unix_time(&self) -> Option<u64> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        plausible_unix_time(secs)
    }
}
