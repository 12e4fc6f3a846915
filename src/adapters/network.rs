//! Network bundle: one value implementing every port behind the Wi-Fi
//! link, so the mode controller takes a single `net` argument.
//!
//! The console is always the TCP line server, advertised over mDNS while
//! it is open. Broker, store and wall
//! clock are generic so the firmware plugs in the ESP-IDF clients and
//! host tests can plug in anything else.

use crate::app::ports::{
    AdvertisePort, BrokerEvent, BrokerPort, ConsolePort, ServiceAdvert, TimeSeriesPort, TimeSyncPort,
};
use crate::cloud::line_protocol::Point;
use crate::error::TransientError;

use super::console_server::ConsoleServer;
use super::mdns::MdnsAdapter;

pub struct NetworkAdapter<B, T, C> {
    pub console: ConsoleServer,
    pub mdns: MdnsAdapter,
    pub broker: B,
    pub store: T,
    pub clock: C,
}

impl<B, T, C> NetworkAdapter<B, T, C> {
    pub fn new(console: ConsoleServer, broker: B, store: T, clock: C) -> Self {
        Self { console, mdns: MdnsAdapter::new(), broker, store, clock }
    }
}

impl<B, T, C> AdvertisePort for NetworkAdapter<B, T, C> {
    fn advertise_start(&mut self, advert: &ServiceAdvert<'_>) -> Result<(), TransientError> {
        self.mdns.start(advert)
    }

    fn advertise_stop(&mut self) {
        self.mdns.stop();
    }
}

impl<B, T, C> ConsolePort for NetworkAdapter<B, T, C> {
    fn console_start(&mut self) -> Result<(), TransientError> {
        self.console.console_start()
    }

    fn console_stop(&mut self) {
        self.console.console_stop();
    }

    fn console_poll_line(&mut self) -> Option<String> {
        self.console.console_poll_line()
    }

    fn console_write_line(&mut self, line: &str) {
        self.console.console_write_line(line);
    }
}

impl<B: BrokerPort, T, C> BrokerPort for NetworkAdapter<B, T, C> {
    fn broker_connect(&mut self, client_id: &str) -> Result<(), TransientError> {
        self.broker.broker_connect(client_id)
    }

    fn broker_disconnect(&mut self) {
        self.broker.broker_disconnect();
    }

    fn broker_poll(&mut self) -> Option<BrokerEvent> {
        self.broker.broker_poll()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransientError> {
        self.broker.subscribe(topic)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), TransientError> {
        self.broker.publish(topic, payload, retain)
    }
}

impl<B, T: TimeSeriesPort, C> TimeSeriesPort for NetworkAdapter<B, T, C> {
    fn store_validate(&mut self) -> Result<(), TransientError> {
        self.store.store_validate()
    }

    fn store_write(&mut self, point: &Point) -> Result<(), TransientError> {
        self.store.store_write(point)
    }
}

impl<B, T, C: TimeSyncPort> TimeSyncPort for NetworkAdapter<B, T, C> {
    fn sync_time(&mut self, timezone: &str, servers: &[String]) -> Result<(), TransientError> {
        self.clock.sync_time(timezone, servers)
    }

    fn unix_time(&self) -> Option<u64> {
        self.clock.unix_time()
    }
}

/// Broker and store stand-ins for host runs without a network.
pub mod offline {
    use super::*;

    #[derive(Debug, Default)]
    pub struct NoBroker;

    impl BrokerPort for NoBroker {
        fn broker_connect(&mut self, _client_id: &str) -> Result<(), TransientError> {
            Err(TransientError::BrokerUnreachable)
        }

        fn broker_disconnect(&mut self) {}

        fn broker_poll(&mut self) -> Option<BrokerEvent> {
            None
        }

        fn subscribe(&mut self, _topic: &str) -> Result<(), TransientError> {
            Err(TransientError::BrokerUnreachable)
        }

        fn publish(&mut self, _topic: &str, _payload: &[u8], _retain: bool) -> Result<(), TransientError> {
            Err(TransientError::BrokerUnreachable)
        }
    }

    /// Logs points instead of sending them.
    #[derive(Debug, Default)]
    pub struct LogStore {
        pub written: usize,
    }

    impl TimeSeriesPort for LogStore {
        fn store_validate(&mut self) -> Result<(), TransientError> {
            Ok(())
        }

        fn store_write(&mut self, point: &Point) -> Result<(), TransientError> {
            log::info!("STORE | {}", point.to_line());
            self.written += 1;
            Ok(())
        }
    }
}
