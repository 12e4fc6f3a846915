//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements            | Connects to                 |
//! |------------------|-----------------------|-----------------------------|
//! | `hardware`       | Board (all PCB ports) | GPIO, ADC, DHT11, LEDC, UART|
//! | `display`        | DisplayPort           | Log-backed 8x21 frame       |
//! | `console_server` | ConsolePort           | TCP line console            |
//! | `mdns`           | AdvertisePort         | ESP-IDF mDNS responder      |
//! | `mqtt`           | BrokerPort            | ESP-IDF MQTT client         |
//! | `influx`         | TimeSeriesPort        | InfluxDB v2 over HTTP       |
//! | `sntp`           | TimeSyncPort          | ESP-IDF SNTP + TZ           |
//! | `network`        | Network (bundle)      | console + broker + store    |
//! | `log_sink`       | EventSink             | Serial log output           |
//! | `time`           | ClockPort             | ESP32 system timer          |
//! | `wifi`           | -                     | ESP-IDF WiFi STA            |

pub mod console_server;
pub mod display;
pub mod hardware;
pub mod influx;
pub mod log_sink;
pub mod mdns;
#[cfg(target_os = "espidf")]
pub mod mqtt;
pub mod network;
pub mod sntp;
pub mod time;
pub mod wifi;
