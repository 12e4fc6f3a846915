//! Mock board and network adapters for integration tests.
//!
//! Records every pin write, servo move, display frame and network call so
//! tests can assert on the full history without real peripherals. Time
//! only moves when a test advances it or the code under test calls
//! `delay_ms`.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

use orion::app::events::AppEvent;
use orion::app::ports::{
    AdcPort, AdvertisePort, BrokerEvent, BrokerPort, ClimatePort, ClockPort, ConsolePort, DisplayPort,
    EventSink, GpsPort, InboundMessage, PinPort, ServiceAdvert, ServoPort, SystemPort, TimeSeriesPort,
    TimeSyncPort,
};
use orion::cloud::line_protocol::Point;
use orion::config::SystemConfig;
use orion::error::{HardwareReadInvalid, TransientError};
use orion::mode::ModeController;
use orion::pins;
use orion::sensors::{ClimateReading, GpsFix};

// ── Board ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinState {
    pub claimed: bool,
    pub high: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServoState {
    pub attached: bool,
    pub angle: Option<u8>,
}

pub struct MockBoard {
    pub now: u64,
    pub pins: HashMap<i32, PinState>,
    /// Every `write_pin`, in order.
    pub writes: Vec<(i32, bool)>,
    pub adc: HashMap<i32, u16>,
    pub adc_config: HashMap<i32, u8>,
    pub climate: Result<ClimateReading, HardwareReadInvalid>,
    pub climate_reads: u32,
    pub gps_open: bool,
    pub gps_baud: Option<u32>,
    pub gps_fix: Option<GpsFix>,
    pub gps_sats: u8,
    pub gps_pumped: usize,
    pub servos: [ServoState; 3],
    pub ip: Option<Ipv4Addr>,
    pub rssi: Option<i8>,
    pub restarts: u32,
    pub frame: Vec<String>,
    pub shown: Vec<String>,
    pub flushes: u32,
}

impl MockBoard {
    pub fn new() -> Self {
        let mut adc = HashMap::new();
        adc.insert(pins::LDR_ADC_GPIO, 2200);
        adc.insert(pins::POT_ADC_GPIO, 0);
        Self {
            now: 1_000,
            pins: HashMap::new(),
            writes: Vec::new(),
            adc,
            adc_config: HashMap::new(),
            climate: Ok(ClimateReading { temperature_c: 22, humidity_pct: 41 }),
            climate_reads: 0,
            gps_open: false,
            gps_baud: None,
            gps_fix: None,
            gps_sats: 0,
            gps_pumped: 0,
            servos: [ServoState::default(); 3],
            ip: Some(Ipv4Addr::new(192, 168, 1, 50)),
            rssi: Some(-61),
            restarts: 0,
            frame: vec![String::new(); 8],
            shown: vec![String::new(); 8],
            flushes: 0,
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    pub fn level(&self, pin: i32) -> bool {
        self.pins.get(&pin).is_some_and(|p| p.high)
    }

    pub fn is_claimed(&self, pin: i32) -> bool {
        self.pins.get(&pin).is_some_and(|p| p.claimed)
    }

    pub fn relay_level(&self, n: usize) -> bool {
        self.level(pins::RELAY_GPIOS[n - 1])
    }

    pub fn lock_level(&self) -> bool {
        self.level(pins::LOCK_GPIO)
    }

    /// Levels written to `pin`, oldest first.
    pub fn history(&self, pin: i32) -> Vec<bool> {
        self.writes.iter().filter(|(p, _)| *p == pin).map(|(_, h)| *h).collect()
    }

    pub fn any_actuator_claimed(&self) -> bool {
        pins::ACTUATOR_GPIOS.iter().any(|p| self.is_claimed(*p))
    }

    pub fn shown_line(&self, row: usize) -> &str {
        &self.shown[row]
    }

    pub fn shows(&self, text: &str) -> bool {
        self.shown.iter().any(|l| l.contains(text))
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now += u64::from(ms);
    }
}

impl PinPort for MockBoard {
    fn claim_output(&mut self, pin: i32) {
        self.pins.insert(pin, PinState { claimed: true, high: false });
    }

    fn release_pin(&mut self, pin: i32) {
        self.pins.insert(pin, PinState { claimed: false, high: false });
    }

    fn write_pin(&mut self, pin: i32, high: bool) {
        self.writes.push((pin, high));
        self.pins.entry(pin).or_default().high = high;
    }

    fn read_pin(&self, pin: i32) -> bool {
        self.level(pin)
    }
}

impl AdcPort for MockBoard {
    fn configure_adc(&mut self, pin: i32, resolution_bits: u8) {
        self.adc_config.insert(pin, resolution_bits);
    }

    fn read_adc(&mut self, pin: i32) -> u16 {
        self.adc.get(&pin).copied().unwrap_or(0)
    }
}

impl ClimatePort for MockBoard {
    fn read_climate(&mut self) -> Result<ClimateReading, HardwareReadInvalid> {
        self.climate_reads += 1;
        self.climate
    }
}

impl GpsPort for MockBoard {
    fn gps_begin(&mut self, baud: u32) {
        self.gps_open = true;
        self.gps_baud = Some(baud);
    }

    fn gps_end(&mut self) {
        self.gps_open = false;
    }

    fn gps_pump(&mut self, max_bytes: usize) -> usize {
        if !self.gps_open {
            return 0;
        }
        self.gps_pumped += max_bytes;
        max_bytes
    }

    fn gps_fix(&self) -> Option<GpsFix> {
        self.gps_fix
    }

    fn gps_satellites(&self) -> u8 {
        self.gps_fix.map_or(self.gps_sats, |f| f.satellites)
    }
}

impl ServoPort for MockBoard {
    fn attach_servo(&mut self, index: usize) {
        if let Some(s) = self.servos.get_mut(index) {
            s.attached = true;
            s.angle = Some(90);
        }
    }

    fn write_servo(&mut self, index: usize, angle: u8) {
        if let Some(s) = self.servos.get_mut(index) {
            s.angle = Some(angle);
        }
    }

    fn detach_servo(&mut self, index: usize) {
        if let Some(s) = self.servos.get_mut(index) {
            s.attached = false;
            s.angle = None;
        }
    }
}

impl SystemPort for MockBoard {
    fn ip_address(&self) -> Option<Ipv4Addr> {
        self.ip
    }

    fn rssi_dbm(&self) -> Option<i8> {
        self.rssi
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}

impl DisplayPort for MockBoard {
    fn clear(&mut self) {
        self.frame.iter_mut().for_each(String::clear);
    }

    fn print_line(&mut self, row: u8, text: &str) {
        if let Some(line) = self.frame.get_mut(row as usize) {
            *line = text.to_owned();
        }
    }

    fn flush(&mut self) {
        self.shown.clone_from(&self.frame);
        self.flushes += 1;
    }
}

// ── Network ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

impl Published {
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.payload).unwrap()
    }
}

#[derive(Default)]
pub struct MockNetwork {
    // console
    pub console_open: bool,
    pub console_fail: bool,
    pub console_in: VecDeque<String>,
    pub console_out: Vec<String>,
    // broker
    pub connect_fail: bool,
    pub connects: Vec<String>,
    pub disconnects: u32,
    pub broker_events: VecDeque<BrokerEvent>,
    pub subscribe_fail: bool,
    pub subscriptions: Vec<String>,
    pub publish_fail: bool,
    /// Publishes to these topics fail; the rest go through.
    pub publish_fail_topics: Vec<String>,
    pub published: Vec<Published>,
    // store
    pub store_fail: bool,
    pub validate_fail: bool,
    pub validations: u32,
    pub points: Vec<Point>,
    // mDNS
    pub advertise_fail: bool,
    /// `(hostname, service, port)` while advertised
    pub advertised: Option<(String, String, u16)>,
    // wall clock
    pub sync_fail: bool,
    pub syncs: Vec<String>,
    pub unix: Option<u64>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self { unix: Some(1_700_000_000), ..Self::default() }
    }

    pub fn type_line(&mut self, line: &str) {
        self.console_in.push_back(line.to_owned());
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console_out)
    }

    pub fn deliver(&mut self, event: BrokerEvent) {
        self.broker_events.push_back(event);
    }

    pub fn deliver_message(&mut self, topic: &str, payload: &str) {
        self.deliver(BrokerEvent::Message(InboundMessage {
            topic: topic.to_owned(),
            payload: payload.as_bytes().to_vec(),
        }));
    }

    pub fn published_to(&self, topic: &str) -> Vec<&Published> {
        self.published.iter().filter(|p| p.topic == topic).collect()
    }

    pub fn retained(&self) -> Vec<&Published> {
        self.published.iter().filter(|p| p.retain).collect()
    }
}

impl ConsolePort for MockNetwork {
    fn console_start(&mut self) -> Result<(), TransientError> {
        if self.console_fail {
            return Err(TransientError::ConsoleUnavailable);
        }
        self.console_open = true;
        Ok(())
    }

    fn console_stop(&mut self) {
        self.console_open = false;
    }

    fn console_poll_line(&mut self) -> Option<String> {
        if !self.console_open {
            return None;
        }
        self.console_in.pop_front()
    }

    fn console_write_line(&mut self, line: &str) {
        self.console_out.push(line.to_owned());
    }
}

impl BrokerPort for MockNetwork {
    fn broker_connect(&mut self, client_id: &str) -> Result<(), TransientError> {
        self.connects.push(client_id.to_owned());
        if self.connect_fail {
            return Err(TransientError::BrokerUnreachable);
        }
        Ok(())
    }

    fn broker_disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn broker_poll(&mut self) -> Option<BrokerEvent> {
        self.broker_events.pop_front()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransientError> {
        if self.subscribe_fail {
            return Err(TransientError::BrokerSubscribeFailed);
        }
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), TransientError> {
        if self.publish_fail || self.publish_fail_topics.iter().any(|t| t == topic) {
            return Err(TransientError::BrokerPublishFailed);
        }
        self.published.push(Published { topic: topic.to_owned(), payload: payload.to_vec(), retain });
        Ok(())
    }
}

impl TimeSeriesPort for MockNetwork {
    fn store_validate(&mut self) -> Result<(), TransientError> {
        self.validations += 1;
        if self.validate_fail {
            return Err(TransientError::StoreUnreachable);
        }
        Ok(())
    }

    fn store_write(&mut self, point: &Point) -> Result<(), TransientError> {
        if self.store_fail {
            return Err(TransientError::StoreWriteFailed);
        }
        self.points.push(point.clone());
        Ok(())
    }
}

impl TimeSyncPort for MockNetwork {
    fn sync_time(&mut self, timezone: &str, _servers: &[String]) -> Result<(), TransientError> {
        self.syncs.push(timezone.to_owned());
        if self.sync_fail {
            return Err(TransientError::TimeSyncFailed);
        }
        Ok(())
    }

    fn unix_time(&self) -> Option<u64> {
        self.unix
    }
}

impl AdvertisePort for MockNetwork {
    fn advertise_start(&mut self, advert: &ServiceAdvert<'_>) -> Result<(), TransientError> {
        if self.advertise_fail {
            return Err(TransientError::AdvertiseFailed);
        }
        self.advertised = Some((advert.hostname.to_owned(), advert.service.to_owned(), advert.port));
        Ok(())
    }

    fn advertise_stop(&mut self) {
        self.advertised = None;
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Controller plus every collaborator, wired the way `main` wires them.
pub struct Rig {
    pub ctl: ModeController,
    pub hw: MockBoard,
    pub net: MockNetwork,
    pub sink: RecordingSink,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        Self {
            ctl: ModeController::new(config, 0x1234_5678),
            hw: MockBoard::new(),
            net: MockNetwork::new(),
            sink: RecordingSink::new(),
        }
    }

    pub fn enter(&mut self, mode: orion::mode::OperatingMode) -> orion::error::Result<()> {
        self.ctl.enter(mode, &mut self.hw, &mut self.net, &mut self.sink)
    }

    pub fn exit(&mut self) {
        self.ctl.exit(&mut self.hw, &mut self.net, &mut self.sink);
    }

    pub fn tick(&mut self) {
        self.ctl.tick(&mut self.hw, &mut self.net, &mut self.sink);
    }

    pub fn input(&mut self, input: orion::mode::InputEvent) -> orion::error::Result<()> {
        self.ctl.handle_input(input, &mut self.hw, &mut self.net, &mut self.sink)
    }

    /// Advance `ms` in steps of `step`, ticking after each step.
    pub fn run_for(&mut self, ms: u64, step: u64) {
        let end = self.hw.now + ms;
        while self.hw.now < end {
            self.hw.advance(step.min(end - self.hw.now));
            self.tick();
        }
    }

    /// Type one console line and tick once.
    pub fn console(&mut self, line: &str) -> Vec<String> {
        self.net.type_line(line);
        self.tick();
        self.net.take_output()
    }
}
