//! Orion Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            NetworkAdapter         LogEventSink│
//! │  (pins, ADC, DHT11, GPS,    (console, MQTT,        (EventSink) │
//! │   servos, display, clock)    InfluxDB, SNTP)                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ModeController (pure logic)               │    │
//! │  │  Local console · Cloud session · Test harness · Relock │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ButtonDriver (Confirm / Back) · Watchdog                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use orion::adapters::console_server::ConsoleServer;
use orion::adapters::hardware::HardwareAdapter;
use orion::adapters::influx::InfluxStore;
use orion::adapters::log_sink::LogEventSink;
use orion::adapters::mqtt::EspBroker;
use orion::adapters::network::NetworkAdapter;
use orion::adapters::sntp::SntpClock;
use orion::adapters::wifi;
use orion::app::ports::ClockPort;
use orion::config::SystemConfig;
use orion::drivers::button::ButtonDriver;
use orion::drivers::dht11::Dht11;
use orion::drivers::gps::GpsReceiver;
use orion::drivers::hw_init;
use orion::drivers::servo::{Servo, SERVO_FREQ_HZ};
use orion::drivers::watchdog::{Watchdog, DEFAULT_TIMEOUT_MS};
use orion::mode::ModeController;
use orion::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Orion v{}                           ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate()?;

    // ── 3. Raw peripherals ────────────────────────────────────
    if let Err(e) = hw_init::init_adc() {
        // Light sensor and harness cursor read 0 without it; keep going.
        error!("ADC init failed: {}", e);
    }
    if let Err(e) = hw_init::gpio_configure_button(pins::CONFIRM_BUTTON_GPIO) {
        warn!("Button init failed: {}", e);
    }
    let mut watchdog = Watchdog::new(DEFAULT_TIMEOUT_MS);

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 4. Wi-Fi station (kept for the whole uptime) ──────────
    let _wifi = wifi::connect_station(peripherals.modem, sys_loop, nvs)?;

    // ── 5. Board drivers ──────────────────────────────────────
    let dht_pin = PinDriver::input_output_od(peripherals.pins.gpio23)?;
    let dht = Dht11::new(dht_pin, Ets);

    let servo_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(SERVO_FREQ_HZ))
            .resolution(Resolution::Bits14),
    )?;
    let servos = [
        Servo::new(LedcDriver::new(peripherals.ledc.channel0, &servo_timer, peripherals.pins.gpio15)?),
        Servo::new(LedcDriver::new(peripherals.ledc.channel1, &servo_timer, peripherals.pins.gpio2)?),
        Servo::new(LedcDriver::new(peripherals.ledc.channel2, &servo_timer, peripherals.pins.gpio4)?),
    ];

    let gps_uart = UartDriver::new(
        peripherals.uart2,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(config.gps_baud)),
    )?;

    let mut hw = HardwareAdapter::new(dht, servos, GpsReceiver::new(gps_uart));

    // ── 6. Network adapters ───────────────────────────────────
    let mut net = NetworkAdapter::new(
        ConsoleServer::new(config.console_port),
        EspBroker::new(&config),
        InfluxStore::new(&config),
        SntpClock::new(),
    );
    let mut log_sink = LogEventSink::new();
    let mut button = ButtonDriver::new(pins::CONFIRM_BUTTON_GPIO);

    // ── 7. Mode controller ────────────────────────────────────
    // SAFETY: hardware RNG read, no preconditions.
    let seed = unsafe { esp_idf_svc::sys::esp_random() };
    let tick_ms = config.tick_interval_ms;
    let boot_mode = config.boot_mode;
    let mut controller = ModeController::new(config, seed);

    if let Err(e) = controller.enter(boot_mode, &mut hw, &mut net, &mut log_sink) {
        warn!("Boot: {} mode failed ({}), staying in menu", boot_mode.name(), e);
    }

    info!("System ready. Entering main loop.");

    // ── 8. Main loop ──────────────────────────────────────────
    loop {
        if let Some(input) = button.poll(hw.now_ms()) {
            if let Err(e) = controller.handle_input(input, &mut hw, &mut net, &mut log_sink) {
                warn!("Input {:?}: {}", input, e);
            }
        }

        controller.tick(&mut hw, &mut net, &mut log_sink);

        watchdog.feed();
        FreeRtos::delay_ms(tick_ms);
    }
}
