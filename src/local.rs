//! Local mode: text console server driving the command interpreter.

use log::{debug, warn};

use crate::app::events::{AppEvent, CommandSource};
use crate::app::ports::{Board, ConsolePort, EventSink, Network, ReplySink, ServiceAdvert};
use crate::config::SystemConfig;
use crate::console::{CommandInterpreter, SERVO_COUNT};
use crate::error::{Error, Result};
use crate::mode::Devices;

/// Writes interpreter replies straight to the console transport.
struct ConsoleReplies<'a, C: ConsolePort>(&'a mut C);

impl<C: ConsolePort> ReplySink for ConsoleReplies<'_, C> {
    fn reply(&mut self, line: &str) {
        debug!("Console > {line}");
        self.0.console_write_line(line);
    }
}

/// mDNS service name the console is advertised under.
pub const CONSOLE_SERVICE: &str = "_telnet";
pub const CONSOLE_PROTO: &str = "_tcp";
const CONSOLE_INSTANCE: &str = "Orion console";

pub struct LocalSession {
    interpreter: CommandInterpreter,
    hostname: String,
    console_port: u16,
    gps_baud: u32,
    gps_bytes_per_tick: usize,
    lines_per_tick: usize,
    ldr_resolution_bits: u8,
}

impl LocalSession {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            interpreter: CommandInterpreter::new(config.reset_delay_ms),
            hostname: config.mdns_hostname.clone(),
            console_port: config.console_port,
            gps_baud: config.gps_baud,
            gps_bytes_per_tick: config.gps_bytes_per_tick,
            lines_per_tick: config.console_lines_per_tick,
            ldr_resolution_bits: config.ldr_resolution_bits,
        }
    }

    /// Attach servos, configure the light sensor, open and advertise the
    /// console, start the GPS feed. If the console cannot open, the servos
    /// are detached again and the error is returned. A failed mDNS
    /// registration only costs the `.local` name.
    pub fn enter(&mut self, hw: &mut impl Board, net: &mut impl Network, devices: &mut Devices) -> Result<()> {
        for i in 0..SERVO_COUNT {
            hw.attach_servo(i);
        }
        devices.light.configure(hw, self.ldr_resolution_bits);

        if let Err(e) = net.console_start() {
            warn!("Local: {e}");
            for i in 0..SERVO_COUNT {
                hw.detach_servo(i);
            }
            return Err(Error::Transient(e));
        }

        let advert = ServiceAdvert {
            hostname: &self.hostname,
            instance: CONSOLE_INSTANCE,
            service: CONSOLE_SERVICE,
            proto: CONSOLE_PROTO,
            port: self.console_port,
        };
        if let Err(e) = net.advertise_start(&advert) {
            warn!("Local: {e}, console reachable by IP only");
        }

        hw.gps_begin(self.gps_baud);

        hw.clear();
        hw.print_line(0, "== LOCAL MODE ==");
        match hw.ip_address() {
            Some(ip) => hw.print_line(1, &format!("IP: {ip}")),
            None => hw.print_line(1, "IP: --"),
        }
        hw.print_line(2, "Console ready");
        hw.flush();
        Ok(())
    }

    /// Feed the GPS decoder, then handle a bounded number of console lines.
    pub fn tick(
        &mut self,
        hw: &mut impl Board,
        net: &mut impl Network,
        devices: &mut Devices,
        events: &mut impl EventSink,
    ) {
        hw.gps_pump(self.gps_bytes_per_tick);

        for _ in 0..self.lines_per_tick {
            let Some(line) = net.console_poll_line() else {
                break;
            };
            debug!("Console < {line}");
            let mut out = ConsoleReplies(&mut *net);
            if let Err(error) = self.interpreter.execute(
                &line,
                hw,
                &mut devices.actuators,
                &mut devices.lock_timer,
                &devices.light,
                &mut out,
                &mut *events,
            ) {
                events.emit(&AppEvent::CommandRejected { source: CommandSource::Console, error });
            }
        }
    }

    pub fn exit(&mut self, hw: &mut impl Board, net: &mut impl Network) {
        net.console_stop();
        net.advertise_stop();
        hw.gps_end();
        for i in 0..SERVO_COUNT {
            hw.detach_servo(i);
        }
    }
}
