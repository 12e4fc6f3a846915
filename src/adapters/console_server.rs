//! Telnet-style line console over TCP.
//!
//! Implements [`ConsolePort`] with a non-blocking `std::net` listener, so
//! the main loop polls it like any other collaborator. One operator at a
//! time; a second connection replaces the first. Lines longer than
//! [`MAX_LINE`] are discarded whole.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};

use log::{info, warn};

use crate::app::ports::ConsolePort;
use crate::error::TransientError;

pub const MAX_LINE: usize = 128;
const BANNER: &str = "Orion console. Type 'help' or '?'.";

pub struct ConsoleServer {
    port: u16,
    listener: Option<TcpListener>,
    client: Option<TcpStream>,
    partial: Vec<u8>,
    overflow: bool,
    lines: VecDeque<String>,
}

impl ConsoleServer {
    /// `port` 0 picks an ephemeral port (tests).
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listener: None,
            client: None,
            partial: Vec::new(),
            overflow: false,
            lines: VecDeque::new(),
        }
    }

    /// Bound address while started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    fn accept_pending(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };
        match listener.accept() {
            Ok((stream, peer)) => {
                if stream.set_nonblocking(true).is_err() {
                    warn!("Console: could not make {peer} non-blocking, dropping");
                    return;
                }
                if self.client.is_some() {
                    info!("Console: {peer} replaces the current operator");
                } else {
                    info!("Console: {peer} connected");
                }
                self.partial.clear();
                self.overflow = false;
                self.client = Some(stream);
                self.console_write_line(BANNER);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => warn!("Console: accept failed ({e})"),
        }
    }

    fn read_pending(&mut self) {
        let Some(stream) = self.client.as_mut() else {
            return;
        };
        let mut received = Vec::new();
        let mut buf = [0u8; 256];
        let mut connected = true;
        loop {
            match stream.read(&mut buf) {
                Ok(0) => {
                    info!("Console: operator disconnected");
                    connected = false;
                    break;
                }
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Console: read failed ({e})");
                    connected = false;
                    break;
                }
            }
        }
        if !connected {
            self.client = None;
        }
        for b in received {
            self.push_byte(b);
        }
    }

    fn push_byte(&mut self, b: u8) {
        match b {
            b'\n' => {
                if !self.overflow {
                    let line = String::from_utf8_lossy(&self.partial).trim().to_owned();
                    if !line.is_empty() {
                        self.lines.push_back(line);
                    }
                }
                self.partial.clear();
                self.overflow = false;
            }
            b'\r' => {}
            _ if self.partial.len() >= MAX_LINE => self.overflow = true,
            _ => self.partial.push(b),
        }
    }
}

impl ConsolePort for ConsoleServer {
    fn console_start(&mut self) -> Result<(), TransientError> {
        if self.listener.is_some() {
            return Ok(());
        }
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, self.port)).map_err(|e| {
            warn!("Console: bind :{} failed ({e})", self.port);
            TransientError::ConsoleUnavailable
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| TransientError::ConsoleUnavailable)?;
        info!("Console: listening on {:?}", listener.local_addr().ok());
        self.listener = Some(listener);
        Ok(())
    }

    fn console_stop(&mut self) {
        if let Some(mut stream) = self.client.take() {
            let _ = stream.write_all(b"Console closed.\r\n");
        }
        self.listener = None;
        self.partial.clear();
        self.lines.clear();
        info!("Console: stopped");
    }

    fn console_poll_line(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            self.accept_pending();
            self.read_pending();
        }
        self.lines.pop_front()
    }

    fn console_write_line(&mut self, line: &str) {
        let Some(stream) = self.client.as_mut() else {
            return;
        };
        let sent = stream
            .write_all(line.as_bytes())
            .and_then(|()| stream.write_all(b"\r\n"));
        if let Err(e) = sent {
            warn!("Console: write failed ({e}), dropping operator");
            self.client = None;
        }
    }
}
