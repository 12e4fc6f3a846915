//! Minimal NMEA 0183 decoder: GGA sentences only.
//!
//! Bytes from the GPS UART are pushed one at a time. A complete
//! `$xxGGA` sentence with a valid checksum updates the satellite count,
//! and with fix quality > 0 also the position. Everything else is
//! dropped silently.

use crate::sensors::GpsFix;

/// NMEA caps sentences at 82 characters; leave headroom for noisy talkers.
const MAX_SENTENCE: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceError {
    /// Not a GGA sentence.
    Ignored,
    BadChecksum,
    /// No `*hh` trailer.
    MissingChecksum,
    Malformed,
}

/// One decoded GGA sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gga {
    /// 0 = no fix.
    pub quality: u8,
    pub satellites: u8,
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
}

pub struct NmeaDecoder {
    line: heapless::String<MAX_SENTENCE>,
    overflow: bool,
    fix: Option<GpsFix>,
    satellites: u8,
    sentences: u32,
    checksum_errors: u32,
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self {
            line: heapless::String::new(),
            overflow: false,
            fix: None,
            satellites: 0,
            sentences: 0,
            checksum_errors: 0,
        }
    }

    /// Forget the fix and any partial line. Called when the UART closes.
    pub fn reset(&mut self) {
        self.line.clear();
        self.overflow = false;
        self.fix = None;
        self.satellites = 0;
    }

    pub fn fix(&self) -> Option<GpsFix> {
        self.fix
    }

    pub fn satellites(&self) -> u8 {
        self.satellites
    }

    /// Good GGA sentences decoded so far.
    pub fn sentences(&self) -> u32 {
        self.sentences
    }

    pub fn checksum_errors(&self) -> u32 {
        self.checksum_errors
    }

    pub fn push(&mut self, byte: u8) {
        match byte {
            b'$' => {
                self.line.clear();
                self.overflow = false;
                let _ = self.line.push('$');
            }
            b'\r' | b'\n' => {
                if !self.line.is_empty() && !self.overflow {
                    self.finish_line();
                }
                self.line.clear();
                self.overflow = false;
            }
            b if b.is_ascii() && !b.is_ascii_control() => {
                if self.line.push(b as char).is_err() {
                    self.overflow = true;
                }
            }
            _ => self.overflow = true,
        }
    }

    pub fn push_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    fn finish_line(&mut self) {
        match parse_gga(&self.line) {
            Ok(gga) => {
                self.sentences = self.sentences.wrapping_add(1);
                self.satellites = gga.satellites;
                self.fix = (gga.quality > 0).then_some(GpsFix {
                    lat: gga.lat,
                    lon: gga.lon,
                    alt_m: gga.alt_m,
                    satellites: gga.satellites,
                });
            }
            Err(SentenceError::BadChecksum) => {
                self.checksum_errors = self.checksum_errors.wrapping_add(1);
            }
            Err(_) => {}
        }
    }
}

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Parse one sentence (with leading `$` and `*hh` checksum, without line
/// terminator).
pub fn parse_gga(sentence: &str) -> Result<Gga, SentenceError> {
    let sentence = sentence.strip_prefix('$').ok_or(SentenceError::Malformed)?;
    let (body, cs) = sentence.split_once('*').ok_or(SentenceError::MissingChecksum)?;
    let expected = u8::from_str_radix(cs.trim(), 16).map_err(|_| SentenceError::Malformed)?;
    if checksum(body) != expected {
        return Err(SentenceError::BadChecksum);
    }

    let mut fields = body.split(',');
    let talker = fields.next().ok_or(SentenceError::Malformed)?;
    if talker.len() != 5 || !talker.ends_with("GGA") {
        return Err(SentenceError::Ignored);
    }

    let _utc = fields.next();
    let lat = fields.next().unwrap_or("");
    let ns = fields.next().unwrap_or("");
    let lon = fields.next().unwrap_or("");
    let ew = fields.next().unwrap_or("");
    let quality = fields.next().unwrap_or("").parse::<u8>().map_err(|_| SentenceError::Malformed)?;
    let satellites = fields.next().unwrap_or("").parse::<u8>().unwrap_or(0);
    let _hdop = fields.next();
    let alt = fields.next().unwrap_or("");

    if quality == 0 {
        return Ok(Gga { quality, satellites, lat: 0.0, lon: 0.0, alt_m: 0.0 });
    }

    let lat = degrees(lat, 2, 90.0, ns, 'S')?;
    let lon = degrees(lon, 3, 180.0, ew, 'W')?;
    let alt_m = alt.parse::<f64>().unwrap_or(0.0);
    Ok(Gga { quality, satellites, lat, lon, alt_m })
}

/// `ddmm.mmmm` / `dddmm.mmmm` to signed decimal degrees.
fn degrees(field: &str, deg_digits: usize, max: f64, hemi: &str, negative: char) -> Result<f64, SentenceError> {
    if field.len() <= deg_digits || !field.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(SentenceError::Malformed);
    }
    let (d, m) = field.split_at(deg_digits);
    let d: f64 = d.parse().map_err(|_| SentenceError::Malformed)?;
    let m: f64 = m.parse().map_err(|_| SentenceError::Malformed)?;
    let value = d + m / 60.0;
    if m >= 60.0 || value > max {
        return Err(SentenceError::Malformed);
    }
    Ok(if hemi.starts_with(negative) { -value } else { value })
}
