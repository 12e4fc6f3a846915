//! InfluxDB line protocol points.
//!
//! `measurement,tag=v,tag=v field=1i,field=2.5 <seconds>`
//!
//! Integer fields carry the `i` suffix. Timestamps are whole seconds and
//! the writer must request `precision=s`.

use core::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}i"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp_s: Option<u64>,
}

impl Point {
    pub fn new(measurement: &str) -> Self {
        Self {
            measurement: measurement.to_owned(),
            ..Self::default()
        }
    }

    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.tags.push((key.to_owned(), value.to_owned()));
    }

    pub fn add_int(&mut self, key: &str, value: i64) {
        self.fields.push((key.to_owned(), FieldValue::Int(value)));
    }

    pub fn add_float(&mut self, key: &str, value: f64) {
        self.fields.push((key.to_owned(), FieldValue::Float(value)));
    }

    /// Drop fields and timestamp, keep measurement and tags.
    pub fn clear_fields(&mut self) {
        self.fields.clear();
        self.timestamp_s = None;
    }

    pub fn set_timestamp(&mut self, unix_secs: u64) {
        self.timestamp_s = Some(unix_secs);
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp_s
    }

    /// Serialise to one line, no trailing newline.
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_line(&mut line);
        line
    }

    fn write_line(&self, out: &mut impl Write) -> fmt::Result {
        escape_into(out, &self.measurement, &[',', ' '])?;
        for (k, v) in &self.tags {
            out.write_char(',')?;
            escape_into(out, k, &[',', '=', ' '])?;
            out.write_char('=')?;
            escape_into(out, v, &[',', '=', ' '])?;
        }
        for (i, (k, v)) in self.fields.iter().enumerate() {
            out.write_char(if i == 0 { ' ' } else { ',' })?;
            escape_into(out, k, &[',', '=', ' '])?;
            write!(out, "={v}")?;
        }
        if let Some(ts) = self.timestamp_s {
            write!(out, " {ts}")?;
        }
        Ok(())
    }
}

fn escape_into(out: &mut impl Write, s: &str, special: &[char]) -> fmt::Result {
    for c in s.chars() {
        if special.contains(&c) {
            out.write_char('\\')?;
        }
        out.write_char(c)?;
    }
    Ok(())
}
