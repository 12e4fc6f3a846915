//! Status display adapter.
//!
//! Keeps a frame of text rows the size of a 128×64 panel with a 6×8 font
//! and writes the frame to the log on `flush` when it changed. A real
//! panel driver would implement [`DisplayPort`] the same way, drawing the
//! frame instead of logging it.

use log::info;

use crate::app::ports::DisplayPort;

pub const ROWS: usize = 8;
pub const COLS: usize = 21;

#[derive(Debug, Default)]
pub struct LogDisplay {
    frame: [String; ROWS],
    shown: [String; ROWS],
    flushes: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row contents as last flushed.
    pub fn shown(&self) -> &[String; ROWS] {
        &self.shown
    }

    /// Flushes that actually changed the panel.
    pub fn flushes(&self) -> u32 {
        self.flushes
    }
}

impl DisplayPort for LogDisplay {
    fn clear(&mut self) {
        for row in &mut self.frame {
            row.clear();
        }
    }

    fn print_line(&mut self, row: u8, text: &str) {
        let Some(slot) = self.frame.get_mut(usize::from(row)) else {
            return;
        };
        slot.clear();
        slot.extend(text.chars().take(COLS));
    }

    fn flush(&mut self) {
        if self.frame == self.shown {
            return;
        }
        self.shown.clone_from(&self.frame);
        self.flushes += 1;
        for (i, row) in self.shown.iter().enumerate().filter(|(_, r)| !r.is_empty()) {
            info!("LCD {} | {}", i, row);
        }
    }
}
