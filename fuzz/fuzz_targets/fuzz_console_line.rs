//! Fuzz target: console tokeniser and argument parsers
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use orion::console::command::{Command, parse_angle, parse_index, parse_level};

fuzz_target!(|line: &str| {
    let cmd = Command::parse(line);
    for token in [cmd.category, cmd.action, cmd.target, cmd.value] {
        assert!(!token.contains(' '));
        assert!(line.contains(token));
    }

    if let Some(i) = parse_index(cmd.target, 4) {
        assert!(i < 4);
    }
    if let Some(angle) = parse_angle(cmd.value) {
        assert!(angle <= 180);
    }
    let _ = parse_level(cmd.value);
});
