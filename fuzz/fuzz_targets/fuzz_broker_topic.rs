//! Fuzz target: inbound broker topic routing
//!
//! Any topic either matches nothing or maps to a command whose last two
//! path segments are exactly `<name>/set`, with an echo topic.
//!
//! cargo fuzz run fuzz_broker_topic

#![no_main]

use libfuzzer_sys::fuzz_target;
use orion::cloud::topics::{self, CommandTopic};

fuzz_target!(|topic: &str| {
    let tail: Vec<&str> = topic.rsplit('/').take(2).collect();
    match topics::match_command(topic) {
        Some(CommandTopic::Relay(n)) => {
            assert!((1..=topics::RELAY_SET.len()).contains(&n));
            let relay = topics::RELAY_SET[n - 1].split('/').nth(1).unwrap_or_default();
            assert_eq!(tail, ["set", relay]);
        }
        Some(CommandTopic::Lock) => assert_eq!(tail, ["set", "lock"]),
        None => {}
    }
    if let Some(cmd) = topics::match_command(topic) {
        assert!(cmd.state_topic().ends_with("/state"));
    }
});
