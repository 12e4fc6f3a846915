//! Console line tokeniser.
//!
//! A line is split on single spaces into at most four positional tokens:
//! `category action target value`. Missing tokens are empty and anything
//! past the fourth is ignored. Matching is case sensitive.

/// One tokenised console line. Borrows from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Command<'a> {
    pub category: &'a str,
    pub action: &'a str,
    pub target: &'a str,
    pub value: &'a str,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = line.trim().split(' ');
        let mut next = || tokens.next().unwrap_or("");
        Self {
            category: next(),
            action: next(),
            target: next(),
            value: next(),
        }
    }
}

/// `on` / `off` only. Anything else is not a level.
pub fn parse_level(token: &str) -> Option<bool> {
    match token {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// One-based index in `1..=count`, returned zero based.
pub fn parse_index(token: &str, count: usize) -> Option<usize> {
    token
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}

/// Integer angle clamped into `0..=180`.
pub fn parse_angle(token: &str) -> Option<u8> {
    token.parse::<i64>().ok().map(|a| a.clamp(0, 180) as u8)
}
