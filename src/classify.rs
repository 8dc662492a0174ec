//! Guess whether a run of digits is Unix time, GPS seconds, or GPS week
//! and seconds.
//!
//! Keywords in the surrounding text win over the shape of the token. Failing
//! that, the number of digits picks the encoding whose values have that many
//! digits in the present era. The thresholds are tuned for dates in the
//! 2020s and will need revisiting as the calendar moves on.

use regex::Regex;
use std::sync::OnceLock;

use crate::gps::WeekSeconds;
use crate::token::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    Unix,
    Gps(i64),
    WeekSeconds(WeekSeconds),
}

/// A candidate token with its lowercase context and whatever parses of it
/// the rules need.
pub struct Token<'a> {
    pub digits: &'a str,
    pub context: &'a str,
    value: Option<i64>,
    week_seconds: Option<WeekSeconds>,
}

impl<'a> Token<'a> {
    /// `None` unless `digits` is all ASCII digits.
    pub fn new(digits: &'a str, context: &'a str) -> Option<Token<'a>> {
        if !is_digits(digits) {
            return None;
        }
        Some(Token {
            digits,
            context,
            value: integer(digits).ok(),
            week_seconds: parse_week_seconds(digits).ok(),
        })
    }
}

pub type Rule = fn(&Token<'_>) -> Option<Kind>;

/// Evaluated in order; the first rule that returns a `Kind` decides.
pub const RULES: &[(&str, Rule)] = &[
    ("unix keyword", unix_keyword),
    ("gps week keyword", gps_week_keyword),
    ("gps keyword", gps_keyword),
    ("unix milliseconds", unix_millis),
    ("gps week shape", week_shape),
    ("nine or ten digits", nine_or_ten),
    ("eleven or twelve digits", eleven_or_twelve),
];

// below this a nine or ten digit number is more likely GPS seconds
const UNIX_THRESHOLD: i64 = 1_600_000_000;

struct Patterns {
    unix: Regex,
    gps_week: Regex,
    gps: Regex,
    recent_unix: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        unix: Regex::new(r"unix|posix|epoch").unwrap(),
        gps_week: Regex::new(r"gps\s*(week|wwww|tow|seconds|time)").unwrap(),
        gps: Regex::new(r"gps").unwrap(),
        recent_unix: Regex::new(r"^1[6-9][0-9]{8}$").unwrap(),
    })
}

fn unix_keyword(token: &Token<'_>) -> Option<Kind> {
    patterns().unix.is_match(token.context).then_some(Kind::Unix)
}

fn gps_week_keyword(token: &Token<'_>) -> Option<Kind> {
    let ws = token.week_seconds?;
    patterns().gps_week.is_match(token.context).then_some(Kind::WeekSeconds(ws))
}

fn gps_keyword(token: &Token<'_>) -> Option<Kind> {
    let value = token.value?;
    patterns().gps.is_match(token.context).then_some(Kind::Gps(value))
}

fn unix_millis(token: &Token<'_>) -> Option<Kind> {
    (token.digits.len() == 13).then_some(Kind::Unix)
}

fn week_shape(token: &Token<'_>) -> Option<Kind> {
    let ws = token.week_seconds?;
    let plausible_unix = patterns().recent_unix.is_match(token.digits);
    (!plausible_unix).then_some(Kind::WeekSeconds(ws))
}

fn nine_or_ten(token: &Token<'_>) -> Option<Kind> {
    let value = token.value?;
    match token.digits.len() {
        9 | 10 if value < UNIX_THRESHOLD => Some(Kind::Gps(value)),
        9 | 10 => Some(Kind::Unix),
        _ => None,
    }
}

fn eleven_or_twelve(token: &Token<'_>) -> Option<Kind> {
    let value = token.value?;
    matches!(token.digits.len(), 11 | 12).then_some(Kind::Gps(value))
}

/// The first matching rule and its verdict.
pub fn explain(token: &str, context: &str) -> Option<(&'static str, Kind)> {
    let stripped: String = token.split_whitespace().collect();
    let token = Token::new(&stripped, context)?;
    RULES
        .iter()
        .find_map(|&(name, rule)| rule(&token).map(|kind| (name, kind)))
}

/// `context` is expected to be lowercase already.
pub fn classify(token: &str, context: &str) -> Option<Kind> {
    let found = explain(token, context);
    match found {
        Some((rule, kind)) => tracing::trace!(token, rule, ?kind, "classified"),
        None => tracing::trace!(token, "unclassified"),
    }
    found.map(|(_, kind)| kind)
}
