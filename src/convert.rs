//! Turn input text into conversion records.
//!
//! A single input is either parsed as the encoding the caller asked for or
//! classified automatically. A paragraph is scanned for runs of digits and
//! each one is classified with the text around it as context.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::classify::{classify, Kind};
use crate::date::iso8601;
use crate::gps::WeekSeconds;
use crate::leapsecs::*;
use crate::token::*;

pub const INVALID_REASON: &str = "Unable to convert this value to a valid UTC date.";

// the last instant a UTC date can represent, 8.64e15 ms
const MAX_UNIX: i64 = 8_640_000_000_000;

// characters of context taken each side of a token in a paragraph
const CONTEXT_CHARS: usize = 25;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    Auto,
    Unix,
    Gps,
    WeekSeconds,
    Paragraph,
}

impl std::str::FromStr for Mode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Mode> {
        match s {
            "auto" => Ok(Mode::Auto),
            "unix" => Ok(Mode::Unix),
            "gps" => Ok(Mode::Gps),
            "gps-week-seconds" => Ok(Mode::WeekSeconds),
            "paragraph" => Ok(Mode::Paragraph),
            _ => Err(Error::Mode(s.to_owned())),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Encoding {
    Unix,
    Gps,
    WeekSeconds,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Provenance {
    Explicit,
    Auto,
    Paragraph,
}

fn label(provenance: Provenance, encoding: Encoding) -> String {
    let name = match encoding {
        Encoding::Unix => "Unix/POSIX",
        Encoding::Gps => "GPS seconds",
        Encoding::WeekSeconds => "GPS WWWWSSSSSS",
    };
    match provenance {
        Provenance::Explicit => name.to_owned(),
        Provenance::Auto => format!("Auto detected {}", name),
        Provenance::Paragraph => format!("Detected {} in paragraph", name),
    }
}

/// One value found in the input, in every representation we know.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Conversion {
    pub source: String,
    pub detected_as: String,
    pub unix_seconds: i64,
    pub unix_millis: i64,
    pub gps_seconds: i64,
    pub gps_week_seconds: String,
    pub human_utc: String,
}

/// A value that parsed but does not land on a representable UTC date.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invalid {
    pub source: String,
    pub detected_as: String,
    pub reason: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    Converted(Conversion),
    Invalid(Invalid),
}

impl Record {
    pub fn source(&self) -> &str {
        match self {
            Record::Converted(c) => &c.source,
            Record::Invalid(i) => &i.source,
        }
    }

    pub fn detected_as(&self) -> &str {
        match self {
            Record::Converted(c) => &c.detected_as,
            Record::Invalid(i) => &i.detected_as,
        }
    }

    pub fn unix_seconds(&self) -> Option<i64> {
        match self {
            Record::Converted(c) => Some(c.unix_seconds),
            Record::Invalid(_) => None,
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::Converted(c) => write!(f, "{} ({})", c.source, c.detected_as),
            Record::Invalid(i) => write!(f, "{} - {}", i.source, i.reason),
        }
    }
}

fn record(leaps: &LeapSecs, source: &str, detected_as: String, unix: Option<i64>) -> Record {
    let gps = unix
        .filter(|unix| (0..=MAX_UNIX).contains(unix))
        .and_then(|unix| Some((unix, leaps.unix_to_gps(unix)?)));
    match gps {
        Some((unix, gps)) => Record::Converted(Conversion {
            source: source.to_owned(),
            detected_as,
            unix_seconds: unix,
            unix_millis: unix * 1000,
            gps_seconds: gps,
            gps_week_seconds: WeekSeconds::from_gps(gps).to_string(),
            human_utc: iso8601(unix),
        }),
        None => {
            tracing::debug!(source, ?unix, "no valid UTC date");
            Record::Invalid(Invalid {
                source: source.to_owned(),
                detected_as,
                reason: INVALID_REASON.to_owned(),
            })
        }
    }
}

fn week_to_unix(leaps: &LeapSecs, ws: WeekSeconds) -> Option<i64> {
    leaps.gps_to_unix(ws.gps()?)
}

// a classified token; a Unix token can still fail to parse
fn convert_kind(
    leaps: &LeapSecs,
    source: &str,
    digits: &str,
    kind: Kind,
    provenance: Provenance,
) -> Option<Record> {
    Some(match kind {
        Kind::Unix => {
            let unix = parse_unix(digits).ok()?;
            record(leaps, source, label(provenance, Encoding::Unix), Some(unix))
        }
        Kind::Gps(gps) => {
            let unix = leaps.gps_to_unix(gps);
            record(leaps, source, label(provenance, Encoding::Gps), unix)
        }
        Kind::WeekSeconds(ws) => {
            let unix = week_to_unix(leaps, ws);
            record(leaps, source, label(provenance, Encoding::WeekSeconds), unix)
        }
    })
}

fn digit_runs() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"(?-u:\b)[0-9]{4,13}(?-u:\b)").unwrap())
}

/// Up to `CONTEXT_CHARS` characters either side of `start..end`, lowercased.
fn context(text: &str, start: usize, end: usize) -> String {
    let lo = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(text.len(), |(i, _)| end + i);
    text[lo..hi].to_lowercase()
}

/// Convert one input, either as the given encoding or, in `Mode::Auto`,
/// as whatever the classifier decides. Malformed input gives no records.
pub fn convert_single(leaps: &LeapSecs, input: &str, mode: Mode) -> Vec<Record> {
    let cleaned = input.trim();
    let explicit = |encoding, unix| {
        vec![record(leaps, cleaned, label(Provenance::Explicit, encoding), unix)]
    };
    match mode {
        Mode::Unix => match parse_unix(cleaned) {
            Ok(unix) => explicit(Encoding::Unix, Some(unix)),
            Err(_) => vec![],
        },
        Mode::Gps => match parse_gps(cleaned) {
            Ok(gps) => explicit(Encoding::Gps, leaps.gps_to_unix(gps)),
            Err(_) => vec![],
        },
        Mode::WeekSeconds => match parse_week_seconds(cleaned) {
            Ok(ws) => explicit(Encoding::WeekSeconds, week_to_unix(leaps, ws)),
            Err(_) => vec![],
        },
        Mode::Auto => convert_auto(leaps, cleaned).into_iter().collect(),
        Mode::Paragraph => convert_paragraph(leaps, cleaned),
    }
}

// Shortest run the length rules accept.
const MIN_TOKEN_DIGITS: usize = 9;

// The whole input is the context. If it is not just digits (perhaps with
// spaces) the token is the first run of digits long enough to be a time,
// so a year or room number ahead of it is skipped.
fn convert_auto(leaps: &LeapSecs, cleaned: &str) -> Option<Record> {
    let stripped: String = cleaned.split_whitespace().collect();
    let (source, digits) = if is_digits(&stripped) {
        (cleaned, stripped.as_str())
    } else {
        let found = digit_runs()
            .find_iter(cleaned)
            .map(|found| found.as_str())
            .find(|run| run.len() >= MIN_TOKEN_DIGITS)?;
        (found, found)
    };
    let kind = classify(digits, &cleaned.to_lowercase())?;
    convert_kind(leaps, source, digits, kind, Provenance::Auto)
}

/// Find and convert every timestamp-like run of digits in `paragraph`.
pub fn convert_paragraph(leaps: &LeapSecs, paragraph: &str) -> Vec<Record> {
    let mut records = Vec::new();
    for found in digit_runs().find_iter(paragraph) {
        let token = found.as_str();
        let context = context(paragraph, found.start(), found.end());
        let Some(kind) = classify(token, &context) else {
            continue;
        };
        if let Some(record) = convert_kind(leaps, token, token, kind, Provenance::Paragraph) {
            records.push(record);
        }
    }
    dedup(records)
}

/// Drop records whose source and Unix time repeat an earlier record.
pub fn dedup(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.source().to_owned(), record.unix_seconds())))
        .collect()
}

pub fn convert(leaps: &LeapSecs, input: &str, mode: Mode) -> Vec<Record> {
    let records = convert_single(leaps, input, mode);
    tracing::debug!(?mode, records = records.len(), "converted");
    records
}
