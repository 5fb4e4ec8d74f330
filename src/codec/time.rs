//! Timestamp text, driven by the node's `fmt` tag.
//!
//! `fmt` is either one of the well-known layout names below or a strftime
//! pattern used as-is. Without `fmt`, timestamps use RFC 3339.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};

use super::{CodecError, CodecOptions, Element};
use crate::node::Scalar;

/// Layout name used when a node has no `fmt` tag.
pub const DEFAULT_LAYOUT: &str = "RFC3339";

const NAMED_LAYOUTS: &[(&str, &str)] = &[
    ("ANSIC", "%a %b %e %H:%M:%S %Y"),
    ("UnixDate", "%a %b %e %H:%M:%S %Z %Y"),
    ("RubyDate", "%a %b %d %H:%M:%S %z %Y"),
    ("RFC822", "%d %b %y %H:%M %Z"),
    ("RFC822Z", "%d %b %y %H:%M %z"),
    ("RFC850", "%A, %d-%b-%y %H:%M:%S %Z"),
    ("RFC1123", "%a, %d %b %Y %H:%M:%S %Z"),
    ("RFC1123Z", "%a, %d %b %Y %H:%M:%S %z"),
    ("Kitchen", "%-I:%M%p"),
    ("DateTime", "%Y-%m-%d %H:%M:%S"),
    ("DateOnly", "%Y-%m-%d"),
    ("TimeOnly", "%H:%M:%S"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Rfc3339,
    Rfc3339Nano,
    Pattern(String),
}

impl Layout {
    /// Resolve a `fmt` tag value. Unknown names are taken as strftime patterns.
    pub fn resolve(fmt: Option<&str>) -> Self {
        match fmt.map(str::trim) {
            None | Some("") | Some("RFC3339") => Layout::Rfc3339,
            Some("RFC3339Nano") => Layout::Rfc3339Nano,
            Some(name) => {
                let pattern = NAMED_LAYOUTS
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map_or(name, |(_, p)| *p);
                Layout::Pattern(pattern.to_string())
            }
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            Layout::Rfc3339 => "RFC3339",
            Layout::Rfc3339Nano => "RFC3339Nano",
            Layout::Pattern(p) => p,
        }
    }

    pub fn format<Tz: TimeZone>(&self, ts: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Layout::Rfc3339 => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Layout::Rfc3339Nano => ts.to_rfc3339_opts(SecondsFormat::Nanos, true),
            Layout::Pattern(p) => ts.format(p).to_string(),
        }
    }

    /// Parse `raw`. Missing offsets mean UTC; a missing date means 0000-01-01.
    pub fn parse(&self, raw: &str) -> Result<DateTime<FixedOffset>, CodecError> {
        let fail = |reason: String| {
            CodecError::new(raw, "timestamp", reason).with_layout(self.describe())
        };
        let pattern = match self {
            Layout::Rfc3339 | Layout::Rfc3339Nano => {
                return DateTime::parse_from_rfc3339(raw).map_err(|e| fail(e.to_string()));
            }
            Layout::Pattern(p) => p.as_str(),
        };

        let first_error = match DateTime::parse_from_str(raw, pattern) {
            Ok(ts) => return Ok(ts),
            Err(e) => e,
        };
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(naive.and_utc().fixed_offset());
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, pattern) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
        }
        if let Ok(time) = NaiveTime::parse_from_str(raw, pattern) {
            let epoch = NaiveDate::from_ymd_opt(0, 1, 1).unwrap_or(NaiveDate::MIN);
            return Ok(epoch.and_time(time).and_utc().fixed_offset());
        }
        Err(fail(first_error.to_string()))
    }
}

fn layout(opts: &CodecOptions) -> Layout {
    Layout::resolve(opts.layout.as_deref())
}

impl Element for DateTime<Utc> {
    const KIND: Option<Scalar> = Some(Scalar::Timestamp);

    fn encode_element(&self, opts: &CodecOptions) -> String {
        layout(opts).format(self)
    }

    fn decode_element(raw: &str, opts: &CodecOptions) -> Result<Self, CodecError> {
        layout(opts).parse(raw).map(|ts| ts.with_timezone(&Utc))
    }
}

impl Element for DateTime<FixedOffset> {
    const KIND: Option<Scalar> = Some(Scalar::Timestamp);

    fn encode_element(&self, opts: &CodecOptions) -> String {
        layout(opts).format(self)
    }

    fn decode_element(raw: &str, opts: &CodecOptions) -> Result<Self, CodecError> {
        layout(opts).parse(raw)
    }
}

impl Element for NaiveDateTime {
    const KIND: Option<Scalar> = Some(Scalar::Timestamp);

    fn encode_element(&self, opts: &CodecOptions) -> String {
        layout(opts).format(&self.and_utc())
    }

    fn decode_element(raw: &str, opts: &CodecOptions) -> Result<Self, CodecError> {
        layout(opts).parse(raw).map(|ts| ts.naive_utc())
    }
}
