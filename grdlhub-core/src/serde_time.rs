//! `HH:MM` (de)serialization for optional times.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%H:%M";

pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), FORMAT).ok()
}

pub fn format_hhmm(time: &NaiveTime) -> String {
    time.format(FORMAT).to_string()
}

pub mod option_hhmm {
    use super::*;

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&format_hhmm(t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_hhmm(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{s}', expected HH:MM"))),
        }
    }
}
