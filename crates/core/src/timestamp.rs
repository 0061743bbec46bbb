//! ISO-8601 timestamp encoding for persisted records.
//!
//! Timestamps are written as RFC 3339 in UTC. On read, offset-less values
//! (as produced by older trackers that stored local wall-clock time) are
//! accepted and interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Formats a timestamp the way it is persisted.
#[must_use]
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC 3339 timestamp, falling back to a naive ISO-8601 one.
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Same encoding applied to the values of an insertion-ordered map.
pub mod map {
    use std::hash::Hash;

    use chrono::{DateTime, Utc};
    use indexmap::IndexMap;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, S>(
        values: &IndexMap<K, DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(values.len()))?;
        for (key, value) in values {
            map.serialize_entry(key, &super::format(value))?;
        }
        map.end()
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<IndexMap<K, DateTime<Utc>>, D::Error>
    where
        K: Deserialize<'de> + Eq + Hash,
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<K, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                super::parse(&value)
                    .map(|parsed| (key, parsed))
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid timestamp: {value}"))
                    })
            })
            .collect()
    }
}
