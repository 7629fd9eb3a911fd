//! RFC 3339 serde for report timestamps.
//!
//! RFC 3339 offsets carry minutes only, so a value whose offset has a seconds
//! component is written as the same instant in UTC. Years must stay within
//! 0..=9999; anything else fails to encode.

use serde::{Deserializer, Serializer};
use time::{OffsetDateTime, UtcOffset};

fn encodable(at: OffsetDateTime) -> OffsetDateTime {
    if at.offset().seconds_past_minute() != 0 {
        at.to_offset(UtcOffset::UTC)
    } else {
        at
    }
}

pub fn serialize<S: Serializer>(at: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    time::serde::rfc3339::serialize(&encodable(*at), serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
    time::serde::rfc3339::deserialize(deserializer)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(at: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::option::serialize(&at.map(encodable), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error> {
        time::serde::rfc3339::option::deserialize(deserializer)
    }
}
