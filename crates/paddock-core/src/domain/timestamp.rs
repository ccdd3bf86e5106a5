use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// RFC3339 timestamp guaranteed to be UTC.
///
/// Serializes as an ISO-8601 string so exported bundles never leak a
/// library-specific duration or datetime representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        // Offsets such as +02:00 are normalized; only the instant matters.
        Ok(Self(parsed.to_offset(UtcOffset::UTC)))
    }

    /// Parses timestamps that omit the offset (`2025-04-06T05:03:00`) as UTC,
    /// which is how both archives publish race-control and schedule times.
    pub fn parse_assume_utc(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if let Ok(parsed) = Self::parse(trimmed) {
            return Ok(parsed);
        }
        Self::parse(&format!("{trimmed}Z")).map_err(|_| ValidationError::TimestampNotUtc {
            value: input.to_owned(),
        })
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_timestamp() {
        let parsed = UtcDateTime::parse("2025-04-06T05:00:00Z").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2025-04-06T05:00:00Z");
    }

    #[test]
    fn normalizes_explicit_offsets() {
        let parsed = UtcDateTime::parse("2025-04-06T05:03:00.123000+00:00").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2025-04-06T05:03:00.123Z");

        let shifted = UtcDateTime::parse("2025-04-06T07:00:00+02:00").expect("must parse");
        assert_eq!(shifted.format_rfc3339(), "2025-04-06T05:00:00Z");
    }

    #[test]
    fn assumes_utc_when_offset_is_missing() {
        let parsed = UtcDateTime::parse_assume_utc("2025-04-06T05:03:00").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2025-04-06T05:03:00Z");
    }

    #[test]
    fn rejects_garbage() {
        let err = UtcDateTime::parse_assume_utc("lap 12").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotUtc { .. }));
    }
}
