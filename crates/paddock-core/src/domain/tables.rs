//! Row types for the tabular parts of a session.
//!
//! Durations are plain `f64` seconds and instants are [`UtcDateTime`] so the
//! serialized form is numeric seconds or ISO-8601 strings, nothing else.

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// One classified entrant of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub position: Option<u32>,
    pub abbreviation: String,
    pub driver_number: Option<u32>,
    pub full_name: String,
    pub team_name: String,
    pub grid: Option<u32>,
    pub laps_completed: Option<u32>,
    pub status: String,
    pub points: f64,
    pub race_time_s: Option<f64>,
    pub q1_s: Option<f64>,
    pub q2_s: Option<f64>,
    pub q3_s: Option<f64>,
}

/// One timed lap of one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRow {
    pub driver: String,
    pub lap_number: u32,
    pub lap_time_s: Option<f64>,
    pub position: Option<u32>,
    pub compound: Option<String>,
    pub tyre_life: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Offset from the start of the session feed.
    pub session_time_s: Option<f64>,
    pub timestamp: Option<UtcDateTime>,
    pub air_temp_c: Option<f64>,
    pub track_temp_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub pressure_mbar: Option<f64>,
    pub rainfall: bool,
    pub wind_speed_ms: Option<f64>,
    pub wind_direction_deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSample {
    pub timestamp: Option<UtcDateTime>,
    pub session_time_s: Option<f64>,
    pub speed_kph: Option<f64>,
    pub rpm: Option<f64>,
    pub gear: Option<u8>,
    pub throttle_pct: Option<f64>,
    pub brake: Option<f64>,
    pub drs: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStatusEntry {
    pub session_time_s: f64,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceControlMessage {
    pub timestamp: Option<UtcDateTime>,
    pub session_time_s: Option<f64>,
    pub category: String,
    pub flag: Option<String>,
    pub scope: Option<String>,
    pub lap: Option<u32>,
    pub driver_number: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitStop {
    pub timestamp: Option<UtcDateTime>,
    pub driver_number: u32,
    pub abbreviation: Option<String>,
    pub lap_number: Option<u32>,
    pub pit_duration_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub timestamp: Option<UtcDateTime>,
    pub driver_number: u32,
    pub abbreviation: Option<String>,
    pub position: u32,
}

/// Parses `SS.fff`, `M:SS.fff` or `H:MM:SS.fff` clock strings into seconds.
pub fn parse_clock_seconds(value: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidLapTime {
        value: value.to_owned(),
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut total = 0.0;
    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    for (index, part) in parts.iter().enumerate() {
        let is_last = index + 1 == parts.len();
        let component = if is_last {
            part.parse::<f64>().map_err(|_| invalid())?
        } else {
            f64::from(part.parse::<u32>().map_err(|_| invalid())?)
        };
        if !component.is_finite() || component < 0.0 {
            return Err(invalid());
        }
        total = total * 60.0 + component;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lap_and_feed_clock_formats() {
        assert_eq!(parse_clock_seconds("1:31.250"), Ok(91.25));
        assert_eq!(parse_clock_seconds("31.5"), Ok(31.5));
        assert_eq!(parse_clock_seconds("01:02:03.5"), Ok(3723.5));
    }

    #[test]
    fn rejects_malformed_clock_strings() {
        for value in ["", "abc", "1:2:3:4", "-5.0", "1:-2.0"] {
            assert!(
                parse_clock_seconds(value).is_err(),
                "'{value}' should be rejected"
            );
        }
    }

    #[test]
    fn lap_rows_serialize_durations_as_plain_seconds() {
        let lap = LapRow {
            driver: String::from("VER"),
            lap_number: 12,
            lap_time_s: Some(93.417),
            position: Some(1),
            compound: None,
            tyre_life: None,
        };

        let json = serde_json::to_string(&lap).expect("serializes");
        assert!(json.contains("\"lap_time_s\":93.417"), "{json}");
        assert!(!json.contains("days"), "{json}");
    }
}
