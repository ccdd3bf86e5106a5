use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MIN_YEAR: u16 = 1950;
const MAX_YEAR: u16 = 2100;

/// Session within a race weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "FP1")]
    Practice1,
    #[serde(rename = "FP2")]
    Practice2,
    #[serde(rename = "FP3")]
    Practice3,
    #[serde(rename = "SQ")]
    SprintQualifying,
    #[serde(rename = "S")]
    Sprint,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "R")]
    Race,
}

impl SessionType {
    /// Short code used in cache file names and on the command line.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Practice1 => "FP1",
            Self::Practice2 => "FP2",
            Self::Practice3 => "FP3",
            Self::SprintQualifying => "SQ",
            Self::Sprint => "S",
            Self::Qualifying => "Q",
            Self::Race => "R",
        }
    }

    /// Session name as published by the live API and the timing archive.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Practice1 => "Practice 1",
            Self::Practice2 => "Practice 2",
            Self::Practice3 => "Practice 3",
            Self::SprintQualifying => "Sprint Qualifying",
            Self::Sprint => "Sprint",
            Self::Qualifying => "Qualifying",
            Self::Race => "Race",
        }
    }
}

impl Display for SessionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FP1" | "P1" => Ok(Self::Practice1),
            "FP2" | "P2" => Ok(Self::Practice2),
            "FP3" | "P3" => Ok(Self::Practice3),
            "SQ" => Ok(Self::SprintQualifying),
            "S" => Ok(Self::Sprint),
            "Q" => Ok(Self::Qualifying),
            "R" => Ok(Self::Race),
            _ => Err(ValidationError::InvalidSessionType {
                value: value.to_owned(),
            }),
        }
    }
}

/// Identity of one race-weekend session; addresses exactly one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    year: u16,
    event_name: String,
    session_type: SessionType,
}

impl SessionKey {
    pub fn new(
        year: u16,
        event_name: impl Into<String>,
        session_type: SessionType,
    ) -> Result<Self, ValidationError> {
        let event_name = event_name.into().trim().to_owned();
        if event_name.is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError::YearOutOfRange {
                year,
                min: MIN_YEAR,
                max: MAX_YEAR,
            });
        }

        Ok(Self {
            year,
            event_name,
            session_type,
        })
    }

    pub const fn year(&self) -> u16 {
        self.year
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub const fn session_type(&self) -> SessionType {
        self.session_type
    }
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.year, self.event_name, self.session_type)
    }
}
