pub mod continents;
pub mod countries;
pub mod us_states;

pub use continents::{continent, continent_contains, Continent, CONTINENTS};
pub use countries::country_name;
pub use us_states::us_state_name;

use serde::{Deserialize, Serialize};

/// The granularity of a location matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Continent,
    Country,
    UsState,
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationType::Continent => write!(f, "continent"),
            LocationType::Country => write!(f, "country"),
            LocationType::UsState => write!(f, "us_state"),
        }
    }
}

impl std::str::FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continent" => Ok(LocationType::Continent),
            "country" => Ok(LocationType::Country),
            "us_state" | "state" => Ok(LocationType::UsState),
            _ => Err(format!("unknown location type: {s}")),
        }
    }
}

/// A single geographic matcher inside a location group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub code: String,
}

impl Location {
    pub fn new(kind: LocationType, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }

    pub fn continent(code: impl Into<String>) -> Self {
        Self::new(LocationType::Continent, code)
    }

    pub fn country(code: impl Into<String>) -> Self {
        Self::new(LocationType::Country, code)
    }

    pub fn us_state(code: impl Into<String>) -> Self {
        Self::new(LocationType::UsState, code)
    }

    /// Human-readable name from the taxonomy, if the code is known.
    pub fn display_name(&self) -> Option<&'static str> {
        match self.kind {
            LocationType::Continent => continent(&self.code).map(|c| c.name),
            LocationType::Country => country_name(&self.code),
            LocationType::UsState => us_state_name(&self.code),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.display_name() {
            Some(name) => write!(f, "{}:{} ({})", self.kind, self.code, name),
            None => write!(f, "{}:{}", self.kind, self.code),
        }
    }
}
