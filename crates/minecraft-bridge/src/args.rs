//! Validated pieces of console command arguments

use craft_mcp_core::{CraftError, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;

/// Block coordinate: a number, `~`, or `~` followed by a number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate(String);

impl Coordinate {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let number = value.strip_prefix('~').unwrap_or(value);
        let numeric = number.parse::<f64>().is_ok_and(f64::is_finite);
        let valid = if number.len() < value.len() {
            number.is_empty() || numeric
        } else {
            numeric
        };
        if !valid {
            return Err(CraftError::InvalidParams(format!(
                "invalid coordinate format: {}",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(n) => n.to_string(),
        };
        Coordinate::parse(&text).map_err(invalid)
    }
}

// Keep the bare message; the caller adds its own prefix
fn invalid<E: de::Error>(err: CraftError) -> E {
    match err {
        CraftError::InvalidParams(message) => E::custom(message),
        other => E::custom(other),
    }
}

/// `x y z` for three coordinates
pub fn position(x: &Coordinate, y: &Coordinate, z: &Coordinate) -> String {
    format!("{} {} {}", x, y, z)
}

/// Namespaced identifier such as `minecraft:stone` or
/// `minecraft:torch[lit=true]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(CraftError::InvalidParams(
                "block ID cannot be empty".to_string(),
            ));
        }
        single_line("block ID", value)?;
        if !value.contains(':') {
            return Err(CraftError::InvalidParams(format!(
                "invalid block ID format: {} (expected namespace:id, e.g., minecraft:stone)",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ResourceId::parse(&text).map_err(invalid)
    }
}

/// Reject control characters, which would split or corrupt a console line
pub fn single_line(name: &str, value: &str) -> Result<()> {
    if value.chars().any(char::is_control) {
        return Err(CraftError::InvalidParams(format!(
            "parameter {} cannot contain line breaks or control characters",
            name
        )));
    }
    Ok(())
}

/// Reject an empty required string
pub fn required<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(CraftError::InvalidParams(format!(
            "required parameter {} cannot be empty",
            name
        )));
    }
    single_line(name, value)?;
    Ok(value)
}

/// Optional string, treating empty as absent
pub fn optional<'a>(name: &str, value: &'a Option<String>) -> Result<Option<&'a str>> {
    let value = value.as_deref().filter(|v| !v.is_empty());
    if let Some(value) = value {
        single_line(name, value)?;
    }
    Ok(value)
}

/// Whole number no smaller than 1
pub fn positive_int(name: &str, value: f64) -> Result<u64> {
    int_in_range(name, value, 1, u32::MAX as u64).map_err(|_| {
        CraftError::InvalidParams(format!(
            "invalid {}: {} (must be a positive integer)",
            name, value
        ))
    })
}

/// Whole number within `min..=max`
pub fn int_in_range(name: &str, value: f64, min: u64, max: u64) -> Result<u64> {
    if value.fract() != 0.0 || value < min as f64 || value > max as f64 {
        return Err(CraftError::InvalidParams(format!(
            "invalid {}: {} (must be an integer between {} and {})",
            name, value, min, max
        )));
    }
    Ok(value as u64)
}
