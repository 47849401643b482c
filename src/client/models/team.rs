//! Team models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum team name length, counted after trimming
pub const MIN_TEAM_NAME_LEN: usize = 2;

/// Team resource as returned by the Teams API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Server-assigned team ID
    pub id: String,

    /// Team name
    pub name: String,

    /// Creation timestamp as sent by the server (ISO 8601, with or without offset)
    pub created_at: String,
}

impl Team {
    /// Parse `created_at`; timestamps without an offset are taken as UTC.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Request body for creating a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamCreate {
    pub name: String,
}

impl TeamCreate {
    /// Build a request from user input, trimming surrounding whitespace.
    pub fn new(raw_name: &str) -> Result<Self> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Team name is required".to_string()));
        }
        if name.chars().count() < MIN_TEAM_NAME_LEN {
            return Err(Error::Validation(format!(
                "Team name must be at least {} characters",
                MIN_TEAM_NAME_LEN
            )));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn team(created_at: &str) -> Team {
        Team {
            id: "1".to_string(),
            name: "Blue".to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_team_create_trims_name() {
        let request = TeamCreate::new("  Blue Team  ").unwrap();
        assert_eq!(request.name, "Blue Team");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "name": "Blue Team" })
        );
    }

    #[test]
    fn test_team_create_rejects_blank_and_short_names() {
        assert!(TeamCreate::new("").is_err());
        assert!(TeamCreate::new("    ").is_err());
        assert!(TeamCreate::new(" x ").is_err());
        assert!(TeamCreate::new("xy").is_ok());
    }

    #[test]
    fn test_team_deserializes_from_api_json() {
        let json = r#"{"id":"42","name":"Red Team","created_at":"2024-05-01T10:30:00Z"}"#;
        let team: Team = serde_json::from_str(json).unwrap();
        assert_eq!(team.id, "42");
        assert_eq!(team.name, "Red Team");
    }

    #[test]
    fn test_created_at_with_offset() {
        let dt = team("2024-05-01T10:30:00+02:00").created_at_utc().unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_created_at_without_offset_is_utc() {
        let dt = team("2024-05-01T10:30:00.123456").created_at_utc().unwrap();
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_created_at_unparseable() {
        assert!(team("yesterday").created_at_utc().is_none());
    }
}
