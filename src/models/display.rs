//! Display models for table and JSON output
//!
//! Display models turn API and session types into CLI-friendly rows with
//! column names and serialization.

use chrono::Local;
use serde::Serialize;
use tabled::Tabled;

use crate::auth::UserClaims;
use crate::client::Team;

/// Placeholder for missing values in tables
const NONE: &str = "--";

/// Format a team's creation time in local time, e.g. `Mar 1, 2024, 09:15 AM`.
///
/// Timestamps that cannot be parsed are shown as received.
pub fn format_created_at(team: &Team) -> String {
    match team.created_at_utc() {
        Some(dt) => dt
            .with_timezone(&Local)
            .format("%b %-d, %Y, %I:%M %p")
            .to_string(),
        None => team.created_at.clone(),
    }
}

/// Team row for table/JSON output
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct TeamDisplay {
    #[tabled(rename = "TEAM ID")]
    pub id: String,

    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "CREATED")]
    pub created: String,
}

impl From<&Team> for TeamDisplay {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
            created: format_created_at(team),
        }
    }
}

/// Signed-in user summary shown by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDisplay {
    pub username: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<&UserClaims> for UserDisplay {
    fn from(claims: &UserClaims) -> Self {
        // Prefer the display name, otherwise combine first/last
        let name = claims.name.clone().unwrap_or_else(|| {
            match (&claims.first_name, &claims.last_name) {
                (Some(first), Some(last)) => format!("{} {}", first, last),
                (Some(first), None) => first.clone(),
                (None, Some(last)) => last.clone(),
                (None, None) => NONE.to_string(),
            }
        });

        Self {
            username: claims.username.clone().unwrap_or_else(|| NONE.to_string()),
            name,
            email: claims.email.clone().unwrap_or_else(|| NONE.to_string()),
            roles: claims.roles.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(created_at: &str) -> Team {
        Team {
            id: "42".to_string(),
            name: "Blue Team".to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_team_display_from_team() {
        let display = TeamDisplay::from(&team("2024-03-01T09:15:00Z"));
        assert_eq!(display.id, "42");
        assert_eq!(display.name, "Blue Team");
        assert!(display.created.contains("2024"));
    }

    #[test]
    fn test_unparseable_created_at_shown_raw() {
        assert_eq!(format_created_at(&team("sometime")), "sometime");
    }

    #[test]
    fn test_user_display_combines_names() {
        let claims = UserClaims {
            username: Some("jdoe".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            roles: ["admin".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let display = UserDisplay::from(&claims);
        assert_eq!(display.username, "jdoe");
        assert_eq!(display.name, "Jane Doe");
        assert_eq!(display.email, "--");
        assert_eq!(display.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_user_display_prefers_full_name() {
        let claims = UserClaims {
            name: Some("Dr. Jane Doe".to_string()),
            first_name: Some("Jane".to_string()),
            ..Default::default()
        };
        assert_eq!(UserDisplay::from(&claims).name, "Dr. Jane Doe");
    }
}
