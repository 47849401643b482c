//! Team API trait for list/create/delete
//!
//! Errors are already normalized: the `Display` text of [`ApiError`] is the
//! message to show the user.

use async_trait::async_trait;

use crate::client::models::{Team, TeamCreate};
use crate::error::ApiError;

/// Team management operations for the Teams API
#[async_trait]
pub trait TeamsApi: Send + Sync {
    /// List all teams in server order.
    async fn list_teams(&self) -> Result<Vec<Team>, ApiError>;

    /// Create a team. The name must already be validated and trimmed.
    async fn create_team(&self, request: &TeamCreate) -> Result<Team, ApiError>;

    /// Delete a team by ID.
    async fn delete_team(&self, team_id: &str) -> Result<(), ApiError>;
}
