//! Mock Teams API client for testing
//!
//! Provides an in-memory implementation of [`TeamsApi`] so view logic can
//! be tested without an HTTP server.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::api::TeamsApi;
use super::models::{Team, TeamCreate};
use crate::error::ApiError;

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockTeamsApi::new().with_teams(vec![team("1", "Blue")]);
/// let teams = mock.list_teams().await?;
/// assert_eq!(teams.len(), 1);
/// ```
#[derive(Default)]
pub struct MockTeamsApi {
    /// Server-side team collection
    teams: Arc<Mutex<Vec<Team>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Create requests received, in order
    created: Arc<Mutex<Vec<TeamCreate>>>,
}

/// Call counts per operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_teams: usize,
    pub create_team: usize,
    pub delete_team: usize,
}

/// Build a team with a fixed timestamp
pub fn team(id: &str, name: &str) -> Team {
    Team {
        id: id.to_string(),
        name: name.to_string(),
        created_at: "2024-03-01T09:15:00Z".to_string(),
    }
}

impl MockTeamsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_teams(self, teams: Vec<Team>) -> Self {
        self.teams.try_lock().expect("unshared mock").extend(teams);
        self
    }

    /// Fail the next call with `error`
    pub fn with_error(self, error: ApiError) -> Self {
        *self.error.try_lock().expect("unshared mock") = Some(error);
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    pub async fn created_requests(&self) -> Vec<TeamCreate> {
        self.created.lock().await.clone()
    }

    pub async fn team_ids(&self) -> Vec<String> {
        self.teams.lock().await.iter().map(|t| t.id.clone()).collect()
    }

    async fn take_error(&self) -> Result<(), ApiError> {
        match self.error.lock().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TeamsApi for MockTeamsApi {
    async fn list_teams(&self) -> Result<Vec<Team>, ApiError> {
        self.call_count.lock().await.list_teams += 1;
        self.take_error().await?;
        Ok(self.teams.lock().await.clone())
    }

    async fn create_team(&self, request: &TeamCreate) -> Result<Team, ApiError> {
        self.call_count.lock().await.create_team += 1;
        self.created.lock().await.push(request.clone());
        self.take_error().await?;

        let mut teams = self.teams.lock().await;
        let created = team(&(teams.len() + 1).to_string(), &request.name);
        teams.push(created.clone());
        Ok(created)
    }

    async fn delete_team(&self, team_id: &str) -> Result<(), ApiError> {
        self.call_count.lock().await.delete_team += 1;
        self.take_error().await?;

        let mut teams = self.teams.lock().await;
        let before = teams.len();
        teams.retain(|t| t.id != team_id);
        if teams.len() == before {
            return Err(ApiError::Status {
                status: 404,
                message: format!("Team {} not found", team_id),
            });
        }
        Ok(())
    }
}
