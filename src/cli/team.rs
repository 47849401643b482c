//! Team management commands

use colored::Colorize;
use dialoguer::Confirm;
use log::debug;

use crate::auth::SessionManager;
use crate::cli::{AppContext, OutputFormat};
use crate::client::{Team, TeamCreate, TeamsApi};
use crate::error::{ApiError, AuthError, Result};
use crate::models::TeamDisplay;
use crate::output::Formattable;
use crate::output::json::format_json;

/// Realm roles allowed to create and delete teams
pub const MANAGER_ROLES: [&str; 2] = ["team-leader", "admin"];

/// Whether the signed-in user holds one of the manager roles
pub fn can_manage_teams(session: &SessionManager) -> bool {
    MANAGER_ROLES.iter().any(|role| session.has_role(role))
}

/// Refuse mutating commands the server would reject anyway
fn require_manager(session: &SessionManager) -> Result<()> {
    if !session.is_logged_in_sync() {
        return Err(AuthError::NotLoggedIn.into());
    }
    if !can_manage_teams(session) {
        return Err(ApiError::Forbidden.into());
    }
    Ok(())
}

/// Result of loading the team list: the teams, or the error shown in their place
#[derive(Debug, Default)]
pub struct TeamListView {
    pub teams: Vec<Team>,
    pub error: Option<ApiError>,
}

impl TeamListView {
    /// Fetch the list. A failed load keeps an empty list and the error.
    pub async fn load(api: &dyn TeamsApi) -> Self {
        match api.list_teams().await {
            Ok(teams) => {
                debug!("Loaded {} teams", teams.len());
                Self { teams, error: None }
            }
            Err(e) => Self {
                teams: Vec::new(),
                error: Some(e),
            },
        }
    }

    /// Render the list, or fail with the load error
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        if let Some(ref err) = self.error {
            return Err(err.clone().into());
        }
        let rows: Vec<TeamDisplay> = self.teams.iter().map(TeamDisplay::from).collect();
        rows.format(format)
    }
}

/// Create a team, then reload the list once.
///
/// Validation failures never reach the API.
pub async fn create_and_reload(api: &dyn TeamsApi, raw_name: &str) -> Result<(Team, TeamListView)> {
    let request = TeamCreate::new(raw_name)?;
    let team = api.create_team(&request).await?;
    let list = TeamListView::load(api).await;
    Ok((team, list))
}

/// Delete a team, then reload the list. A failed delete leaves the list alone.
pub async fn delete_and_reload(api: &dyn TeamsApi, team_id: &str) -> Result<TeamListView> {
    api.delete_team(team_id).await?;
    Ok(TeamListView::load(api).await)
}

/// Run the `team list` command
pub async fn list(ctx: &AppContext) -> Result<()> {
    let view = TeamListView::load(&ctx.teams).await;
    println!("{}", view.render(ctx.format)?);
    Ok(())
}

/// Run the `team create` command
pub async fn create(ctx: &AppContext, name: &str) -> Result<()> {
    // Validate before the role check so bad input is reported first
    TeamCreate::new(name)?;
    require_manager(&ctx.session)?;

    let (team, view) = create_and_reload(&ctx.teams, name).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&team)?),
        OutputFormat::Table => {
            eprintln!(
                "{} Team \"{}\" created (ID: {})",
                "✓".green(),
                team.name,
                team.id
            );
            println!("{}", view.render(ctx.format)?);
        }
    }
    Ok(())
}

/// Run the `team delete` command
pub async fn delete(ctx: &AppContext, team_id: &str, yes: bool) -> Result<()> {
    require_manager(&ctx.session)?;

    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!("Delete team {}? This cannot be undone.", team_id))
            .default(false)
            .interact()?;

        if !confirm {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let view = delete_and_reload(&ctx.teams, team_id).await?;

    match ctx.format {
        OutputFormat::Json => {
            println!("{}", format_json(&serde_json::json!({ "deleted": team_id }))?);
        }
        OutputFormat::Table => {
            eprintln!("{} Team {} deleted", "✓".green(), team_id);
            println!("{}", view.render(ctx.format)?);
        }
    }
    Ok(())
}
