//! Login, logout and session inspection commands

use colored::Colorize;
use log::debug;
use serde::Serialize;

use crate::auth::{SessionManager, TokenInfo};
use crate::cli::team::can_manage_teams;
use crate::cli::{AppContext, OutputFormat};
use crate::error::{AuthError, Result};
use crate::models::UserDisplay;
use crate::output::json::format_json;

/// Header view: who is signed in and what they may do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub logged_in: bool,
    pub user: Option<UserDisplay>,
    pub can_manage_teams: bool,
}

impl StatusView {
    /// Build from the cached session, without network calls
    pub fn from_session(session: &SessionManager) -> Self {
        let user = session.get_user_info_from_token().as_ref().map(|claims| {
            let mut user = UserDisplay::from(claims);
            // The broker's view of the roles wins over the decoded claims
            let roles = session.user_roles();
            if !roles.is_empty() {
                user.roles = roles;
            }
            user
        });

        Self {
            logged_in: session.is_logged_in_sync(),
            can_manage_teams: user.is_some() && can_manage_teams(session),
            user,
        }
    }

    fn render_text(&self) -> String {
        let mut lines = Vec::new();
        match self.user {
            Some(ref user) if self.logged_in => {
                lines.push(format!("{} Logged in as {}", "✓".green(), user.username.bold()));
                lines.push(format!("  Name:   {}", user.name));
                lines.push(format!("  Email:  {}", user.email));
                let roles = if user.roles.is_empty() {
                    "--".to_string()
                } else {
                    user.roles.join(", ")
                };
                lines.push(format!("  Roles:  {}", roles));
                let manage = if self.can_manage_teams {
                    "yes".green()
                } else {
                    "no".dimmed()
                };
                lines.push(format!("  Manage teams: {}", manage));
            }
            None if self.logged_in => {
                lines.push(format!("{} Logged in", "✓".green()));
                lines.push("  (profile details unavailable from the current token)".to_string());
            }
            _ => {
                lines.push(format!("{} Not logged in", "✗".red()));
                lines.push("  → Run 'teamctl login' to sign in".to_string());
            }
        }
        lines.join("\n")
    }
}

/// Run the `login` command
pub async fn login(ctx: &AppContext) -> Result<()> {
    ctx.session.login().await?;

    if !ctx.session.is_logged_in_sync() {
        return Err(AuthError::LoginFailed("no session after login".to_string()).into());
    }

    let profile_name = match ctx.session.load_user_profile().await {
        Ok(profile) => profile.username,
        Err(e) => {
            debug!("Falling back to token claims: {}", e);
            None
        }
    };
    let name = profile_name
        .or_else(|| {
            ctx.session
                .get_user_info_from_token()
                .and_then(|claims| claims.username)
        })
        .unwrap_or_else(|| "unknown user".to_string());
    eprintln!("{} Logged in as {}", "✓".green(), name.bold());
    Ok(())
}

/// Run the `logout` command
pub async fn logout(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_logged_in_sync() {
        eprintln!("Not logged in.");
        return Ok(());
    }

    ctx.session.logout().await?;
    eprintln!("{} Logged out", "✓".green());
    Ok(())
}

/// Run the `status` command
pub async fn status(ctx: &AppContext) -> Result<()> {
    // Revalidate so an expired session is not reported as live
    ctx.session.is_logged_in().await;
    let view = StatusView::from_session(&ctx.session);

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&view)?),
        OutputFormat::Table => println!("{}", view.render_text()),
    }
    Ok(())
}

/// Run the `token` command
pub async fn token(ctx: &AppContext) -> Result<()> {
    let info = ctx
        .session
        .token_info()
        .await
        .ok_or(AuthError::NotLoggedIn)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&info)?),
        OutputFormat::Table => println!("{}", render_token_info(&info)),
    }
    Ok(())
}

fn render_token_info(info: &TokenInfo) -> String {
    let expiry = match (info.expires_at, info.expires_in_seconds) {
        (Some(at), Some(secs)) if info.is_expired => {
            format!("{} ({})", at.to_rfc3339(), format!("expired {}s ago", -secs).red())
        }
        (Some(at), Some(secs)) => format!("{} (in {}s)", at.to_rfc3339(), secs),
        _ => "--".to_string(),
    };

    let mut lines = vec![
        format!("Token length: {}", info.token_length),
        format!("Expires:      {}", expiry),
        format!("Subject:      {}", info.subject.as_deref().unwrap_or("--")),
    ];
    if !info.audience.is_empty() {
        lines.push(format!("Audience:     {}", info.audience.join(", ")));
    }
    if !info.roles.is_empty() {
        let roles: Vec<&str> = info.roles.iter().map(String::as_str).collect();
        lines.push(format!("Roles:        {}", roles.join(", ")));
    }
    lines.join("\n")
}
