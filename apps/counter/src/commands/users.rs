//! # User Commands
//!
//! Account management from the settings screen. Passwords are sent to the
//! backend but never printed.

use pharma_core::session::ensure_can_delete_user;
use pharma_core::validation::{validate_password, validate_username};
use pharma_core::{Screen, User};
use pharma_api::ClientError;
use tracing::{info, warn};

use crate::cli::UsersCommand;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::state::AppContext;

fn find(users: &[User], id: i64) -> CommandResult<&User> {
    users
        .iter()
        .find(|u| u.id == id)
        .ok_or_else(|| CommandError::not_found("User", &id.to_string()))
}

pub async fn list(ctx: &AppContext) -> CommandResult<Vec<User>> {
    ctx.session.require(Screen::Settings).await?;
    Ok(ctx.backend.users().await?)
}

/// Creates a non-admin account.
pub async fn add(ctx: &AppContext, username: &str, password: &str) -> CommandResult<User> {
    ctx.session.require(Screen::Settings).await?;

    let username = username.trim();
    let password = password.trim();
    validate_username(username)?;
    validate_password(password)?;

    let user = ctx
        .backend
        .create_user(username, password)
        .await
        .map_err(|e| match e {
            ClientError::Conflict(_) => CommandError::new(
                ErrorCode::Conflict,
                format!("User '{}' already exists", username),
            ),
            other => other.into(),
        })?;

    info!(id = user.id, username = %user.username, "User created");
    Ok(user)
}

/// Deletes an account, never the last one.
pub async fn delete(ctx: &AppContext, id: i64) -> CommandResult<()> {
    let session = ctx.session.require(Screen::Settings).await?;

    let users = ctx.backend.users().await?;
    let user = find(&users, id)?;
    ensure_can_delete_user(&users)?;

    if user.username == session.username {
        warn!(username = %user.username, "Operator deleted their own account");
    }

    ctx.backend.delete_user(id).await?;
    info!(id, username = %user.username, "User deleted");
    Ok(())
}

/// Grants or revokes admin rights; returns the updated account.
pub async fn toggle_admin(ctx: &AppContext, id: i64) -> CommandResult<User> {
    ctx.session.require(Screen::Settings).await?;

    let users = ctx.backend.users().await?;
    let mut user = find(&users, id)?.clone();
    user.is_admin = !user.is_admin;

    ctx.backend.update_user(&user).await?;
    info!(id, username = %user.username, is_admin = user.is_admin, "Admin flag changed");
    Ok(user)
}

fn role(user: &User) -> &'static str {
    if user.is_admin {
        "Admin"
    } else {
        "Utilisateur"
    }
}

pub async fn run(ctx: &AppContext, command: UsersCommand) -> CommandResult<()> {
    match command {
        UsersCommand::List => {
            let users = list(ctx).await?;
            println!("{:>5}  {:<24} {}", "ID", "NOM UTILISATEUR", "RÔLE");
            for user in &users {
                println!("{:>5}  {:<24} {}", user.id, user.username, role(user));
            }
            println!("{} user(s)", users.len());
        }
        UsersCommand::Add { username, password } => {
            let user = add(ctx, &username, &password).await?;
            println!("User {} created (id {})", user.username, user.id);
        }
        UsersCommand::Delete { id } => {
            delete(ctx, id).await?;
            println!("User {} deleted", id);
        }
        UsersCommand::ToggleAdmin { id } => {
            let user = toggle_admin(ctx, id).await?;
            println!("{} is now {}", user.username, role(&user));
        }
    }
    Ok(())
}
