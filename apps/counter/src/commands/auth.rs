//! # Login Commands
//!
//! ```text
//! login amina s3cret
//!      │
//!      ▼
//! GET /utilisateurs ──► authenticate(users, name, password)
//!      │                    │
//!      │                    ├── no match → UNAUTHORIZED
//!      │                    └── Session { username, is_admin }
//!      ▼
//! connectedUser / isAdmin written to the local store
//! ```

use pharma_core::session::authenticate;
use pharma_core::Session;
use tracing::{info, warn};

use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::state::AppContext;

/// Checks the credentials against the backend and opens the session.
pub async fn login(ctx: &AppContext, username: &str, password: &str) -> CommandResult<Session> {
    let users = ctx.backend.users().await?;

    let session = authenticate(&users, username.trim(), password).ok_or_else(|| {
        info!(username = %username.trim(), "Login refused");
        CommandError::new(ErrorCode::Unauthorized, "Invalid username or password")
    })?;

    warn!(
        username = %session.username,
        "The backend stores passwords in plain text and returns them to every client"
    );

    ctx.session.open(&session).await?;
    Ok(session)
}

pub async fn logout(ctx: &AppContext) -> CommandResult<()> {
    ctx.session.close().await?;
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> CommandResult<Option<Session>> {
    Ok(ctx.session.current().await?)
}

pub(crate) fn describe(session: &Session) -> String {
    let role = if session.is_admin { "admin" } else { "user" };
    format!("{} ({})", session.username, role)
}
