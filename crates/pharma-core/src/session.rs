//! # Session & Route Guard
//!
//! Who is at the counter and which screens they may open.
//!
//! ## Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  guard(session, screen)                                                 │
//! │       │                                                                 │
//! │       ├── no session ─────────────────────────► Redirect(Login)        │
//! │       │                                                                 │
//! │       ├── admin ──────────────────────────────► Granted                │
//! │       │                                                                 │
//! │       └── not admin                                                     │
//! │             ├── Sales / Deliveries / Settings ► Granted                │
//! │             └── anything else ────────────────► Redirect(Sales)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::User;

/// The logged-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub is_admin: bool,
}

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Login,
    Sales,
    Stock,
    NewProduct,
    Credits,
    Deliveries,
    History,
    Statistics,
    Settings,
}

impl Screen {
    /// Screens a non-admin operator cannot open.
    pub fn admin_only(&self) -> bool {
        !matches!(
            self,
            Screen::Login | Screen::Sales | Screen::Deliveries | Screen::Settings
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Login => "login",
            Screen::Sales => "sales",
            Screen::Stock => "stock",
            Screen::NewProduct => "new product",
            Screen::Credits => "credits",
            Screen::Deliveries => "deliveries",
            Screen::History => "sales history",
            Screen::Statistics => "statistics",
            Screen::Settings => "settings",
        };
        f.write_str(name)
    }
}

/// Result of the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(Screen),
}

/// Decides whether `screen` can be shown for `session`.
pub fn guard(session: Option<&Session>, screen: Screen) -> Access {
    match session {
        None if screen == Screen::Login => Access::Granted,
        None => Access::Redirect(Screen::Login),
        Some(s) if !s.is_admin && screen.admin_only() => Access::Redirect(Screen::Sales),
        Some(_) => Access::Granted,
    }
}

/// Finds the account matching a login attempt.
///
/// ## Rules
/// - Username must match exactly
/// - Password is compared after trimming both sides
pub fn authenticate(users: &[User], username: &str, password: &str) -> Option<Session> {
    let password = password.trim();
    users
        .iter()
        .find(|u| u.username == username && u.password.trim() == password)
        .map(|u| Session {
            username: u.username.clone(),
            is_admin: u.is_admin,
        })
}

/// Refuses to delete the last remaining account.
pub fn ensure_can_delete_user(users: &[User]) -> CoreResult<()> {
    if users.len() <= 1 {
        return Err(CoreError::LastUser);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
