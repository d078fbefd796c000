//! # Session State
//!
//! Who is at the counter, read from the local store on every command.
//!
//! ## Route Guard
//! ```text
//! command ──► require(Screen::Stock)
//!                  │
//!                  ├── no session            → UNAUTHORIZED ("log in first")
//!                  ├── non-admin, admin-only → FORBIDDEN    (Sales only)
//!                  └── granted               → Session
//! ```

use pharma_core::session::guard;
use pharma_core::{Access, Screen, Session};
use pharma_store::{SessionRepository, StoreResult};
use tracing::{debug, info};

use crate::error::{CommandError, CommandResult, ErrorCode};

#[derive(Debug, Clone)]
pub struct SessionState {
    repo: SessionRepository,
}

impl SessionState {
    pub fn new(repo: SessionRepository) -> Self {
        SessionState { repo }
    }

    pub async fn current(&self) -> StoreResult<Option<Session>> {
        self.repo.current().await
    }

    /// Returns the session allowed on `screen`, or the redirect as an error.
    pub async fn require(&self, screen: Screen) -> CommandResult<Session> {
        let session = self.repo.current().await?;

        match guard(session.as_ref(), screen) {
            Access::Redirect(Screen::Login) => {
                debug!(%screen, "No session, redirecting to login");
                Err(CommandError::new(
                    ErrorCode::Unauthorized,
                    "Not logged in. Run `pharma-counter login <user> <password>` first",
                ))
            }
            Access::Redirect(target) => {
                debug!(%screen, %target, "Screen reserved to administrators");
                Err(CommandError::new(
                    ErrorCode::Forbidden,
                    format!("The {} screen is reserved to administrators", screen),
                ))
            }
            Access::Granted => session.ok_or_else(|| {
                CommandError::new(ErrorCode::Unauthorized, "Not logged in")
            }),
        }
    }

    pub async fn open(&self, session: &Session) -> StoreResult<()> {
        self.repo.set(session).await?;
        info!(username = %session.username, is_admin = session.is_admin, "Session opened");
        Ok(())
    }

    pub async fn close(&self) -> StoreResult<()> {
        self.repo.clear().await?;
        info!("Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_store;

    #[tokio::test]
    async fn test_require_without_session() {
        let store = memory_store().await;
        let state = SessionState::new(store.session());

        let err = state.require(Screen::Sales).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_require_admin_screen() {
        let store = memory_store().await;
        let state = SessionState::new(store.session());
        state
            .open(&Session {
                username: "youssef".into(),
                is_admin: false,
            })
            .await
            .unwrap();

        assert!(state.require(Screen::Sales).await.is_ok());
        assert!(state.require(Screen::Deliveries).await.is_ok());
        let err = state.require(Screen::Statistics).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        state.close().await.unwrap();
        assert!(state.current().await.unwrap().is_none());
    }
}
