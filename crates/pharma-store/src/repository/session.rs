//! # Session Repository
//!
//! Login flags (`connectedUser`, `isAdmin`) and the id of the last edited
//! stock row (`lastEditedId`).

use pharma_core::{MedicineId, Session};
use tracing::{debug, info};

use super::keys;
use super::kv::KvRepository;
use crate::error::StoreResult;

/// Repository for the persisted session.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    kv: KvRepository,
}

impl SessionRepository {
    pub fn new(kv: KvRepository) -> Self {
        SessionRepository { kv }
    }

    /// The logged-in operator, if any. A missing `isAdmin` flag reads as
    /// non-admin.
    pub async fn current(&self) -> StoreResult<Option<Session>> {
        let Some(username) = self.kv.get::<String>(keys::CONNECTED_USER).await? else {
            return Ok(None);
        };
        let is_admin = self.kv.get::<bool>(keys::IS_ADMIN).await?.unwrap_or(false);
        Ok(Some(Session { username, is_admin }))
    }

    pub async fn set(&self, session: &Session) -> StoreResult<()> {
        self.kv.put(keys::CONNECTED_USER, &session.username).await?;
        self.kv.put(keys::IS_ADMIN, &session.is_admin).await?;
        info!(user = %session.username, admin = session.is_admin, "Session stored");
        Ok(())
    }

    pub async fn clear(&self) -> StoreResult<()> {
        self.kv.delete(keys::CONNECTED_USER).await?;
        self.kv.delete(keys::IS_ADMIN).await?;
        info!("Session cleared");
        Ok(())
    }

    pub async fn last_edited(&self) -> StoreResult<Option<MedicineId>> {
        self.kv.get(keys::LAST_EDITED_ID).await
    }

    pub async fn set_last_edited(&self, id: MedicineId) -> StoreResult<()> {
        debug!(id, "Remembering last edited row");
        self.kv.put(keys::LAST_EDITED_ID, &id).await
    }

    /// Forgets the last edited row when it is `id`.
    pub async fn clear_last_edited_if(&self, id: MedicineId) -> StoreResult<bool> {
        if self.last_edited().await? == Some(id) {
            return self.kv.delete(keys::LAST_EDITED_ID).await;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{LocalStore, StoreConfig};
    use pharma_core::Session;

    #[tokio::test]
    async fn test_session_set_and_clear() {
        let store = LocalStore::new(StoreConfig::in_memory()).await.unwrap();
        let repo = store.session();

        assert!(repo.current().await.unwrap().is_none());

        let session = Session {
            username: "amina".to_string(),
            is_admin: true,
        };
        repo.set(&session).await.unwrap();
        assert_eq!(repo.current().await.unwrap(), Some(session));

        repo.clear().await.unwrap();
        assert!(repo.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_admin_flag_is_not_admin() {
        let store = LocalStore::new(StoreConfig::in_memory()).await.unwrap();
        store.kv().put("connectedUser", "youssef").await.unwrap();

        let session = store.session().current().await.unwrap().unwrap();
        assert!(!session.is_admin);
    }

    #[tokio::test]
    async fn test_last_edited_cleared_only_for_same_id() {
        let store = LocalStore::new(StoreConfig::in_memory()).await.unwrap();
        let repo = store.session();

        repo.set_last_edited(12).await.unwrap();
        assert!(!repo.clear_last_edited_if(13).await.unwrap());
        assert_eq!(repo.last_edited().await.unwrap(), Some(12));

        assert!(repo.clear_last_edited_if(12).await.unwrap());
        assert_eq!(repo.last_edited().await.unwrap(), None);
    }
}
