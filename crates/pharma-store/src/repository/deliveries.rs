//! # Delivery Draft Repository
//!
//! The [`DeliveryBook`] lives under `documents`. Every write rewrites the
//! whole book; there are a handful of notes at most.

use pharma_core::{CoreError, DeliveryBook, DeliveryDocument};
use tracing::info;

use super::keys;
use super::kv::KvRepository;
use crate::error::StoreResult;

/// Repository for delivery drafts.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    kv: KvRepository,
}

impl DeliveryRepository {
    pub fn new(kv: KvRepository) -> Self {
        DeliveryRepository { kv }
    }

    pub async fn load(&self) -> StoreResult<DeliveryBook> {
        Ok(self.kv.get(keys::DOCUMENTS).await?.unwrap_or_default())
    }

    pub async fn store(&self, book: &DeliveryBook) -> StoreResult<()> {
        self.kv.put(keys::DOCUMENTS, book).await
    }

    /// Loads the book, applies `edit`, and writes it back when `edit`
    /// succeeds. Domain errors leave the stored book untouched.
    ///
    /// ## Example
    /// ```rust,ignore
    /// store.deliveries().update(|book| book.save(document)).await??;
    /// ```
    pub async fn update<T>(
        &self,
        edit: impl FnOnce(&mut DeliveryBook) -> Result<T, CoreError>,
    ) -> StoreResult<Result<T, CoreError>> {
        let mut book = self.load().await?;
        match edit(&mut book) {
            Ok(value) => {
                self.store(&book).await?;
                Ok(Ok(value))
            }
            Err(e) => Ok(Err(e)),
        }
    }

    /// Saves a draft (see [`DeliveryBook::save`]).
    pub async fn save_draft(&self, document: DeliveryDocument) -> StoreResult<Result<(), CoreError>> {
        let number = document.number.clone();
        let outcome = self.update(|book| book.save(document)).await?;
        if outcome.is_ok() {
            info!(number = %number, "Delivery draft saved");
        }
        Ok(outcome)
    }
}
