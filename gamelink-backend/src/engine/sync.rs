use super::{EngineError, EngineResult, LibraryEngine};
use crate::models::SyncReport;

impl LibraryEngine {
    /// Pull the linked account's owned games and add the ones not stored yet.
    ///
    /// Additive only: games missing from the remote list keep their rows and
    /// installed flags. Nothing is written unless the fetch succeeded, and the
    /// inserts land in a single transaction.
    pub async fn sync(&self, chat_user_id: &str) -> EngineResult<SyncReport> {
        self.with_user_lock(chat_user_id, || self.sync_locked(chat_user_id))
            .await
    }

    async fn sync_locked(&self, chat_user_id: &str) -> EngineResult<SyncReport> {
        let account = self
            .db
            .get_linked_account(chat_user_id)?
            .ok_or_else(|| EngineError::NotLinked(chat_user_id.to_string()))?;

        let games = self
            .catalog
            .fetch_owned_games(&account.external_id)
            .await
            .map_err(|e| {
                log::warn!("Sync: fetch failed for {} ({}): {}", chat_user_id, account.external_id, e);
                EngineError::RemoteCatalog(e)
            })?;

        let added = self.db.insert_missing_owned_games(chat_user_id, &games)?;
        let total = self.db.count_owned_games(chat_user_id)? as usize;

        log::info!(
            "Sync: {} fetched {} games, added {}, {} stored",
            chat_user_id,
            games.len(),
            added,
            total
        );

        Ok(SyncReport {
            added,
            fetched: games.len(),
            total,
        })
    }
}
