use super::{EngineError, EngineResult, LibraryEngine};
use crate::integrations::steam_id::SteamReference;
use crate::models::LinkedAccount;

impl LibraryEngine {
    /// Link (or re-link) a chat user to an external id. Idempotent upsert.
    pub async fn link(&self, chat_user_id: &str, external_id: &str) -> EngineResult<LinkedAccount> {
        self.with_user_lock(chat_user_id, || self.link_locked(chat_user_id, external_id))
            .await
    }

    async fn link_locked(&self, chat_user_id: &str, external_id: &str) -> EngineResult<LinkedAccount> {
        let previous = self.db.get_linked_account(chat_user_id)?;
        let account = self.db.upsert_linked_account(chat_user_id, external_id)?;

        match previous {
            Some(prev) if prev.external_id != external_id => log::info!(
                "Link: {} re-linked from {} to {}",
                chat_user_id,
                prev.external_id,
                external_id
            ),
            Some(_) => log::debug!("Link: {} already linked to {}", chat_user_id, external_id),
            None => log::info!("Link: {} linked to {}", chat_user_id, external_id),
        }

        Ok(account)
    }

    pub fn resolve_account(&self, chat_user_id: &str) -> EngineResult<Option<LinkedAccount>> {
        Ok(self.db.get_linked_account(chat_user_id)?)
    }

    /// Turn a user-supplied Steam reference (id, profile URL or vanity name)
    /// into a SteamID64. Vanity names cost one remote call.
    pub async fn resolve_identity(&self, reference: &str) -> EngineResult<String> {
        match SteamReference::parse(reference) {
            Some(SteamReference::Id(id)) => Ok(id),
            Some(SteamReference::Vanity(name)) => {
                let resolved = self
                    .catalog
                    .resolve_vanity(&name)
                    .await
                    .map_err(|e| {
                        log::warn!("Link: vanity lookup for '{}' failed: {}", name, e);
                        EngineError::IdentityLookup(e)
                    })?;
                resolved.ok_or(EngineError::UnknownIdentity(name))
            }
            None => Err(EngineError::UnknownIdentity(reference.trim().to_string())),
        }
    }
}
