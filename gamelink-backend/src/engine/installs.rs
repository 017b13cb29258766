use super::{EngineError, EngineResult, LibraryEngine};
use crate::models::OwnedGame;

impl LibraryEngine {
    /// Set the installed flag on one of the user's owned games.
    /// Fails with `NotOwned` (and writes nothing) when the game isn't recorded.
    pub async fn set_installed(
        &self,
        chat_user_id: &str,
        external_game_id: &str,
        value: bool,
    ) -> EngineResult<OwnedGame> {
        let game = self
            .with_user_lock(chat_user_id, || async {
                self.db
                    .set_owned_game_installed(chat_user_id, external_game_id, value)
            })
            .await?
            .ok_or_else(|| EngineError::NotOwned {
                chat_user_id: chat_user_id.to_string(),
                external_game_id: external_game_id.to_string(),
            })?;

        log::info!(
            "Installs: {} marked {} ({}) as {}",
            chat_user_id,
            game.display_name,
            external_game_id,
            if value { "installed" } else { "uninstalled" }
        );
        Ok(game)
    }

    pub fn list_installed(&self, chat_user_id: &str) -> EngineResult<Vec<OwnedGame>> {
        Ok(self.db.list_owned_games(chat_user_id, true)?)
    }

    pub fn list_owned(&self, chat_user_id: &str) -> EngineResult<Vec<OwnedGame>> {
        Ok(self.db.list_owned_games(chat_user_id, false)?)
    }
}
