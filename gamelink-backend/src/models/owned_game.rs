use serde::{Deserialize, Serialize};

use super::Game;

/// A game recorded in a chat user's library, keyed by (chat_user_id, external_game_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedGame {
    pub chat_user_id: String,
    /// Steam app id
    pub external_game_id: String,
    pub display_name: String,
    pub installed: bool,
    pub added_at: String,
    pub updated_at: String,
}

impl OwnedGame {
    pub fn game(&self) -> Game {
        Game {
            external_game_id: self.external_game_id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Outcome of a library sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Rows inserted by this sync
    pub added: usize,
    /// Games returned by the remote catalog
    pub fetched: usize,
    /// Rows stored for the user after the sync (retained games included)
    pub total: usize,
}
