use serde::{Deserialize, Serialize};

/// A resolved game, as returned by lookups. Not persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Game {
    pub external_game_id: String,
    pub display_name: String,
}

impl Game {
    pub fn new(external_game_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            external_game_id: external_game_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Store page details for a single app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetails {
    pub external_game_id: String,
    pub display_name: String,
    pub header_image: Option<String>,
    pub store_url: String,
}
