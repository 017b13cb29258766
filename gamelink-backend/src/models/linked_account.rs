use serde::{Deserialize, Serialize};

/// Binds one Discord user to a Steam account.
/// There is at most one row per `chat_user_id`; the same `external_id`
/// may be linked by several chat users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub chat_user_id: String,
    /// SteamID64
    pub external_id: String,
    pub linked_at: String,
    pub updated_at: String,
}
