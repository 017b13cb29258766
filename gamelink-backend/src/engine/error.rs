//! Engine error kinds. Every engine operation ends in a value or exactly one of these.

use crate::models::Game;

use super::remote::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("chat user {0} has no linked account")]
    NotLinked(String),

    #[error("remote catalog error: {0}")]
    RemoteCatalog(#[source] RemoteError),

    #[error("remote search error: {0}")]
    RemoteSearch(#[source] RemoteError),

    #[error("game {external_game_id} is not recorded as owned by {chat_user_id}")]
    NotOwned {
        chat_user_id: String,
        external_game_id: String,
    },

    #[error("no game matches '{0}'")]
    NotFound(String),

    #[error("'{query}' matches {} games", .candidates.len())]
    Ambiguous { query: String, candidates: Vec<Game> },

    #[error("no Steam profile matches '{0}'")]
    UnknownIdentity(String),

    /// The remote lookup of a custom profile name failed (not a miss)
    #[error("profile lookup failed: {0}")]
    IdentityLookup(#[source] RemoteError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
