//! Interfaces to the remote catalog and search services.
//!
//! The engine only sees these traits; `integrations::steam_client::SteamClient`
//! implements both against the Steam Web API and the Steam Store.

use async_trait::async_trait;

use crate::models::{Game, GameDetails};

/// Failure of a single remote call. The engine never retries.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("game library of {0} is private or unavailable")]
    PrivateLibrary(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            RemoteError::Status(status.as_u16())
        } else if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Request(e.to_string())
        }
    }
}

/// Source of truth for which games an external identity owns.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Owned games of an external identity, in remote order.
    async fn fetch_owned_games(&self, external_id: &str) -> Result<Vec<Game>, RemoteError>;

    /// Resolve a vanity profile name to an external id. `None` when no profile matches.
    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<String>, RemoteError>;
}

/// Free-text game search.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Results in the service's own relevance order.
    async fn search_games(&self, query: &str) -> Result<Vec<Game>, RemoteError>;

    async fn game_details(&self, external_game_id: &str) -> Result<Option<GameDetails>, RemoteError>;
}
