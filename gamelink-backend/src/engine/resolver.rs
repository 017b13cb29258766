use std::collections::BTreeMap;

use super::{EngineError, EngineResult, LibraryEngine};
use crate::models::{Game, GameDetails};

impl LibraryEngine {
    /// Store search, in the store's relevance order, capped at the configured limit.
    /// A blank query returns nothing without a remote call.
    pub async fn search(&self, query_text: &str) -> EngineResult<Vec<Game>> {
        let query = query_text.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = self
            .search
            .search_games(query)
            .await
            .map_err(EngineError::RemoteSearch)?;
        results.truncate(self.search_limit);
        Ok(results)
    }

    pub async fn game_details(&self, external_game_id: &str) -> EngineResult<Option<GameDetails>> {
        self.search
            .game_details(external_game_id)
            .await
            .map_err(EngineError::RemoteSearch)
    }

    /// Resolve a name fragment against the acting user's own library.
    pub fn resolve_owned(&self, chat_user_id: &str, name_fragment: &str) -> EngineResult<Game> {
        if self.db.get_linked_account(chat_user_id)?.is_none() {
            return Err(EngineError::NotLinked(chat_user_id.to_string()));
        }
        let owned = self.db.list_owned_games(chat_user_id, false)?;
        select_game(name_fragment, owned.iter().map(|g| g.game()))
    }

    /// Resolve a name fragment against every stored catalog. Used by player
    /// queries, which narrow the owners to a scope afterwards, so a game no
    /// member owns still resolves.
    pub fn resolve_catalog(&self, name_fragment: &str) -> EngineResult<Game> {
        select_game(name_fragment, self.db.list_catalog_games()?.into_iter())
    }
}

/// Case-insensitive substring match over distinct games.
///
/// `#<id>` picks a game by external id instead, so users can get past an
/// ambiguity. Candidates of an ambiguity are ordered by lowercase name, then id.
fn select_game(name_fragment: &str, candidates: impl Iterator<Item = Game>) -> EngineResult<Game> {
    let needle = name_fragment.trim();
    if needle.is_empty() {
        return Err(EngineError::NotFound(needle.to_string()));
    }

    if let Some(id) = needle.strip_prefix('#').map(str::trim).filter(|id| !id.is_empty()) {
        return candidates
            .into_iter()
            .find(|g| g.external_game_id == id)
            .ok_or_else(|| EngineError::NotFound(needle.to_string()));
    }

    let lowered = needle.to_lowercase();
    let mut matches: BTreeMap<String, Game> = BTreeMap::new();
    for game in candidates {
        if game.display_name.to_lowercase().contains(&lowered) {
            matches.entry(game.external_game_id.clone()).or_insert(game);
        }
    }

    let mut matches: Vec<Game> = matches.into_values().collect();
    match matches.len() {
        0 => Err(EngineError::NotFound(needle.to_string())),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort_by(|a, b| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
                    .then_with(|| a.external_game_id.cmp(&b.external_game_id))
            });
            Err(EngineError::Ambiguous {
                query: needle.to_string(),
                candidates: matches,
            })
        }
    }
}
