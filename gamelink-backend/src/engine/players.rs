use std::collections::HashSet;

use super::{EngineResult, LibraryEngine};

impl LibraryEngine {
    /// Members of `scope` who own the game, installed or not.
    pub fn owners(&self, game_ref: &str, scope: &HashSet<String>) -> EngineResult<HashSet<String>> {
        self.scoped_owners(game_ref, scope, false)
    }

    /// Members of `scope` who own the game and have it installed.
    pub fn installed_owners(&self, game_ref: &str, scope: &HashSet<String>) -> EngineResult<HashSet<String>> {
        self.scoped_owners(game_ref, scope, true)
    }

    pub fn recipients_for_broadcast(
        &self,
        game_ref: &str,
        scope: &HashSet<String>,
        installed_only: bool,
    ) -> EngineResult<HashSet<String>> {
        if installed_only {
            self.installed_owners(game_ref, scope)
        } else {
            self.owners(game_ref, scope)
        }
    }

    fn scoped_owners(
        &self,
        game_ref: &str,
        scope: &HashSet<String>,
        installed_only: bool,
    ) -> EngineResult<HashSet<String>> {
        if scope.is_empty() {
            return Ok(HashSet::new());
        }
        Ok(self
            .db
            .list_game_owners(game_ref, installed_only)?
            .into_iter()
            .filter(|user| scope.contains(user))
            .collect())
    }
}
