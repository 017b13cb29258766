//! Owned game operations (catalog store)

use chrono::Utc;
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::{Game, OwnedGame};

const OWNED_GAME_COLUMNS: &str =
    "chat_user_id, external_game_id, display_name, installed, added_at, updated_at";

impl Database {
    /// Insert every game the user doesn't have a row for yet, in one transaction.
    /// Existing rows (names, installed flags) are left untouched.
    /// Returns the number of rows inserted.
    pub fn insert_missing_owned_games(
        &self,
        chat_user_id: &str,
        games: &[Game],
    ) -> SqliteResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO owned_games
                    (chat_user_id, external_game_id, display_name, installed, added_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            )?;
            for game in games {
                added += stmt.execute(rusqlite::params![
                    chat_user_id,
                    game.external_game_id,
                    game.display_name,
                    now
                ])?;
            }
        }

        tx.commit()?;
        Ok(added)
    }

    /// Set the installed flag on an existing row. Returns `None` when the user
    /// has no row for the game. `updated_at` only moves when the flag changes.
    pub fn set_owned_game_installed(
        &self,
        chat_user_id: &str,
        external_game_id: &str,
        installed: bool,
    ) -> SqliteResult<Option<OwnedGame>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "UPDATE owned_games SET installed = ?3, updated_at = ?4
             WHERE chat_user_id = ?1 AND external_game_id = ?2 AND installed != ?3",
            rusqlite::params![chat_user_id, external_game_id, installed, now],
        )?;

        let result = tx.query_row(
            &format!(
                "SELECT {} FROM owned_games WHERE chat_user_id = ?1 AND external_game_id = ?2",
                OWNED_GAME_COLUMNS
            ),
            [chat_user_id, external_game_id],
            row_to_owned_game,
        );
        let game = match result {
            Ok(game) => Some(game),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e),
        };

        tx.commit()?;
        Ok(game)
    }

    /// List a user's games ordered by name, optionally only the installed ones.
    pub fn list_owned_games(
        &self,
        chat_user_id: &str,
        installed_only: bool,
    ) -> SqliteResult<Vec<OwnedGame>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM owned_games WHERE chat_user_id = ?1 {}
             ORDER BY display_name COLLATE NOCASE, external_game_id",
            OWNED_GAME_COLUMNS,
            if installed_only { "AND installed = 1" } else { "" }
        );
        let mut stmt = conn.prepare(&sql)?;
        let games = stmt
            .query_map([chat_user_id], row_to_owned_game)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(games)
    }

    pub fn count_owned_games(&self, chat_user_id: &str) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM owned_games WHERE chat_user_id = ?1",
            [chat_user_id],
            |row| row.get(0),
        )
    }

    /// Every distinct game in any user's catalog. A game stored under more
    /// than one display name is listed once, with the smallest name.
    pub fn list_catalog_games(&self) -> SqliteResult<Vec<Game>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT external_game_id, MIN(display_name) FROM owned_games
             GROUP BY external_game_id ORDER BY external_game_id",
        )?;
        let games = stmt
            .query_map([], |row| Ok(Game::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(games)
    }

    /// Chat users with a row for the game, optionally only those with it installed.
    pub fn list_game_owners(
        &self,
        external_game_id: &str,
        installed_only: bool,
    ) -> SqliteResult<Vec<String>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT chat_user_id FROM owned_games WHERE external_game_id = ?1 {}",
            if installed_only { "AND installed = 1" } else { "" }
        );
        let mut stmt = conn.prepare(&sql)?;
        let owners = stmt
            .query_map([external_game_id], |row| row.get(0))?
            .collect::<SqliteResult<Vec<String>>>()?;
        Ok(owners)
    }
}

fn row_to_owned_game(row: &rusqlite::Row) -> rusqlite::Result<OwnedGame> {
    Ok(OwnedGame {
        chat_user_id: row.get(0)?,
        external_game_id: row.get(1)?,
        display_name: row.get(2)?,
        installed: row.get(3)?,
        added_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
