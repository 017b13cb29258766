use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;

/// Single shared SQLite connection.
///
/// Every public method takes the lock for the duration of one statement or
/// one transaction, so each write is atomic with respect to other callers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        let conn = if database_url == ":memory:" {
            Connection::open_in_memory()?
        } else {
            // Create parent directory if it doesn't exist
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).ok();
                }
            }
            Connection::open(database_url)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn();

        // Discord user -> Steam account
        conn.execute(
            "CREATE TABLE IF NOT EXISTS linked_accounts (
                chat_user_id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL,
                linked_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_linked_accounts_external ON linked_accounts(external_id)",
            [],
        )?;

        // Per-user library. Rows are only ever added by sync, never removed.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS owned_games (
                chat_user_id TEXT NOT NULL,
                external_game_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                installed INTEGER NOT NULL DEFAULT 0,
                added_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (chat_user_id, external_game_id),
                FOREIGN KEY (chat_user_id) REFERENCES linked_accounts(chat_user_id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_owned_games_game ON owned_games(external_game_id, installed)",
            [],
        )?;

        Ok(())
    }
}
