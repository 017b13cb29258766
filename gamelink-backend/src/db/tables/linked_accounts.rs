//! Linked account operations (identity store)

use chrono::Utc;
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::LinkedAccount;

impl Database {
    /// Insert or replace the Steam account linked to a chat user.
    /// Keeps the original `linked_at` when the user links again.
    pub fn upsert_linked_account(
        &self,
        chat_user_id: &str,
        external_id: &str,
    ) -> SqliteResult<LinkedAccount> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO linked_accounts (chat_user_id, external_id, linked_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(chat_user_id) DO UPDATE SET
                external_id = excluded.external_id,
                updated_at = excluded.updated_at",
            rusqlite::params![chat_user_id, external_id, now],
        )?;

        conn.query_row(
            "SELECT chat_user_id, external_id, linked_at, updated_at
             FROM linked_accounts WHERE chat_user_id = ?1",
            [chat_user_id],
            row_to_linked_account,
        )
    }

    /// Get the account linked to a chat user, if any.
    pub fn get_linked_account(&self, chat_user_id: &str) -> SqliteResult<Option<LinkedAccount>> {
        let conn = self.conn();
        let result = conn.query_row(
            "SELECT chat_user_id, external_id, linked_at, updated_at
             FROM linked_accounts WHERE chat_user_id = ?1",
            [chat_user_id],
            row_to_linked_account,
        );
        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn count_linked_accounts(&self) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM linked_accounts", [], |row| row.get(0))
    }
}

fn row_to_linked_account(row: &rusqlite::Row) -> rusqlite::Result<LinkedAccount> {
    Ok(LinkedAccount {
        chat_user_id: row.get(0)?,
        external_id: row.get(1)?,
        linked_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}
