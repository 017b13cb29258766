//! Account-linking and library-sync engine.
//!
//! Command handlers call exactly one engine operation per command and render
//! the result. The engine never talks to Discord; scopes (sets of chat user
//! ids) are always supplied by the caller.
//!
//! Operations are split by concern:
//! - `identity`: link / resolve accounts
//! - `sync`: additive reconciliation of the remote library
//! - `resolver`: store search and name -> game resolution
//! - `installs`: installed flag and library listings
//! - `players`: owner / installed-owner / broadcast recipient sets

pub mod error;
pub mod remote;

mod identity;
mod installs;
mod players;
mod resolver;
mod sync;

#[cfg(test)]
mod engine_tests;

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::Database;
use remote::{CatalogService, SearchService};

pub use error::{EngineError, EngineResult};

pub struct LibraryEngine {
    db: Arc<Database>,
    catalog: Arc<dyn CatalogService>,
    search: Arc<dyn SearchService>,
    /// Max results kept from a store search
    search_limit: usize,
    /// One async lock per chat user: sync (fetch -> insert) and installed-flag
    /// writes for the same user never interleave. Users don't block each other.
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LibraryEngine {
    pub fn new(
        db: Arc<Database>,
        catalog: Arc<dyn CatalogService>,
        search: Arc<dyn SearchService>,
        search_limit: usize,
    ) -> Self {
        Self {
            db,
            catalog,
            search,
            search_limit: search_limit.max(1),
            user_locks: DashMap::new(),
        }
    }

    /// Get or create the lock for a chat user
    fn user_lock(&self, chat_user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(chat_user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `op` inside the chat user's critical section. The lock entry is
    /// dropped afterwards unless another task is holding or waiting on it.
    async fn with_user_lock<T, F, Fut>(&self, chat_user_id: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.user_lock(chat_user_id);
        let result = {
            let _guard = lock.lock().await;
            op().await
        };
        drop(lock);
        // Clones are only handed out under the map's shard lock, so a count of
        // one here means no other task can be using this entry.
        self.user_locks
            .remove_if(chat_user_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}
