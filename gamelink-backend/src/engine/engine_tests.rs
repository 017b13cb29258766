//! Scenario tests for the engine against an in-memory database and mock
//! remote services.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::remote::{CatalogService, RemoteError, SearchService};
use super::{EngineError, LibraryEngine};
use crate::db::Database;
use crate::models::{Game, GameDetails};

const STEAM_A: &str = "76561198000000001";
const STEAM_B: &str = "76561198000000002";

/// Catalog whose per-account library can be swapped between calls.
#[derive(Default)]
struct MockCatalog {
    libraries: Mutex<HashMap<String, Vec<Game>>>,
    vanities: HashMap<String, String>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl MockCatalog {
    fn set_library(&self, external_id: &str, games: Vec<Game>) {
        self.libraries.lock().insert(external_id.to_string(), games);
    }

    fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }
}

#[async_trait]
impl CatalogService for MockCatalog {
    async fn fetch_owned_games(&self, external_id: &str) -> Result<Vec<Game>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.failure.lock().clone() {
            return Err(RemoteError::Request(message));
        }
        Ok(self.libraries.lock().get(external_id).cloned().unwrap_or_default())
    }

    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<String>, RemoteError> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(RemoteError::Request(message));
        }
        Ok(self.vanities.get(vanity).cloned())
    }
}

#[derive(Default)]
struct MockSearch {
    results: Vec<Game>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl SearchService for MockSearch {
    async fn search_games(&self, _query: &str) -> Result<Vec<Game>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RemoteError::Status(503));
        }
        Ok(self.results.clone())
    }

    async fn game_details(&self, external_game_id: &str) -> Result<Option<GameDetails>, RemoteError> {
        Ok(self
            .results
            .iter()
            .find(|g| g.external_game_id == external_game_id)
            .map(|g| GameDetails {
                external_game_id: g.external_game_id.clone(),
                display_name: g.display_name.clone(),
                header_image: None,
                store_url: format!("https://store.example/app/{}/", g.external_game_id),
            }))
    }
}

struct Harness {
    engine: LibraryEngine,
    catalog: Arc<MockCatalog>,
    search: Arc<MockSearch>,
}

impl Harness {
    fn new() -> Self {
        Self::with_mocks(MockCatalog::default(), MockSearch::default())
    }

    fn with_mocks(catalog: MockCatalog, search: MockSearch) -> Self {
        let db = Arc::new(Database::new(":memory:").expect("in-memory db"));
        let catalog = Arc::new(catalog);
        let search = Arc::new(search);
        let engine = LibraryEngine::new(db, catalog.clone(), search.clone(), 2);
        Self {
            engine,
            catalog,
            search,
        }
    }

    fn installed_ids(&self, user: &str) -> Vec<String> {
        self.engine
            .list_installed(user)
            .unwrap()
            .into_iter()
            .map(|g| g.external_game_id)
            .collect()
    }

    fn owned_ids(&self, user: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .engine
            .list_owned(user)
            .unwrap()
            .into_iter()
            .map(|g| g.external_game_id)
            .collect();
        ids.sort();
        ids
    }
}

fn scope(users: &[&str]) -> HashSet<String> {
    users.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_relink_keeps_single_account_with_latest_id() {
    let h = Harness::new();
    h.engine.link("alice", STEAM_A).await.unwrap();
    h.engine.link("alice", STEAM_B).await.unwrap();

    let account = h.engine.resolve_account("alice").unwrap().unwrap();
    assert_eq!(account.external_id, STEAM_B);
    assert_eq!(h.engine.db.count_linked_accounts().unwrap(), 1);
}

#[tokio::test]
async fn test_sync_requires_link() {
    let h = Harness::new();
    let err = h.engine.sync("nobody").await.unwrap_err();
    assert!(matches!(err, EngineError::NotLinked(_)));
    assert_eq!(h.catalog.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let h = Harness::new();
    h.catalog.set_library(
        STEAM_A,
        vec![Game::new("1", "Game A"), Game::new("2", "Game B")],
    );
    h.engine.link("alice", STEAM_A).await.unwrap();

    let first = h.engine.sync("alice").await.unwrap();
    assert_eq!((first.added, first.fetched, first.total), (2, 2, 2));
    let before = h.engine.list_owned("alice").unwrap();

    let second = h.engine.sync("alice").await.unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.total, 2);
    assert_eq!(h.engine.list_owned("alice").unwrap(), before);
}

#[tokio::test]
async fn test_sync_never_removes_games() {
    let h = Harness::new();
    h.catalog.set_library(
        STEAM_A,
        vec![Game::new("1", "Game A"), Game::new("2", "Game B")],
    );
    h.engine.link("alice", STEAM_A).await.unwrap();
    h.engine.sync("alice").await.unwrap();
    h.engine.set_installed("alice", "2", true).await.unwrap();

    h.catalog.set_library(STEAM_A, vec![Game::new("1", "Game A")]);
    let report = h.engine.sync("alice").await.unwrap();

    assert_eq!((report.added, report.fetched, report.total), (0, 1, 2));
    assert_eq!(h.owned_ids("alice"), vec!["1", "2"]);
    assert_eq!(h.installed_ids("alice"), vec!["2"]);
}

#[tokio::test]
async fn test_remote_failure_leaves_store_untouched() {
    let h = Harness::new();
    h.catalog.set_library(STEAM_A, vec![Game::new("1", "Game A")]);
    h.engine.link("alice", STEAM_A).await.unwrap();
    h.engine.sync("alice").await.unwrap();

    h.catalog.set_library(
        STEAM_A,
        vec![Game::new("1", "Game A"), Game::new("3", "Game C")],
    );
    h.catalog.fail_with("timed out");

    let err = h.engine.sync("alice").await.unwrap_err();
    assert!(matches!(err, EngineError::RemoteCatalog(RemoteError::Request(_))));
    assert_eq!(h.owned_ids("alice"), vec!["1"]);
}

#[tokio::test]
async fn test_set_installed_on_unowned_game() {
    let h = Harness::new();
    h.engine.link("alice", STEAM_A).await.unwrap();

    let err = h.engine.set_installed("alice", "400", true).await.unwrap_err();
    assert!(matches!(err, EngineError::NotOwned { .. }));
    assert!(h.engine.list_owned("alice").unwrap().is_empty());
}

#[tokio::test]
async fn test_set_installed_twice_is_a_noop() {
    let h = Harness::new();
    h.catalog.set_library(STEAM_A, vec![Game::new("400", "Portal")]);
    h.engine.link("alice", STEAM_A).await.unwrap();
    h.engine.sync("alice").await.unwrap();

    h.engine.set_installed("alice", "400", true).await.unwrap();
    let once = h.engine.list_installed("alice").unwrap();
    let game = h.engine.set_installed("alice", "400", true).await.unwrap();

    assert!(game.installed);
    assert_eq!(h.engine.list_installed("alice").unwrap(), once);

    h.engine.set_installed("alice", "400", false).await.unwrap();
    assert!(h.installed_ids("alice").is_empty());
}

#[tokio::test]
async fn test_broadcast_recipients_portal() {
    let h = Harness::new();
    h.catalog.set_library(STEAM_A, vec![Game::new("400", "Portal")]);
    h.catalog.set_library(STEAM_B, vec![Game::new("400", "Portal")]);
    h.engine.link("A", STEAM_A).await.unwrap();
    h.engine.link("B", STEAM_B).await.unwrap();
    h.engine.sync("A").await.unwrap();
    h.engine.sync("B").await.unwrap();
    h.engine.set_installed("A", "400", true).await.unwrap();

    let members = scope(&["A", "B"]);
    assert_eq!(
        h.engine.recipients_for_broadcast("400", &members, true).unwrap(),
        scope(&["A"])
    );
    assert_eq!(
        h.engine.recipients_for_broadcast("400", &members, false).unwrap(),
        scope(&["A", "B"])
    );

    // Out-of-scope owners are never returned
    assert_eq!(h.engine.owners("400", &scope(&["B", "C"])).unwrap(), scope(&["B"]));
    assert!(h.engine.owners("400", &HashSet::new()).unwrap().is_empty());
}

#[tokio::test]
async fn test_owners_superset_of_installed_owners() {
    let h = Harness::new();
    let library = vec![Game::new("10", "Ten"), Game::new("20", "Twenty")];
    for (user, steam) in [("u1", STEAM_A), ("u2", STEAM_B)] {
        h.catalog.set_library(steam, library.clone());
        h.engine.link(user, steam).await.unwrap();
        h.engine.sync(user).await.unwrap();
    }
    h.engine.set_installed("u1", "10", true).await.unwrap();
    h.engine.set_installed("u2", "20", true).await.unwrap();

    let members = scope(&["u1", "u2", "u3"]);
    for game in ["10", "20", "30"] {
        let owners = h.engine.owners(game, &members).unwrap();
        let installed = h.engine.installed_owners(game, &members).unwrap();
        assert!(installed.is_subset(&owners), "game {}", game);
    }
}

#[tokio::test]
async fn test_resolve_owned_ambiguity_lists_both_candidates() {
    let h = Harness::new();
    h.catalog.set_library(
        STEAM_A,
        vec![
            Game::new("620", "Portal 2"),
            Game::new("400", "Portal"),
            Game::new("220", "Half-Life 2"),
        ],
    );
    h.engine.link("alice", STEAM_A).await.unwrap();
    h.engine.sync("alice").await.unwrap();

    match h.engine.resolve_owned("alice", "PORTAL") {
        Err(EngineError::Ambiguous { candidates, .. }) => {
            assert_eq!(
                candidates,
                vec![Game::new("400", "Portal"), Game::new("620", "Portal 2")]
            );
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }

    assert_eq!(
        h.engine.resolve_owned("alice", "half").unwrap(),
        Game::new("220", "Half-Life 2")
    );
    assert_eq!(
        h.engine.resolve_owned("alice", "#620").unwrap(),
        Game::new("620", "Portal 2")
    );
    assert!(matches!(
        h.engine.resolve_owned("alice", "doom"),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        h.engine.resolve_owned("bob", "portal"),
        Err(EngineError::NotLinked(_))
    ));
}

#[tokio::test]
async fn test_resolve_catalog_spans_all_libraries() {
    let h = Harness::new();
    h.catalog.set_library(STEAM_A, vec![Game::new("400", "Portal")]);
    h.catalog.set_library(STEAM_B, vec![Game::new("400", "Portal"), Game::new("620", "Portal 2")]);
    h.engine.link("A", STEAM_A).await.unwrap();
    h.engine.link("B", STEAM_B).await.unwrap();
    h.engine.sync("A").await.unwrap();
    h.engine.sync("B").await.unwrap();

    match h.engine.resolve_catalog("portal") {
        Err(EngineError::Ambiguous { candidates, .. }) => assert_eq!(
            candidates,
            vec![Game::new("400", "Portal"), Game::new("620", "Portal 2")]
        ),
        other => panic!("expected ambiguity, got {:?}", other),
    }

    // Only B owns Portal 2; it still resolves for a scope without B,
    // and the scoped owner set is simply empty.
    let game = h.engine.resolve_catalog("portal 2").unwrap();
    assert_eq!(game, Game::new("620", "Portal 2"));
    assert!(h
        .engine
        .recipients_for_broadcast(&game.external_game_id, &scope(&["A"]), false)
        .unwrap()
        .is_empty());

    assert!(matches!(
        h.engine.resolve_catalog("half-life"),
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_search_truncates_and_skips_blank_queries() {
    let search = MockSearch {
        results: vec![
            Game::new("620", "Portal 2"),
            Game::new("400", "Portal"),
            Game::new("317400", "Portal Stories: Mel"),
        ],
        ..Default::default()
    };
    let h = Harness::with_mocks(MockCatalog::default(), search);

    let results = h.engine.search("portal").await.unwrap();
    assert_eq!(results, vec![Game::new("620", "Portal 2"), Game::new("400", "Portal")]);

    assert!(h.engine.search("   ").await.unwrap().is_empty());
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);

    let details = h.engine.game_details("400").await.unwrap().unwrap();
    assert_eq!(details.display_name, "Portal");
}

#[tokio::test]
async fn test_search_failure_is_typed() {
    let search = MockSearch {
        fail: true,
        ..Default::default()
    };
    let h = Harness::with_mocks(MockCatalog::default(), search);
    let err = h.engine.search("portal").await.unwrap_err();
    assert!(matches!(err, EngineError::RemoteSearch(RemoteError::Status(503))));
}

#[tokio::test]
async fn test_resolve_identity() {
    let catalog = MockCatalog {
        vanities: HashMap::from([("gaben".to_string(), STEAM_A.to_string())]),
        ..Default::default()
    };
    let h = Harness::with_mocks(catalog, MockSearch::default());

    assert_eq!(h.engine.resolve_identity(STEAM_B).await.unwrap(), STEAM_B);
    assert_eq!(
        h.engine
            .resolve_identity("https://steamcommunity.com/id/gaben/")
            .await
            .unwrap(),
        STEAM_A
    );
    assert!(matches!(
        h.engine.resolve_identity("nobody_here").await,
        Err(EngineError::UnknownIdentity(_))
    ));
    assert!(matches!(
        h.engine.resolve_identity("not a steam profile").await,
        Err(EngineError::UnknownIdentity(_))
    ));
}

#[tokio::test]
async fn test_failed_vanity_lookup_is_an_identity_error() {
    let h = Harness::new();
    h.catalog.fail_with("forbidden");

    assert!(matches!(
        h.engine.resolve_identity("gaben").await,
        Err(EngineError::IdentityLookup(RemoteError::Request(_)))
    ));
    // A plain id needs no remote call
    assert_eq!(h.engine.resolve_identity(STEAM_A).await.unwrap(), STEAM_A);
}

#[tokio::test]
async fn test_install_mark_waits_for_running_sync() {
    let h = Harness::new();
    h.catalog.set_library(STEAM_A, vec![Game::new("400", "Portal")]);
    *h.catalog.delay.lock() = Some(Duration::from_millis(50));
    h.engine.link("alice", STEAM_A).await.unwrap();

    // The sync takes the user's lock first; the mark only runs once the
    // sync's insert has landed, so the game is already owned.
    let (report, marked) = tokio::join!(h.engine.sync("alice"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.engine.set_installed("alice", "400", true).await
    });

    assert_eq!(report.unwrap().added, 1);
    assert!(marked.unwrap().installed);
    assert_eq!(h.installed_ids("alice"), vec!["400"]);
    assert!(h.engine.user_locks.is_empty());
}

#[tokio::test]
async fn test_user_locks_are_released_after_use() {
    let h = Harness::new();
    h.catalog.set_library(STEAM_A, vec![Game::new("400", "Portal")]);
    h.engine.link("alice", STEAM_A).await.unwrap();
    h.engine.link("bob", STEAM_B).await.unwrap();
    h.engine.sync("alice").await.unwrap();
    h.engine.set_installed("alice", "400", true).await.unwrap();
    assert!(h.engine.set_installed("bob", "400", true).await.is_err());

    assert!(h.engine.user_locks.is_empty());
}
