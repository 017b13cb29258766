//! Steam Web API + Steam Store client.
//!
//! - Owned games: `IPlayerService/GetOwnedGames/v1` (needs an API key)
//! - Vanity names: `ISteamUser/ResolveVanityURL/v1` (needs an API key)
//! - Search: store `api/storesearch`
//! - Details: store `api/appdetails`
//!
//! Each operation is a single HTTP attempt; failures surface as [`RemoteError`].

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::SteamConfig;
use crate::engine::remote::{CatalogService, RemoteError, SearchService};
use crate::models::{Game, GameDetails};

/// ResolveVanityURL `success` value for a match
const VANITY_MATCH: i64 = 1;

pub struct SteamClient {
    api_key: String,
    api_base_url: String,
    store_base_url: String,
    country: String,
    language: String,
    http: reqwest::Client,
}

impl SteamClient {
    pub fn new(config: &SteamConfig) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("HTTP client error: {}", e))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store_base_url: config.store_base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            language: config.language.clone(),
            http,
        })
    }

    pub fn store_page_url(&self, external_game_id: &str) -> String {
        format!("{}/app/{}/", self.store_base_url, external_game_id)
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, RemoteError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl CatalogService for SteamClient {
    async fn fetch_owned_games(&self, external_id: &str) -> Result<Vec<Game>, RemoteError> {
        let url = format!("{}/IPlayerService/GetOwnedGames/v1/", self.api_base_url);
        let body = self
            .get_text(
                &url,
                &[
                    ("key", self.api_key.as_str()),
                    ("steamid", external_id),
                    ("include_appinfo", "1"),
                    ("include_played_free_games", "1"),
                    ("format", "json"),
                ],
            )
            .await
            .map_err(|e| {
                log::error!("Steam: GetOwnedGames failed for {}: {}", external_id, e);
                e
            })?;
        parse_owned_games(external_id, &body)
    }

    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<String>, RemoteError> {
        let url = format!("{}/ISteamUser/ResolveVanityURL/v1/", self.api_base_url);
        let body = self
            .get_text(&url, &[("key", self.api_key.as_str()), ("vanityurl", vanity)])
            .await
            .map_err(|e| {
                log::error!("Steam: ResolveVanityURL failed for '{}': {}", vanity, e);
                e
            })?;
        parse_vanity_response(&body)
    }
}

#[async_trait]
impl SearchService for SteamClient {
    async fn search_games(&self, query: &str) -> Result<Vec<Game>, RemoteError> {
        let url = format!("{}/api/storesearch/", self.store_base_url);
        let body = self
            .get_text(
                &url,
                &[
                    ("term", query),
                    ("l", self.language.as_str()),
                    ("cc", self.country.as_str()),
                ],
            )
            .await
            .map_err(|e| {
                log::error!("Steam: store search failed for '{}': {}", query, e);
                e
            })?;
        let results = parse_search_response(&body)?;
        if results.is_empty() {
            log::warn!("Steam: no search results for '{}'", query);
        }
        Ok(results)
    }

    async fn game_details(&self, external_game_id: &str) -> Result<Option<GameDetails>, RemoteError> {
        let url = format!("{}/api/appdetails", self.store_base_url);
        let body = self
            .get_text(
                &url,
                &[
                    ("appids", external_game_id),
                    ("l", self.language.as_str()),
                    ("cc", self.country.as_str()),
                ],
            )
            .await?;
        let details = parse_app_details(external_game_id, &body, &self.store_page_url(external_game_id))?;
        if details.is_none() {
            log::warn!("Steam: no store data for app {}", external_game_id);
        }
        Ok(details)
    }
}

// =====================================================
// Response payloads
// =====================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Default, Deserialize)]
struct OwnedGamesBody {
    game_count: Option<u64>,
    games: Option<Vec<OwnedGameEntry>>,
}

#[derive(Debug, Deserialize)]
struct OwnedGameEntry {
    appid: u64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VanityBody {
    success: i64,
    steamid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoreSearchResponse {
    #[serde(default)]
    items: Vec<StoreSearchItem>,
}

#[derive(Debug, Deserialize)]
struct StoreSearchItem {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    item_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppDetailsEntry {
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    name: String,
    header_image: Option<String>,
}

/// Steam answers `{"response": {}}` for private libraries, which is not the same
/// as an empty library (`game_count: 0`).
pub fn parse_owned_games(external_id: &str, body: &str) -> Result<Vec<Game>, RemoteError> {
    let envelope: Envelope<OwnedGamesBody> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    let owned = envelope.response;

    match (owned.games, owned.game_count) {
        (Some(games), _) => Ok(games
            .into_iter()
            .map(|g| {
                let name = g.name.unwrap_or_else(|| format!("App {}", g.appid));
                Game::new(g.appid.to_string(), name)
            })
            .collect()),
        (None, Some(_)) => Ok(Vec::new()),
        (None, None) => Err(RemoteError::PrivateLibrary(external_id.to_string())),
    }
}

pub fn parse_vanity_response(body: &str) -> Result<Option<String>, RemoteError> {
    let envelope: Envelope<VanityBody> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    let vanity = envelope.response;
    if vanity.success == VANITY_MATCH {
        vanity
            .steamid
            .map(Some)
            .ok_or_else(|| RemoteError::Decode("match without steamid".to_string()))
    } else {
        Ok(None)
    }
}

pub fn parse_search_response(body: &str) -> Result<Vec<Game>, RemoteError> {
    let response: StoreSearchResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(response
        .items
        .into_iter()
        .filter(|item| item.item_type.as_deref().map_or(true, |t| t == "app"))
        .map(|item| Game::new(item.id.to_string(), item.name))
        .collect())
}

pub fn parse_app_details(
    external_game_id: &str,
    body: &str,
    store_url: &str,
) -> Result<Option<GameDetails>, RemoteError> {
    let mut entries: HashMap<String, AppDetailsEntry> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

    let Some(entry) = entries.remove(external_game_id) else {
        return Ok(None);
    };
    if !entry.success {
        return Ok(None);
    }
    Ok(entry.data.map(|data| GameDetails {
        external_game_id: external_game_id.to_string(),
        display_name: data.name,
        header_image: data.header_image,
        store_url: store_url.to_string(),
    }))
}
