//! Parsing of the ways users refer to their Steam account.

use url::Url;

/// What a user typed to identify a Steam account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteamReference {
    /// SteamID64, usable as-is
    Id(String),
    /// Custom profile name, needs a ResolveVanityURL lookup
    Vanity(String),
}

/// SteamID64 values for individual accounts all start with this prefix.
const STEAM_ID64_PREFIX: &str = "7656119";

pub fn is_steam_id64(value: &str) -> bool {
    value.len() == 17 && value.starts_with(STEAM_ID64_PREFIX) && value.chars().all(|c| c.is_ascii_digit())
}

fn is_vanity_name(value: &str) -> bool {
    (2..=32).contains(&value.len())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl SteamReference {
    /// Accepts a SteamID64, a steamcommunity.com profile URL
    /// (`/profiles/<id>` or `/id/<vanity>`, scheme optional) or a bare vanity name.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().trim_start_matches('<').trim_end_matches('>');
        if input.is_empty() {
            return None;
        }

        if is_steam_id64(input) {
            return Some(SteamReference::Id(input.to_string()));
        }

        if input.contains("steamcommunity.com") {
            return Self::parse_profile_url(input);
        }

        if is_vanity_name(input) {
            return Some(SteamReference::Vanity(input.to_string()));
        }

        None
    }

    fn parse_profile_url(input: &str) -> Option<Self> {
        let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };
        let url = Url::parse(&with_scheme).ok()?;

        let host = url.host_str()?;
        if host != "steamcommunity.com" && !host.ends_with(".steamcommunity.com") {
            return None;
        }

        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some("profiles"), Some(id)) if is_steam_id64(id) => Some(SteamReference::Id(id.to_string())),
            (Some("id"), Some(vanity)) if is_vanity_name(vanity) => {
                Some(SteamReference::Vanity(vanity.to_string()))
            }
            _ => None,
        }
    }
}
