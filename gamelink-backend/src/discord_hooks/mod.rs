//! Discord Hooks - command handling for the game-library bot
//!
//! This module provides:
//! - Parsing of prefixed text commands into typed [`Command`]s
//! - Execution of each command against exactly one engine operation
//! - Plain-text rendering of results and of every engine error kind
//!
//! The transport (serenity event loop, message splitting, member paging)
//! lives in `channels::discord`.

pub mod commands;

use std::collections::HashSet;

use crate::engine::remote::RemoteError;
use crate::engine::{EngineError, LibraryEngine};
use crate::models::Game;

pub use commands::Command;

/// Max games listed by `mygames` before the list is cut short
const MAX_LISTED_GAMES: usize = 100;

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReply {
    /// Reply posted in the channel the command came from
    pub channel: String,
    /// Message sent to the author in a DM, if any
    pub direct: Option<String>,
    /// Users the channel reply may ping. Nothing else in the text
    /// (`@everyone`, roles, other users) is turned into a mention.
    pub pings: Vec<String>,
}

impl HookReply {
    pub fn channel(text: impl Into<String>) -> Self {
        Self {
            channel: text.into(),
            direct: None,
            pings: Vec::new(),
        }
    }
}

/// Who issued a command and where
pub struct CommandContext<'a> {
    pub author_id: &'a str,
    /// Chat users visible where the command was issued
    pub scope: &'a HashSet<String>,
    /// The bot's own user id, used for the invite link
    pub bot_user_id: Option<&'a str>,
    pub prefix: &'a str,
}

pub fn invite_url(bot_user_id: &str) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={}&scope=bot&permissions=0",
        bot_user_id
    )
}

fn mention(chat_user_id: &str) -> String {
    format!("<@{}>", chat_user_id)
}

/// Sorted so replies are stable
fn sorted_users(users: HashSet<String>) -> Vec<String> {
    let mut users: Vec<String> = users.into_iter().collect();
    users.sort();
    users
}

fn mentions(users: &[String]) -> String {
    users.iter().map(|u| mention(u)).collect::<Vec<_>>().join(" ")
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

fn candidate_lines(candidates: &[Game]) -> String {
    candidates
        .iter()
        .map(|g| format!("- {} (`#{}`)", g.display_name, g.external_game_id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render an engine error as a reply. Internal failures are logged here.
pub fn describe_error(err: &EngineError, prefix: &str) -> String {
    match err {
        EngineError::NotLinked(_) => format!(
            "You haven't linked a Steam account yet. Use `{}link <steam id | profile url>` first.",
            prefix
        ),
        EngineError::RemoteCatalog(RemoteError::PrivateLibrary(_)) => {
            "Steam didn't return your games. Make sure your profile's game details are public, then try again."
                .to_string()
        }
        EngineError::RemoteCatalog(e) => {
            log::warn!("[DISCORD_HOOKS] Steam library request failed: {}", e);
            format!("Couldn't fetch your library from Steam ({}). Nothing was changed.", e)
        }
        EngineError::RemoteSearch(e) => {
            log::warn!("[DISCORD_HOOKS] Steam store request failed: {}", e);
            format!("The Steam store search failed ({}). Try again later.", e)
        }
        EngineError::NotOwned { .. } => format!(
            "That game isn't in your synced library. Run `{}sync` if you bought it recently.",
            prefix
        ),
        EngineError::NotFound(query) => format!("No game matching '{}' found.", query),
        EngineError::Ambiguous { query, candidates } => format!(
            "'{}' matches several games. Be more specific or use the id:\n{}",
            query,
            candidate_lines(candidates)
        ),
        EngineError::UnknownIdentity(reference) => {
            format!("Couldn't find a Steam profile for '{}'.", reference)
        }
        EngineError::IdentityLookup(e) => format!(
            "Couldn't look up that Steam profile ({}). Try your 17-digit Steam ID or a `/profiles/` URL instead.",
            e
        ),
        EngineError::Storage(e) => {
            log::error!("[DISCORD_HOOKS] Storage error: {}", e);
            "Something went wrong while saving your data. Please try again later.".to_string()
        }
    }
}

/// Execute a parsed command. Every outcome, including failures, becomes a reply.
pub async fn execute(engine: &LibraryEngine, command: Command, ctx: &CommandContext<'_>) -> HookReply {
    log::debug!("[DISCORD_HOOKS] {} -> {:?}", ctx.author_id, command);
    match run(engine, command, ctx).await {
        Ok(reply) => reply,
        Err(e) => HookReply::channel(describe_error(&e, ctx.prefix)),
    }
}

async fn run(engine: &LibraryEngine, command: Command, ctx: &CommandContext<'_>) -> Result<HookReply, EngineError> {
    let prefix = ctx.prefix;
    let reply = match command {
        Command::Link { reference } => {
            let external_id = engine.resolve_identity(&reference).await?;
            let previous = engine.resolve_account(ctx.author_id)?;
            let account = engine.link(ctx.author_id, &external_id).await?;
            let verb = match previous {
                Some(previous) if previous.external_id != account.external_id => "Re-linked",
                _ => "Linked",
            };
            HookReply::channel(format!(
                "{} your Discord account to Steam ID {}. Run `{}sync` to import your games.",
                verb, account.external_id, prefix
            ))
        }
        Command::Sync => {
            let report = engine.sync(ctx.author_id).await?;
            HookReply::channel(format!(
                "Library synced: {} added, {} in your library.",
                plural(report.added, "new game", "new games"),
                plural(report.total, "game", "games"),
            ))
        }
        Command::SearchGame { query } => {
            let results = engine.search(&query).await?;
            let Some(first) = results.first() else {
                return Ok(HookReply::channel(format!("No game information found for '{}'.", query)));
            };
            let mut text = match engine.game_details(&first.external_game_id).await {
                Ok(Some(details)) => format!(
                    "**{}**\nApp ID: {}\nSteam Store Page: {}",
                    details.display_name, details.external_game_id, details.store_url
                ),
                Ok(None) => format!("**{}**\nApp ID: {}", first.display_name, first.external_game_id),
                Err(e) => {
                    log::warn!("[DISCORD_HOOKS] Details for {} unavailable: {}", first.external_game_id, e);
                    format!("**{}**\nApp ID: {}", first.display_name, first.external_game_id)
                }
            };
            if results.len() > 1 {
                text.push_str("\nOther matches:\n");
                text.push_str(&candidate_lines(&results[1..]));
            }
            HookReply::channel(text)
        }
        Command::Installed { game } => set_installed(engine, ctx, &game, true).await?,
        Command::Uninstalled { game } => set_installed(engine, ctx, &game, false).await?,
        Command::MyGames { installed_only } => {
            let games = if installed_only {
                engine.list_installed(ctx.author_id)?
            } else {
                engine.list_owned(ctx.author_id)?
            };
            if games.is_empty() {
                let hint = if installed_only {
                    format!("Mark games with `{}installed <game>`.", prefix)
                } else {
                    format!("Link your account and run `{}sync`.", prefix)
                };
                return Ok(HookReply::channel(format!("No games stored. {}", hint)));
            }
            let mut lines: Vec<String> = games
                .iter()
                .take(MAX_LISTED_GAMES)
                .map(|g| {
                    if g.installed && !installed_only {
                        format!("- {} (installed)", g.display_name)
                    } else {
                        format!("- {}", g.display_name)
                    }
                })
                .collect();
            if games.len() > MAX_LISTED_GAMES {
                lines.push(format!("...and {} more", games.len() - MAX_LISTED_GAMES));
            }
            let heading = if installed_only {
                format!("You have {} installed:", plural(games.len(), "game", "games"))
            } else {
                format!("You own {}:", plural(games.len(), "game", "games"))
            };
            HookReply::channel(format!("{}\n{}", heading, lines.join("\n")))
        }
        Command::Players { game, installed_only } => {
            let game = engine.resolve_catalog(&game)?;
            let players = engine.recipients_for_broadcast(&game.external_game_id, ctx.scope, installed_only)?;
            let (found, none) = if installed_only {
                (format!("Players with {} installed", game.display_name), "has it installed")
            } else {
                (format!("Players who own {}", game.display_name), "owns it")
            };
            if players.is_empty() {
                HookReply::channel(format!("{}: nobody here {}.", found, none))
            } else {
                let players = sorted_users(players);
                HookReply::channel(format!("{} ({}): {}", found, players.len(), mentions(&players)))
            }
        }
        Command::SendMessage {
            game,
            message,
            installed_only,
        } => {
            let game = engine.resolve_catalog(&game)?;
            let recipients = engine.recipients_for_broadcast(&game.external_game_id, ctx.scope, installed_only)?;
            if recipients.is_empty() {
                HookReply::channel(format!("Nobody here to notify about {}.", game.display_name))
            } else {
                log::info!(
                    "[DISCORD_HOOKS] {} broadcast about {} to {} users",
                    ctx.author_id,
                    game.external_game_id,
                    recipients.len()
                );
                let recipients = sorted_users(recipients);
                HookReply {
                    channel: format!(
                        "{}\n{} ({}): {}",
                        mentions(&recipients),
                        mention(ctx.author_id),
                        game.display_name,
                        message
                    ),
                    direct: None,
                    pings: recipients,
                }
            }
        }
        Command::Invite => match ctx.bot_user_id {
            Some(bot_id) => HookReply {
                channel: "I've sent you a DM with the invite link.".to_string(),
                direct: Some(format!("Invite link for the bot: {}", invite_url(bot_id))),
                pings: Vec::new(),
            },
            None => HookReply::channel("The invite link isn't available yet, try again in a moment."),
        },
        Command::Help => HookReply::channel(format!("Commands:\n{}", commands::help_text(prefix))),
    };
    Ok(reply)
}

async fn set_installed(
    engine: &LibraryEngine,
    ctx: &CommandContext<'_>,
    game: &str,
    installed: bool,
) -> Result<HookReply, EngineError> {
    let game = engine.resolve_owned(ctx.author_id, game)?;
    engine
        .set_installed(ctx.author_id, &game.external_game_id, installed)
        .await?;
    let state = if installed { "installed" } else { "not installed" };
    Ok(HookReply::channel(format!("Marked {} as {}.", game.display_name, state)))
}
