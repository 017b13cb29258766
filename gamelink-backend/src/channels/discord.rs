use crate::discord_hooks::{self, CommandContext, HookReply};
use crate::engine::LibraryEngine;
use serenity::all::{
    ActivityData, Client, Context, CreateAllowedMentions, CreateMessage, EventHandler, GatewayIntents, GuildId,
    Message, Ready, UserId,
};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tokio::sync::oneshot;

/// Discord's per-message character limit
const MAX_MESSAGE_LEN: usize = 2000;

/// Page size of the guild member listing endpoint
const MEMBER_PAGE_SIZE: u64 = 1000;

struct DiscordHandler {
    engine: Arc<LibraryEngine>,
    prefix: String,
    /// Set once the gateway reports ready
    bot_user_id: OnceLock<String>,
}

#[serenity::async_trait]
impl EventHandler for DiscordHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore messages from bots (including ourselves)
        if msg.author.bot {
            return;
        }

        if msg.webhook_id.is_some() {
            log::debug!("Discord: Ignoring webhook message from {}", msg.author.name);
            return;
        }

        // Only regular messages and replies carry commands
        if !matches!(
            msg.kind,
            serenity::all::MessageType::Regular | serenity::all::MessageType::InlineReply
        ) {
            return;
        }

        let command = match discord_hooks::commands::parse(&msg.content, &self.prefix) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                self.respond(&ctx, &msg, HookReply::channel(e.to_string())).await;
                return;
            }
        };

        let author_id = msg.author.id.to_string();
        let scope = if command.needs_scope() {
            match msg.guild_id {
                Some(guild_id) => match guild_member_ids(&ctx, guild_id).await {
                    Ok(scope) => scope,
                    Err(e) => {
                        log::error!("Discord: {}", e);
                        let reply = HookReply::channel(
                            "I couldn't read this server's member list. Is the Server Members intent enabled?",
                        );
                        self.respond(&ctx, &msg, reply).await;
                        return;
                    }
                },
                None => HashSet::from([author_id.clone()]),
            }
        } else {
            HashSet::from([author_id.clone()])
        };

        log::info!(
            "Discord: {} ({}) ran `{}`",
            msg.author.name,
            author_id,
            msg.content.trim()
        );

        let command_ctx = CommandContext {
            author_id: &author_id,
            scope: &scope,
            bot_user_id: self.bot_user_id.get().map(String::as_str),
            prefix: &self.prefix,
        };
        let reply = discord_hooks::execute(&self.engine, command, &command_ctx).await;
        self.respond(&ctx, &msg, reply).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("Discord: Bot connected as {}", ready.user.name);
        let _ = self.bot_user_id.set(ready.user.id.to_string());
        ctx.set_activity(Some(ActivityData::watching("all the games")));
    }
}

impl DiscordHandler {
    async fn respond(&self, ctx: &Context, msg: &Message, reply: HookReply) {
        if let Some(direct) = reply.direct {
            if let Err(e) = msg
                .author
                .direct_message(ctx, CreateMessage::new().content(direct))
                .await
            {
                log::warn!("Discord: Failed to DM {}: {}", msg.author.name, e);
            }
        }

        let pings = ping_list(&reply.pings);
        for chunk in split_message(&reply.channel, MAX_MESSAGE_LEN) {
            // Only the listed users are pinged; @everyone, @here and roles never are
            let message = CreateMessage::new()
                .content(chunk)
                .allowed_mentions(CreateAllowedMentions::new().users(pings.clone()));
            if let Err(e) = msg.channel_id.send_message(&ctx.http, message).await {
                log::error!("Discord: Failed to send reply: {}", e);
                break;
            }
        }
    }
}

/// Ids of all human members of a guild, paged through the member listing.
async fn guild_member_ids(ctx: &Context, guild_id: GuildId) -> Result<HashSet<String>, String> {
    let mut ids = HashSet::new();
    let mut after: Option<UserId> = None;

    loop {
        let page = guild_id
            .members(&ctx.http, Some(MEMBER_PAGE_SIZE), after)
            .await
            .map_err(|e| format!("Failed to list members of guild {}: {}", guild_id, e))?;

        let full_page = page.len() as u64 == MEMBER_PAGE_SIZE;
        after = page.last().map(|member| member.user.id);
        ids.extend(
            page.into_iter()
                .filter(|member| !member.user.bot)
                .map(|member| member.user.id.to_string()),
        );

        if !full_page || after.is_none() {
            break;
        }
    }

    log::debug!("Discord: Guild {} has {} human members", guild_id, ids.len());
    Ok(ids)
}

/// Parse chat user ids into Discord user ids, skipping anything malformed
fn ping_list(chat_user_ids: &[String]) -> Vec<UserId> {
    chat_user_ids
        .iter()
        .filter_map(|id| id.parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(UserId::new)
        .collect()
}

/// Largest byte index <= `index` that falls on a char boundary
fn char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Split a message into chunks respecting Discord's character limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if current.len() + line.len() + 1 > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            // A single line over the limit is cut on char boundaries
            let mut remaining = line;
            while remaining.len() > max_len {
                let cut = match char_boundary(remaining, max_len) {
                    0 => remaining.chars().next().map_or(remaining.len(), char::len_utf8),
                    cut => cut,
                };
                chunks.push(remaining[..cut].to_string());
                remaining = &remaining[cut..];
            }
            current = remaining.to_string();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Start the Discord bot and run until the client stops or shutdown is signalled
pub async fn start_discord_listener(
    bot_token: String,
    engine: Arc<LibraryEngine>,
    prefix: String,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), String> {
    log::info!("Starting Discord listener (command prefix '{}')", prefix);

    // Message content to read commands, guild members to scope player queries
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let handler = DiscordHandler {
        engine,
        prefix,
        bot_user_id: OnceLock::new(),
    };

    let mut client = Client::builder(&bot_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        _ = &mut shutdown_rx => {
            log::info!("Discord listener received shutdown signal");
            shard_manager.shutdown_all().await;
        }
        result = client.start() => {
            if let Err(e) = result {
                let error = format!("Discord client error: {}", e);
                log::error!("{}", error);
                return Err(error);
            }
            log::info!("Discord listener stopped");
        }
    }

    Ok(())
}
