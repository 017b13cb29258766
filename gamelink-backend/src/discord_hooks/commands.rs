//! Text command parsing. Raw message text becomes a typed [`Command`] here,
//! before anything reaches the engine.

/// Flag that restricts player queries to users with the game installed
const INSTALLED_FLAG: &str = "--installed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Link { reference: String },
    Sync,
    SearchGame { query: String },
    Installed { game: String },
    Uninstalled { game: String },
    MyGames { installed_only: bool },
    Players { game: String, installed_only: bool },
    SendMessage { game: String, message: String, installed_only: bool },
    Invite,
    Help,
}

impl Command {
    /// Whether the command needs the set of users in the current server.
    pub fn needs_scope(&self) -> bool {
        matches!(self, Command::Players { .. } | Command::SendMessage { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command `{prefix}{name}`. Try `{prefix}help`.")]
    Unknown { prefix: String, name: String },

    #[error("Usage: `{prefix}{usage}`")]
    MissingArgument { prefix: String, usage: &'static str },
}

fn usage(name: &str) -> &'static str {
    match name {
        "link" => "link <steam id | profile url | custom url name>",
        "searchgame" => "searchgame <game name>",
        "installed" => "installed <game name | #app id>",
        "uninstalled" => "uninstalled <game name | #app id>",
        "players" => "players <game name | #app id> [--installed]",
        "sendmessage" => "sendmessage <game name | #app id> [--installed] | <message>",
        _ => "help",
    }
}

/// Remove the `--installed` flag from an argument string.
fn take_installed_flag(args: &str) -> (String, bool) {
    let mut found = false;
    let kept: Vec<&str> = args
        .split_whitespace()
        .filter(|token| {
            if token.eq_ignore_ascii_case(INSTALLED_FLAG) {
                found = true;
                false
            } else {
                true
            }
        })
        .collect();
    (kept.join(" "), found)
}

/// Parse a message. `Ok(None)` means the message isn't addressed to the bot.
pub fn parse(content: &str, prefix: &str) -> Result<Option<Command>, CommandError> {
    let Some(body) = content.trim().strip_prefix(prefix) else {
        return Ok(None);
    };

    let body = body.trim_start();
    let (name, args) = match body.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (body, ""),
    };
    let name = name.to_lowercase();
    if name.is_empty() {
        return Ok(None);
    }

    let required = |value: &str| -> Result<String, CommandError> {
        if value.is_empty() {
            Err(CommandError::MissingArgument {
                prefix: prefix.to_string(),
                usage: usage(&name),
            })
        } else {
            Ok(value.to_string())
        }
    };

    let command = match name.as_str() {
        "link" => Command::Link {
            reference: required(args)?,
        },
        "sync" => Command::Sync,
        "searchgame" | "search" => Command::SearchGame {
            query: required(args)?,
        },
        "installed" => Command::Installed {
            game: required(args)?,
        },
        "uninstalled" => Command::Uninstalled {
            game: required(args)?,
        },
        "mygames" => Command::MyGames {
            installed_only: take_installed_flag(args).1,
        },
        "players" => {
            let (game, installed_only) = take_installed_flag(args);
            Command::Players {
                game: required(&game)?,
                installed_only,
            }
        }
        "sendmessage" => {
            // The flag belongs to the game part; the message is sent as typed
            let (game, message) = args.split_once('|').unwrap_or((args, ""));
            let (game, installed_only) = take_installed_flag(game);
            Command::SendMessage {
                game: required(&game)?,
                message: required(message.trim())?,
                installed_only,
            }
        }
        "invite" => Command::Invite,
        "help" => Command::Help,
        _ => {
            return Err(CommandError::Unknown {
                prefix: prefix.to_string(),
                name: name.clone(),
            })
        }
    };

    Ok(Some(command))
}

pub fn help_text(prefix: &str) -> String {
    [
        "link", "sync", "searchgame", "installed", "uninstalled", "players", "sendmessage",
    ]
    .iter()
    .map(|name| format!("`{}{}`", prefix, usage(name)))
    .chain([
        format!("`{}mygames [--installed]`", prefix),
        format!("`{}invite`", prefix),
    ])
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_other_messages() {
        assert_eq!(parse("hello there", "!"), Ok(None));
        assert_eq!(parse("!", "!"), Ok(None));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("!sync", "!"), Ok(Some(Command::Sync)));
        assert_eq!(parse("  !HELP ", "!"), Ok(Some(Command::Help)));
        assert_eq!(
            parse("!link https://steamcommunity.com/id/gaben", "!"),
            Ok(Some(Command::Link {
                reference: "https://steamcommunity.com/id/gaben".to_string()
            }))
        );
        assert_eq!(
            parse("!installed   Half-Life 2 ", "!"),
            Ok(Some(Command::Installed {
                game: "Half-Life 2".to_string()
            }))
        );
    }

    #[test]
    fn test_installed_flag() {
        assert_eq!(
            parse("!players Portal 2 --installed", "!"),
            Ok(Some(Command::Players {
                game: "Portal 2".to_string(),
                installed_only: true
            }))
        );
        assert_eq!(
            parse("!mygames", "!"),
            Ok(Some(Command::MyGames { installed_only: false }))
        );
    }

    #[test]
    fn test_sendmessage_split() {
        assert_eq!(
            parse("!sendmessage --installed Portal | anyone up for co-op? | now", "!"),
            Ok(Some(Command::SendMessage {
                game: "Portal".to_string(),
                message: "anyone up for co-op? | now".to_string(),
                installed_only: true
            }))
        );
        assert_eq!(
            parse("!sendmessage Portal | line one\nline two  -- try the --installed flag", "!"),
            Ok(Some(Command::SendMessage {
                game: "Portal".to_string(),
                message: "line one\nline two  -- try the --installed flag".to_string(),
                installed_only: false
            }))
        );
        assert!(matches!(
            parse("!sendmessage Portal", "!"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_missing_and_unknown() {
        assert_eq!(
            parse("!link", "!"),
            Err(CommandError::MissingArgument {
                prefix: "!".to_string(),
                usage: "link <steam id | profile url | custom url name>"
            })
        );
        assert!(matches!(parse("!dance", "!"), Err(CommandError::Unknown { .. })));
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(parse("gl!sync", "gl!"), Ok(Some(Command::Sync)));
        assert_eq!(parse("!sync", "gl!"), Ok(None));
        assert!(needs_scope_for("gl!players x", "gl!"));
    }

    fn needs_scope_for(content: &str, prefix: &str) -> bool {
        parse(content, prefix).unwrap().unwrap().needs_scope()
    }
}
