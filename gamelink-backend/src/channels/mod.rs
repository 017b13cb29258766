pub mod discord;

pub use discord::start_discord_listener;
