pub mod steam_client;
pub mod steam_id;
