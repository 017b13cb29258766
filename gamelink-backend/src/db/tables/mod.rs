//! Table modules - each extends Database with methods for one table.

mod linked_accounts; // linked_accounts (Discord user -> Steam account)
mod owned_games;     // owned_games (per-user library + installed flag)
