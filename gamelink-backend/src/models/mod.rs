pub mod game;
pub mod linked_account;
pub mod owned_game;

pub use game::{Game, GameDetails};
pub use linked_account::LinkedAccount;
pub use owned_game::{OwnedGame, SyncReport};
