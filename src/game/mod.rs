//! Game session - orchestration and persistence

pub mod save;
pub mod state;

pub use save::{AutoSaver, SaveData, SaveInfo, SaveSystem, SAVE_VERSION};
pub use state::{Cameras, GameState, SavedWorld, ViewTier};
