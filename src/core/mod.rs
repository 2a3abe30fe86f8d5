pub mod config;
pub mod error;
pub mod types;

pub use config::GameConfig;
pub use error::{KingdomError, Result};
pub use types::{BuildingId, CitizenId, GridPos, ResourceKind, ResourceNodeId, Vec2};
