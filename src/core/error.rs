use thiserror::Error;

use crate::city::placement::PlacementError;

#[derive(Error, Debug)]
pub enum KingdomError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Placement rejected: {0}")]
    Placement(#[from] PlacementError),

    #[error("Save not found: {0}")]
    SaveNotFound(String),

    #[error("No active game")]
    NoActiveGame,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KingdomError>;
