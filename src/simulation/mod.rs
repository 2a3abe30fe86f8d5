//! Simulation - per-tick citizen work and the events it raises

pub mod events;
pub mod jobs;

pub use events::{EventLog, GameEvent};
pub use jobs::{stockpile_location, JobManager};
