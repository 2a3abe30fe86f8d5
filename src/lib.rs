//! Kingdom Builder - colony-sim core
//!
//! Tiered procedural world generation (world -> region -> local) and the
//! per-tick citizen job simulation that runs on the local map.

pub mod city;
pub mod core;
pub mod entity;
pub mod game;
pub mod simulation;
pub mod spatial;
pub mod world;
