//! Headless Kingdom Runner
//!
//! Starts or loads a game, puts the settlement to work, simulates for a
//! while and saves the result.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kingdom_builder::city::{BuildingType, DesignationKind};
use kingdom_builder::core::{GameConfig, GridPos, Result};
use kingdom_builder::game::GameState;
use kingdom_builder::simulation::GameEvent;
use kingdom_builder::world::Biome;

/// Half-size of the tree designation around the settlement
const DESIGNATION_RADIUS: i32 = 15;

#[derive(Parser, Debug)]
#[command(name = "kingdom")]
#[command(about = "Run the colony simulation headless")]
struct Args {
    /// World seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// In-game seconds to simulate
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// Simulation ticks per in-game second
    #[arg(long, default_value_t = 10)]
    tick_rate: u32,

    /// Name to save under when done
    #[arg(long, default_value = "headless")]
    save_name: String,

    /// Continue from this save instead of starting fresh
    #[arg(long)]
    load: Option<String>,

    /// Preferred starting biome, e.g. grassland
    #[arg(long)]
    biome: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kingdom_builder=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let mut state = match &args.load {
        Some(name) => GameState::load(config, name)?,
        None => {
            let biome = args.biome.as_deref().and_then(parse_biome);
            let mut state = GameState::new_game(config, args.seed, biome)?;
            put_settlement_to_work(&mut state);
            state
        }
    };

    if let Err(e) = state.enable_autosave() {
        tracing::warn!(error = %e, "Auto-save unavailable");
    }

    let tick_rate = args.tick_rate.max(1);
    let dt = 1.0 / tick_rate as f32;
    let ticks = (args.seconds.max(0.0) * tick_rate as f32) as u64;
    tracing::info!(ticks, dt, "Simulating");

    let mut harvested = 0u32;
    let mut lost = 0u32;
    let mut completed = Vec::new();
    for _ in 0..ticks {
        state.update(dt);
        for event in state.drain_events() {
            match event {
                GameEvent::ResourceDeposited { amount, .. } => harvested += amount,
                GameEvent::StorageFull { lost: n, .. } => lost += n,
                GameEvent::BuildingCompleted { building_type, .. } => completed.push(building_type),
                _ => {}
            }
        }
    }

    print_summary(&state, harvested, lost, &completed);
    let path = state.save(&args.save_name)?;
    println!("Saved to {}", path.display());
    Ok(())
}

/// Designate nearby trees and plan a house next to the wagon
fn put_settlement_to_work(state: &mut GameState) {
    let Some(center) = state.local_map.as_ref().map(|m| m.center()) else {
        return;
    };

    let marked = state.designate_area(
        DesignationKind::ChopTrees,
        GridPos::new(center.x - DESIGNATION_RADIUS, center.y - DESIGNATION_RADIUS),
        GridPos::new(center.x + DESIGNATION_RADIUS, center.y + DESIGNATION_RADIUS),
    );
    tracing::info!(trees = marked, "Designated trees around the settlement");

    let candidates = (3..12).flat_map(|r| {
        [
            GridPos::new(center.x + r, center.y),
            GridPos::new(center.x - r - 2, center.y),
            GridPos::new(center.x, center.y + r),
            GridPos::new(center.x, center.y - r - 2),
        ]
    });
    for pos in candidates {
        if state.place_building(BuildingType::House, pos).is_ok() {
            return;
        }
    }
    tracing::warn!("No room for a house near the settlement");
}

fn parse_biome(name: &str) -> Option<Biome> {
    let wanted = name.to_ascii_lowercase().replace([' ', '-'], "_");
    Biome::ALL.into_iter().find(|b| b.name().to_ascii_lowercase().replace(' ', "_") == wanted)
}

fn print_summary(state: &GameState, harvested: u32, lost: u32, completed: &[BuildingType]) {
    println!("=== Kingdom after {:.1}s (seed {}) ===", state.game_time, state.seed());
    if let Some(cell) = state.world_cell {
        println!("World cell: ({}, {})", cell.x, cell.y);
    }
    println!("Citizens: {}", state.citizens.len());
    for citizen in &state.citizens {
        let job = citizen
            .current_job()
            .map(|j| format!("{j:?}"))
            .unwrap_or_else(|| "idle".to_string());
        println!("  {:<20} {:?} ({})", citizen.name, citizen.state, job);
    }

    println!("Buildings:");
    for building in &state.buildings {
        println!(
            "  #{} {:<16} at ({}, {}) {:?} {:.0}/{:.0}",
            building.id.0,
            building.building_type.name(),
            building.position.x,
            building.position.y,
            building.state,
            building.construction_progress,
            building.building_type.work_required()
        );
    }

    println!(
        "Storage: {}/{}",
        state.storage_used(),
        state.total_storage_capacity()
    );
    for (kind, amount) in state.stockpile.snapshot() {
        println!("  {kind}: {amount}");
    }
    println!("Deposited: {harvested}, lost to full storage: {lost}");
    if !completed.is_empty() {
        println!("Completed: {completed:?}");
    }
}
