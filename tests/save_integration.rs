//! Integration tests for saving and loading sessions
//!
//! Every test writes into its own temporary save directory:
//! - Manual save then load restores the session
//! - Save listing and deletion
//! - Background auto-saves with pruning

use kingdom_builder::city::BuildingType;
use kingdom_builder::core::{GameConfig, GridPos, KingdomError};
use kingdom_builder::game::{GameState, SaveSystem, SAVE_VERSION};
use kingdom_builder::simulation::GameEvent;

fn config_in(dir: &std::path::Path) -> GameConfig {
    let mut config = GameConfig::default();
    config.generation.world_width = 30;
    config.generation.world_height = 30;
    config.generation.region_width = 20;
    config.generation.region_height = 20;
    config.generation.local_width = 40;
    config.generation.local_height = 40;
    config.settlement.starting_citizens = 3;
    config.saves.save_dir = dir.to_path_buf();
    config
}

fn citizen_summary(state: &GameState) -> Vec<(u32, String, u32, u32)> {
    state
        .citizens
        .iter()
        .map(|c| (c.id.0, c.name.clone(), c.position.x.to_bits(), c.position.y.to_bits()))
        .collect()
}

// ============================================================================
// Manual Saves
// ============================================================================

#[test]
fn test_save_and_load_restores_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let mut state = GameState::new_game(config.clone(), Some(12345), None).unwrap();
    let center = state.local_map.as_ref().unwrap().center();
    state
        .place_building(BuildingType::House, GridPos::new(center.x + 3, center.y))
        .unwrap();
    for _ in 0..50 {
        state.update(0.1);
    }

    let path = state.save("slot_one").unwrap();
    assert!(path.exists());
    assert!(state
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::GameSaved { save_name } if save_name == "slot_one")));

    let loaded = GameState::load(config, "slot_one").unwrap();
    assert_eq!(loaded.seed(), 12345);
    assert_eq!(loaded.world_map, state.world_map);
    assert_eq!(loaded.region_map, state.region_map);
    assert_eq!(loaded.local_map, state.local_map);
    assert_eq!(loaded.world_cell, state.world_cell);
    assert_eq!(loaded.buildings, state.buildings);
    assert_eq!(loaded.stockpile, state.stockpile);
    assert_eq!(loaded.designations, state.designations);
    assert_eq!(loaded.game_time.to_bits(), state.game_time.to_bits());
    assert_eq!(citizen_summary(&loaded), citizen_summary(&state));
    assert!(loaded.citizens.iter().all(|c| c.path.is_none()));
}

#[test]
fn test_loaded_session_keeps_running() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let mut state = GameState::new_game(config.clone(), Some(8), None).unwrap();
    let center = state.local_map.as_ref().unwrap().center();
    let house = state
        .place_building(BuildingType::House, GridPos::new(center.x + 3, center.y))
        .unwrap();
    for _ in 0..20 {
        state.update(0.1);
    }
    state.save("midway").unwrap();

    let mut loaded = GameState::load(config, "midway").unwrap();
    for _ in 0..3000 {
        loaded.update(0.1);
        if loaded.building(house).map(|b| b.is_complete()).unwrap_or(false) {
            break;
        }
    }
    assert!(loaded.building(house).unwrap().is_complete());

    // Fresh ids never collide with saved ones
    let recruit = loaded.spawn_citizen(center.to_vec2());
    assert!(state.citizens.iter().all(|c| c.id != recruit));
}

#[test]
fn test_save_file_carries_version_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = GameState::new_game(config_in(dir.path()), Some(3), None).unwrap();
    let path = state.save("envelope").unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["version"], SAVE_VERSION);
    assert_eq!(raw["save_name"], "envelope");
    assert!(raw["timestamp"].is_string());
    assert_eq!(raw["world"]["seed"], 3);
}

#[test]
fn test_loading_missing_save_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = GameState::load(config_in(dir.path()), "nowhere");
    assert!(matches!(result, Err(KingdomError::SaveNotFound(_))));
}

#[test]
fn test_inconsistent_grid_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut state = GameState::new_game(config.clone(), Some(13), None).unwrap();
    let path = state.save("damaged").unwrap();

    let mut raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    raw["world"]["local_map"]["tiles"]["data"] = serde_json::json!([]);
    std::fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    let result = GameState::load(config, "damaged");
    assert!(matches!(result, Err(KingdomError::SerdeError(_))));
}

#[test]
fn test_list_and_delete_saves() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = GameState::new_game(config_in(dir.path()), Some(21), None).unwrap();
    state.save("first").unwrap();
    state.save("second").unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

    let system = SaveSystem::new(dir.path());
    let mut names: Vec<String> = system.list_saves().unwrap().into_iter().map(|s| s.name).collect();
    names.sort();
    assert_eq!(names, vec!["first".to_string(), "second".to_string()]);

    assert!(system.delete_save("first").unwrap());
    assert!(!system.delete_save("first").unwrap());
    assert!(!system.save_exists("first"));
    assert!(system.save_exists("second"));
}

// ============================================================================
// Auto-Save
// ============================================================================

#[test]
fn test_autosave_written_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.saves.autosave_interval = 1.0;

    let mut state = GameState::new_game(config, Some(77), None).unwrap();
    state.enable_autosave().unwrap();
    for _ in 0..3 {
        state.update(0.6);
    }
    // Dropping the session flushes the worker
    drop(state);

    let saves = SaveSystem::new(dir.path()).list_saves().unwrap();
    assert!(!saves.is_empty());
    assert!(saves.iter().all(|s| s.name.starts_with("autosave_")));
    assert_eq!(saves[0].version, SAVE_VERSION);
}

#[test]
fn test_old_autosaves_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let state = GameState::new_game(config_in(dir.path()), Some(4), None).unwrap();
    let system = SaveSystem::new(dir.path());
    let world = state.to_saved();

    for i in 0..4 {
        system.save(&format!("autosave_2020010{i}_000000"), &world).unwrap();
    }
    system.save("keeper", &world).unwrap();

    // All written within the same second, so only the count is checked
    assert_eq!(system.clean_old_auto_saves(2).unwrap(), 2);
    let remaining = system.list_saves().unwrap();
    assert_eq!(remaining.iter().filter(|s| s.name.starts_with("autosave_")).count(), 2);
    assert!(system.save_exists("keeper"));
}
