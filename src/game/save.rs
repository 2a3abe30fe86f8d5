//! Save files and background auto-saving
//!
//! Saves are pretty-printed JSON wrapped in a versioned envelope. A version
//! mismatch is logged and loaded best-effort; missing fields take defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::core::error::{KingdomError, Result};
use crate::game::state::SavedWorld;

pub const SAVE_VERSION: &str = "1.0";
pub const AUTOSAVE_PREFIX: &str = "autosave_";
const SAVE_EXTENSION: &str = "json";

/// On-disk envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    pub save_name: String,
    pub timestamp: DateTime<Utc>,
    pub world: SavedWorld,
}

/// Envelope fields only, for listing without reading the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveInfo {
    #[serde(rename = "save_name")]
    pub name: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SaveSystem {
    save_dir: PathBuf,
}

impl SaveSystem {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    fn path_for(&self, save_name: &str) -> PathBuf {
        self.save_dir.join(format!("{save_name}.{SAVE_EXTENSION}"))
    }

    pub fn save(&self, save_name: &str, world: &SavedWorld) -> Result<PathBuf> {
        fs::create_dir_all(&self.save_dir)?;
        let data = SaveData {
            version: SAVE_VERSION.to_string(),
            save_name: save_name.to_string(),
            timestamp: Utc::now(),
            world: world.clone(),
        };
        let path = self.path_for(save_name);
        let json = serde_json::to_string_pretty(&data)?;
        fs::write(&path, json).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write save");
            e
        })?;
        info!(path = %path.display(), "Game saved");
        Ok(path)
    }

    pub fn load(&self, save_name: &str) -> Result<SavedWorld> {
        let path = self.path_for(save_name);
        if !path.exists() {
            error!(save = save_name, "Save file not found");
            return Err(KingdomError::SaveNotFound(save_name.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let data: SaveData = serde_json::from_str(&content).map_err(|e| {
            error!(path = %path.display(), error = %e, "Corrupt save file");
            e
        })?;
        if data.version != SAVE_VERSION {
            warn!(found = %data.version, expected = SAVE_VERSION, "Save version mismatch, loading anyway");
        }
        info!(path = %path.display(), saved_at = %data.timestamp, "Game loaded");
        Ok(data.world)
    }

    /// Every readable save, newest first
    pub fn list_saves(&self) -> Result<Vec<SaveInfo>> {
        if !self.save_dir.exists() {
            return Ok(Vec::new());
        }

        let mut saves = Vec::new();
        for entry in fs::read_dir(&self.save_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(KingdomError::from)
                .and_then(|s| serde_json::from_str::<SaveInfo>(&s).map_err(KingdomError::from));
            match parsed {
                Ok(mut info) => {
                    info.file = path;
                    saves.push(info);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Could not read save file"),
            }
        }

        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(saves)
    }

    /// Returns false if there was nothing to delete
    pub fn delete_save(&self, save_name: &str) -> Result<bool> {
        let path = self.path_for(save_name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!(path = %path.display(), "Deleted save");
        Ok(true)
    }

    pub fn save_exists(&self, save_name: &str) -> bool {
        self.path_for(save_name).exists()
    }

    /// Save under a timestamped `autosave_YYYYmmdd_HHMMSS` name
    pub fn auto_save(&self, world: &SavedWorld) -> Result<String> {
        let name = format!("{AUTOSAVE_PREFIX}{}", Utc::now().format("%Y%m%d_%H%M%S"));
        self.save(&name, world)?;
        Ok(name)
    }

    /// Keep only the newest `keep` auto-saves; returns how many were removed
    pub fn clean_old_auto_saves(&self, keep: usize) -> Result<usize> {
        let autosaves: Vec<SaveInfo> = self
            .list_saves()?
            .into_iter()
            .filter(|s| s.name.starts_with(AUTOSAVE_PREFIX))
            .collect();

        let mut removed = 0;
        for old in autosaves.iter().skip(keep) {
            if self.delete_save(&old.name)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Writes auto-saves on a worker thread so the tick never waits on disk
#[derive(Debug)]
pub struct AutoSaver {
    sender: Option<mpsc::UnboundedSender<Box<SavedWorld>>>,
    worker: Option<JoinHandle<()>>,
}

impl AutoSaver {
    pub fn spawn(system: SaveSystem, keep: usize) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Box<SavedWorld>>();
        let worker = std::thread::Builder::new()
            .name("autosave".into())
            .spawn(move || {
                while let Some(world) = receiver.blocking_recv() {
                    match system.auto_save(&world) {
                        Ok(name) => {
                            info!(save = %name, "Auto-saved");
                            if let Err(e) = system.clean_old_auto_saves(keep) {
                                warn!(error = %e, "Failed to prune old auto-saves");
                            }
                        }
                        Err(e) => error!(error = %e, "Auto-save failed"),
                    }
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a snapshot; false if the worker has stopped
    pub fn request(&self, world: SavedWorld) -> bool {
        match &self.sender {
            Some(sender) => sender.send(Box::new(world)).is_ok(),
            None => false,
        }
    }

    /// Finish queued saves and stop the worker
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Auto-save worker panicked");
            }
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn world(seed: u64) -> SavedWorld {
        SavedWorld {
            seed,
            game_time: 42.5,
            ..SavedWorld::default()
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let system = SaveSystem::new(dir.path());

        system.save("first", &world(7)).unwrap();
        assert!(system.save_exists("first"));

        let loaded = system.load("first").unwrap();
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.game_time, 42.5);
    }

    #[test]
    fn test_missing_save() {
        let dir = TempDir::new().unwrap();
        let system = SaveSystem::new(dir.path());
        assert!(matches!(system.load("nope"), Err(KingdomError::SaveNotFound(_))));
        assert!(!system.delete_save("nope").unwrap());
    }

    #[test]
    fn test_version_mismatch_loads() {
        let dir = TempDir::new().unwrap();
        let system = SaveSystem::new(dir.path());
        let json = r#"{"version":"0.9","save_name":"old","timestamp":"2024-01-01T00:00:00Z","world":{"seed":99}}"#;
        fs::write(dir.path().join("old.json"), json).unwrap();

        let loaded = system.load("old").unwrap();
        assert_eq!(loaded.seed, 99);
        assert!(loaded.citizens.is_empty());
    }

    #[test]
    fn test_corrupt_save_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let system = SaveSystem::new(dir.path());
        assert!(matches!(system.load("bad"), Err(KingdomError::SerdeError(_))));
        // Unreadable files are skipped when listing
        assert!(system.list_saves().unwrap().is_empty());
    }

    #[test]
    fn test_list_newest_first_and_delete() {
        let dir = TempDir::new().unwrap();
        let system = SaveSystem::new(dir.path());
        let older = r#"{"version":"1.0","save_name":"a","timestamp":"2024-01-01T00:00:00Z","world":{}}"#;
        let newer = r#"{"version":"1.0","save_name":"b","timestamp":"2025-06-01T00:00:00Z","world":{}}"#;
        fs::write(dir.path().join("a.json"), older).unwrap();
        fs::write(dir.path().join("b.json"), newer).unwrap();

        let saves = system.list_saves().unwrap();
        let names: Vec<&str> = saves.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        assert!(system.delete_save("a").unwrap());
        assert_eq!(system.list_saves().unwrap().len(), 1);
    }

    #[test]
    fn test_clean_old_auto_saves() {
        let dir = TempDir::new().unwrap();
        let system = SaveSystem::new(dir.path());
        for day in 1..=4 {
            let json = format!(
                r#"{{"version":"1.0","save_name":"autosave_{day}","timestamp":"2024-01-0{day}T00:00:00Z","world":{{}}}}"#
            );
            fs::write(dir.path().join(format!("autosave_{day}.json")), json).unwrap();
        }
        system.save("manual", &world(1)).unwrap();

        assert_eq!(system.clean_old_auto_saves(2).unwrap(), 2);
        assert!(system.save_exists("autosave_4"));
        assert!(system.save_exists("autosave_3"));
        assert!(!system.save_exists("autosave_1"));
        assert!(system.save_exists("manual"));
    }

    #[test]
    fn test_auto_saver_writes_in_background() {
        let dir = TempDir::new().unwrap();
        let system = SaveSystem::new(dir.path());
        let saver = AutoSaver::spawn(system.clone(), 5).unwrap();

        assert!(saver.request(world(3)));
        saver.shutdown();

        let saves = system.list_saves().unwrap();
        assert_eq!(saves.len(), 1);
        assert!(saves[0].name.starts_with(AUTOSAVE_PREFIX));
    }
}
