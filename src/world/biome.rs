//! Biome catalog and climate classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Climate biome of a world tile
///
/// Declaration order is the classification tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    TemperateForest,
    Grassland,
    BorealForest,
    Tundra,
    Desert,
    TropicalRainforest,
    AridShrubland,
    Wetland,
}

/// Static per-biome properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeProperties {
    pub name: &'static str,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub min_rainfall: f64,
    pub max_rainfall: f64,
    pub tree_density: f64,
    pub rock_density: f64,
    pub fertility: f64,
    pub description: &'static str,
}

impl Biome {
    pub const ALL: [Biome; 8] = [
        Biome::TemperateForest,
        Biome::Grassland,
        Biome::BorealForest,
        Biome::Tundra,
        Biome::Desert,
        Biome::TropicalRainforest,
        Biome::AridShrubland,
        Biome::Wetland,
    ];

    pub fn properties(&self) -> BiomeProperties {
        match self {
            Biome::TemperateForest => BiomeProperties {
                name: "Temperate Forest",
                min_temperature: -0.2,
                max_temperature: 0.6,
                min_rainfall: 0.4,
                max_rainfall: 0.8,
                tree_density: 0.4,
                rock_density: 0.1,
                fertility: 0.8,
                description: "A pleasant, temperate region with abundant trees and fertile soil.",
            },
            Biome::Grassland => BiomeProperties {
                name: "Grassland",
                min_temperature: 0.0,
                max_temperature: 0.7,
                min_rainfall: 0.3,
                max_rainfall: 0.6,
                tree_density: 0.1,
                rock_density: 0.05,
                fertility: 0.9,
                description: "Wide open plains with tall grass. Excellent for farming.",
            },
            Biome::BorealForest => BiomeProperties {
                name: "Boreal Forest",
                min_temperature: -0.6,
                max_temperature: 0.2,
                min_rainfall: 0.4,
                max_rainfall: 0.7,
                tree_density: 0.5,
                rock_density: 0.15,
                fertility: 0.4,
                description: "A cold forest of hardy evergreens.",
            },
            Biome::Tundra => BiomeProperties {
                name: "Tundra",
                min_temperature: -0.8,
                max_temperature: -0.2,
                min_rainfall: 0.2,
                max_rainfall: 0.5,
                tree_density: 0.05,
                rock_density: 0.25,
                fertility: 0.2,
                description: "A frozen land with permafrost and sparse vegetation.",
            },
            Biome::Desert => BiomeProperties {
                name: "Desert",
                min_temperature: 0.5,
                max_temperature: 1.0,
                min_rainfall: 0.0,
                max_rainfall: 0.2,
                tree_density: 0.02,
                rock_density: 0.3,
                fertility: 0.1,
                description: "A hot, arid desert with little water.",
            },
            Biome::TropicalRainforest => BiomeProperties {
                name: "Tropical Rainforest",
                min_temperature: 0.6,
                max_temperature: 1.0,
                min_rainfall: 0.7,
                max_rainfall: 1.0,
                tree_density: 0.7,
                rock_density: 0.05,
                fertility: 0.7,
                description: "A dense, humid jungle teeming with life.",
            },
            Biome::AridShrubland => BiomeProperties {
                name: "Arid Shrubland",
                min_temperature: 0.3,
                max_temperature: 0.8,
                min_rainfall: 0.2,
                max_rainfall: 0.4,
                tree_density: 0.15,
                rock_density: 0.2,
                fertility: 0.4,
                description: "A semi-arid region with scrubby vegetation.",
            },
            Biome::Wetland => BiomeProperties {
                name: "Wetland",
                min_temperature: -0.1,
                max_temperature: 0.5,
                min_rainfall: 0.6,
                max_rainfall: 1.0,
                tree_density: 0.25,
                rock_density: 0.05,
                fertility: 0.6,
                description: "A marshy region with abundant water.",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.properties().name
    }

    /// Biomes a new settlement prefers to start in
    pub fn is_hospitable(&self) -> bool {
        matches!(
            self,
            Biome::TemperateForest | Biome::Grassland | Biome::BorealForest
        )
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 1.0 inside `[min, max]`, decaying linearly with the out-of-range distance
fn range_match(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        1.0 - (min - value)
    } else if value > max {
        1.0 - (value - max)
    } else {
        1.0
    }
}

/// Score of a climate against one biome's declared ranges
pub fn climate_score(biome: Biome, temperature: f64, rainfall: f64) -> f64 {
    let props = biome.properties();
    range_match(temperature, props.min_temperature, props.max_temperature)
        * range_match(rainfall, props.min_rainfall, props.max_rainfall)
}

/// Best-matching biome for a climate
///
/// Equal scores keep the earlier biome in `Biome::ALL`.
pub fn classify_biome(temperature: f64, rainfall: f64) -> Biome {
    let mut best = Biome::Grassland;
    let mut best_score = f64::NEG_INFINITY;
    for biome in Biome::ALL {
        let score = climate_score(biome, temperature, rainfall);
        if score > best_score {
            best_score = score;
            best = biome;
        }
    }
    best
}
