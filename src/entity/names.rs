//! Citizen name tables

use rand::seq::SliceRandom;
use rand::Rng;

pub const FIRST_NAMES: &[&str] = &[
    "Aelric", "Bran", "Cedric", "Doran", "Elara", "Finn", "Greta", "Hilda", "Isla", "Jorah",
    "Kael", "Lysa", "Mira", "Nolan", "Olwen", "Piper", "Quinn", "Rolan", "Sasha", "Thora", "Una",
    "Vale", "Wren", "Xander", "Yara", "Zara",
];

pub const LAST_NAMES: &[&str] = &[
    "Ashwood", "Blackthorn", "Clearwater", "Dawnbringer", "Evergreen", "Fairwind", "Goldleaf",
    "Highvale", "Ironforge", "Jadebrook", "Kindler", "Lightfoot", "Meadowbrook", "Nightshade",
    "Oakenshield", "Proudhorn", "Quickstep", "Ravenwood", "Silverstream", "Thornberry",
    "Underhill", "Valorheart", "Windwhisper", "Youngblood",
];

/// "First Last" drawn from the name tables
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Nameless");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Wanderer");
    format!("{first} {last}")
}
