// Import necessary modules from external crates.
use serde::{Deserialize, Serialize};
use std::fmt;

// Experience needed for one level. Leftover experience carries over.
pub const EXP_PER_LEVEL: u32 = 100;

// Define a structure representing a player's RPG persona. Name and class are
// committed together during creation, so a Character never exists half-built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub class: String, // Normalized: first letter uppercase, remainder lowercase.
    pub level: u32,
    pub experience: u32,
}

impl Character {
    // Constructor for creating a fresh level-1 character. The class string is
    // normalized here so every stored class reads the same way.
    pub fn new(name: String, class: &str) -> Self {
        Character {
            name,
            class: normalize_class(class),
            level: 1,
            experience: 0,
        }
    }

    /// Credits `gained` experience and converts each full 100 points into one
    /// level. Returns how many levels were gained.
    ///
    /// Implemented as a loop on purpose: a single large reward walks through
    /// every conversion, so a 1200-exp reward from level 1 lands on level 13
    /// with 0 experience left over.
    pub fn gain_experience(&mut self, gained: u32) -> u32 {
        let mut levels_gained = 0;
        self.experience += gained;
        while self.experience >= EXP_PER_LEVEL {
            self.experience -= EXP_PER_LEVEL;
            self.level += 1;
            levels_gained += 1;
        }
        levels_gained
    }
}

// Implement the Display trait for Character to allow for easier printing.
impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}\nClass: {}\nLevel: {}\nExperience: {}",
            self.name, self.class, self.level, self.experience
        )
    }
}

/// Normalizes a player-typed class string to capitalized form: first letter
/// uppercase, the rest lowercase. Any string is accepted as a class; there is
/// no fixed class list. Works on multi-byte scripts ("маг" becomes "Маг").
pub fn normalize_class(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
