use serde::{Deserialize, Serialize};
use std::fmt;

use crate::character::Character;

// Stable external account id handed to us by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Define a structure for the account interacting with the game. A player owns
// zero or one Character; `None` means creation has not finished yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: Option<String>,
    pub character: Option<Character>,
}

impl Player {
    pub fn new(id: PlayerId, username: Option<String>) -> Self {
        Player {
            id,
            username,
            character: None,
        }
    }

    pub fn has_character(&self) -> bool {
        self.character.is_some()
    }

    // The level used for quest gating. A player without a character has no
    // level, which keeps them out of every quest list.
    pub fn level(&self) -> Option<u32> {
        self.character.as_ref().map(|c| c.level)
    }
}
