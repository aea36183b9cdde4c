use serde::{Deserialize, Serialize};
use std::fmt;

use crate::player::PlayerId;

/// Reaching this stage (post-increment) completes the quest. Every quest runs
/// the same five-exchange narrative arc, which bounds how many narrative
/// generations a single quest can cost.
pub const FINAL_STAGE: u32 = 5;

/// Routing cutoff: a progress record at or past this stage is never treated
/// as active, even if its completed flag somehow lagged behind.
pub const MAX_STAGE: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestId(pub i64);

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Define a structure for a catalog quest definition. Seeded by admins, never
// mutated by gameplay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub required_level: u32, // Minimum character level to attempt.
    pub reward_exp: u32,     // Experience credited on completion.
    pub final_goal: String,  // Completion criterion, fed to the narrator as context.
    pub is_active: bool,
}

impl Quest {
    // Summary card shown before the player commits to starting.
    pub fn describe(&self) -> String {
        format!(
            "Title: {}\nDescription: {}\nRequired level: {}\nReward: {} experience\n\nDo you want to start this quest?",
            self.title, self.description, self.required_level, self.reward_exp
        )
    }
}

// One record per (player, quest) pair, created lazily on first start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub player_id: PlayerId,
    pub quest_id: QuestId,
    pub current_stage: u32,
    pub is_completed: bool, // Monotonic: never reverts to false.
}

impl QuestProgress {
    pub fn new(player_id: PlayerId, quest_id: QuestId) -> Self {
        QuestProgress {
            player_id,
            quest_id,
            current_stage: 0,
            is_completed: false,
        }
    }

    // Active means this record still routes the player's free text into the
    // quest dialog.
    pub fn is_active(&self) -> bool {
        !self.is_completed && self.current_stage < MAX_STAGE
    }
}
