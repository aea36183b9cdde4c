//! Quest catalog seeding.
//!
//! The catalog is admin-maintained: quests are loaded from a JSON file or,
//! for a fresh world, seeded with a small default set. Gameplay never writes
//! to the catalog.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::quest::{Quest, QuestId};
use crate::store::GameStore;

// Catalog-file entry. Ids are assigned from file order, so reordering the
// file renumbers the quests; append new quests at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    pub title: String,
    pub description: String,
    #[serde(default = "default_required_level")]
    pub required_level: u32,
    #[serde(default)]
    pub reward_exp: u32,
    pub final_goal: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_required_level() -> u32 {
    1
}

fn default_is_active() -> bool {
    true
}

impl QuestDef {
    fn into_quest(self, id: i64) -> Quest {
        Quest {
            id: QuestId(id),
            title: self.title,
            description: self.description,
            required_level: self.required_level,
            reward_exp: self.reward_exp,
            final_goal: self.final_goal,
            is_active: self.is_active,
        }
    }
}

/// Loads quest definitions from a JSON file and appends them to the catalog.
pub async fn load_catalog_file(
    store: &dyn GameStore,
    path: impl AsRef<Path>,
) -> Result<usize, AppError> {
    let data = fs::read_to_string(path)?;
    let defs: Vec<QuestDef> = serde_json::from_str(&data)?;
    let offset = store.quests().await?.len() as i64;

    let count = defs.len();
    for (index, def) in defs.into_iter().enumerate() {
        store
            .insert_quest(def.into_quest(offset + index as i64 + 1))
            .await?;
    }

    info!("Loaded {count} quests into the catalog");
    Ok(count)
}

/// Seeds a fresh world with the default quests. Does nothing if the catalog
/// already has entries.
pub async fn seed_default_quests(store: &dyn GameStore) -> Result<(), AppError> {
    if !store.quests().await?.is_empty() {
        return Ok(());
    }

    let defaults = vec![
        QuestDef {
            title: "The Rat Cellar".to_string(),
            description: "The innkeeper's cellar crawls with oversized rats. Clear them out."
                .to_string(),
            required_level: 1,
            reward_exp: 50,
            final_goal: "Every rat in the cellar is dealt with and the innkeeper is told."
                .to_string(),
            is_active: true,
        },
        QuestDef {
            title: "The Missing Caravan".to_string(),
            description: "A merchant caravan vanished on the forest road. Find out what happened."
                .to_string(),
            required_level: 2,
            reward_exp: 120,
            final_goal: "The caravan's fate is uncovered and survivors are brought home."
                .to_string(),
            is_active: true,
        },
        QuestDef {
            title: "The Sunken Bell".to_string(),
            description: "The old chapel bell lies at the bottom of the mill pond. Raise it before the festival."
                .to_string(),
            required_level: 4,
            reward_exp: 250,
            final_goal: "The bell hangs in the chapel tower again and rings for the festival."
                .to_string(),
            is_active: true,
        },
    ];

    for (index, def) in defaults.into_iter().enumerate() {
        store.insert_quest(def.into_quest(index as i64 + 1)).await?;
    }

    info!("Seeded default quest catalog");
    Ok(())
}
