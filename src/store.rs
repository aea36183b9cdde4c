//! Persistent game state behind the `GameStore` trait.
//!
//! Character and QuestProgress mutations for a completed quest go through
//! `commit_completion` so both land (or fail) as one unit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::player::{Player, PlayerId};
use crate::quest::{Quest, QuestId, QuestProgress};

// The full persisted state. Quests keep catalog (insertion) order; progress
// records are a flat list because each one already carries its (player,
// quest) key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameData {
    pub players: BTreeMap<i64, Player>,
    pub quests: Vec<Quest>,
    pub progress: Vec<QuestProgress>,
}

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Looks a player up by account id, creating the row on first contact.
    async fn get_or_create_player(
        &self,
        id: PlayerId,
        username: Option<String>,
    ) -> Result<Player, StoreError>;

    async fn update_player(&self, player: &Player) -> Result<(), StoreError>;

    /// Appends a quest to the catalog.
    async fn insert_quest(&self, quest: Quest) -> Result<(), StoreError>;

    /// Every quest, in catalog order.
    async fn quests(&self) -> Result<Vec<Quest>, StoreError>;

    async fn quest(&self, id: QuestId) -> Result<Option<Quest>, StoreError>;

    async fn progress(
        &self,
        player: PlayerId,
        quest: QuestId,
    ) -> Result<Option<QuestProgress>, StoreError>;

    /// The player's single non-completed progress record below the stage
    /// cutoff, if any. At most one exists; the engine refuses to start a
    /// second quest while one is open.
    async fn active_progress(&self, player: PlayerId) -> Result<Option<QuestProgress>, StoreError>;

    async fn upsert_progress(&self, progress: &QuestProgress) -> Result<(), StoreError>;

    /// Persists the rewarded character and the completed progress record as
    /// one atomic unit.
    async fn commit_completion(
        &self,
        player: &Player,
        progress: &QuestProgress,
    ) -> Result<(), StoreError>;
}

// In-memory store, used by tests and ephemeral play.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<GameData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// The data-level operations are shared with the file-backed store in save.rs.
impl GameData {
    pub fn get_or_create_player(&mut self, id: PlayerId, username: Option<String>) -> Player {
        self.players
            .entry(id.0)
            .or_insert_with(|| Player::new(id, username))
            .clone()
    }

    pub fn update_player(&mut self, player: &Player) -> Result<(), StoreError> {
        match self.players.get_mut(&player.id.0) {
            Some(existing) => {
                *existing = player.clone();
                Ok(())
            }
            None => Err(StoreError::PlayerNotFound(player.id.0)),
        }
    }

    pub fn quest(&self, id: QuestId) -> Option<Quest> {
        self.quests.iter().find(|q| q.id == id).cloned()
    }

    pub fn progress(&self, player: PlayerId, quest: QuestId) -> Option<QuestProgress> {
        self.progress
            .iter()
            .find(|p| p.player_id == player && p.quest_id == quest)
            .cloned()
    }

    pub fn active_progress(&self, player: PlayerId) -> Option<QuestProgress> {
        self.progress
            .iter()
            .find(|p| p.player_id == player && p.is_active())
            .cloned()
    }

    // At most one record per (player, quest) pair.
    pub fn upsert_progress(&mut self, progress: &QuestProgress) {
        match self
            .progress
            .iter_mut()
            .find(|p| p.player_id == progress.player_id && p.quest_id == progress.quest_id)
        {
            Some(existing) => *existing = progress.clone(),
            None => self.progress.push(progress.clone()),
        }
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get_or_create_player(
        &self,
        id: PlayerId,
        username: Option<String>,
    ) -> Result<Player, StoreError> {
        Ok(self.data.write().await.get_or_create_player(id, username))
    }

    async fn update_player(&self, player: &Player) -> Result<(), StoreError> {
        self.data.write().await.update_player(player)
    }

    async fn insert_quest(&self, quest: Quest) -> Result<(), StoreError> {
        self.data.write().await.quests.push(quest);
        Ok(())
    }

    async fn quests(&self) -> Result<Vec<Quest>, StoreError> {
        Ok(self.data.read().await.quests.clone())
    }

    async fn quest(&self, id: QuestId) -> Result<Option<Quest>, StoreError> {
        Ok(self.data.read().await.quest(id))
    }

    async fn progress(
        &self,
        player: PlayerId,
        quest: QuestId,
    ) -> Result<Option<QuestProgress>, StoreError> {
        Ok(self.data.read().await.progress(player, quest))
    }

    async fn active_progress(&self, player: PlayerId) -> Result<Option<QuestProgress>, StoreError> {
        Ok(self.data.read().await.active_progress(player))
    }

    async fn upsert_progress(&self, progress: &QuestProgress) -> Result<(), StoreError> {
        self.data.write().await.upsert_progress(progress);
        Ok(())
    }

    async fn commit_completion(
        &self,
        player: &Player,
        progress: &QuestProgress,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.update_player(player)?;
        data.upsert_progress(progress);
        Ok(())
    }
}
