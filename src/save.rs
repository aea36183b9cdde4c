use async_trait::async_trait;
use std::fs::{File, create_dir_all, read_dir};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::player::{Player, PlayerId};
use crate::quest::{Quest, QuestId, QuestProgress};
use crate::store::{GameData, GameStore};

pub const SAVE_DIR: &str = "./data/save";

/// JSON-file-backed store. The whole world state is one pretty-printed file,
/// rewritten on every mutation; small worlds make that cheap, and it keeps a
/// character-plus-progress update a single write.
///
/// Mutations write the file before touching the in-memory copy, so a rejected
/// write leaves nothing half-applied.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<GameData>,
}

// List the world files available under the save directory.
pub fn scan_save_files() -> Vec<String> {
    let save_dir = Path::new(SAVE_DIR);
    let Ok(entries) = read_dir(save_dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if path.is_file() && path.extension()? == "json" {
                path.file_stem()?.to_str().map(String::from)
            } else {
                None
            }
        })
        .collect()
}

impl FileStore {
    /// Opens the store at `path`, loading existing state or starting empty
    /// when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let file = File::open(&path)?;
            serde_json::from_reader(file)?
        } else {
            GameData::default()
        };
        Ok(FileStore {
            path,
            data: RwLock::new(data),
        })
    }

    /// Opens the default world file under the save directory.
    pub fn open_default(name: &str) -> Result<Self, StoreError> {
        create_dir_all(SAVE_DIR)?;
        Self::open(format!("{SAVE_DIR}/{name}.json"))
    }

    fn write_to_disk(&self, data: &GameData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, data)?;
        Ok(())
    }

    // Apply a mutation to a scratch copy, persist it, then publish it.
    async fn commit<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut GameData) -> Result<(), StoreError>,
    {
        let mut guard = self.data.write().await;
        let mut scratch = guard.clone();
        mutate(&mut scratch)?;
        self.write_to_disk(&scratch)?;
        *guard = scratch;
        Ok(())
    }
}

#[async_trait]
impl GameStore for FileStore {
    async fn get_or_create_player(
        &self,
        id: PlayerId,
        username: Option<String>,
    ) -> Result<Player, StoreError> {
        {
            let data = self.data.read().await;
            if let Some(player) = data.players.get(&id.0) {
                return Ok(player.clone());
            }
        }
        let player = Player::new(id, username);
        self.commit(|data| {
            data.players.entry(id.0).or_insert_with(|| player.clone());
            Ok(())
        })
        .await?;
        Ok(player)
    }

    async fn update_player(&self, player: &Player) -> Result<(), StoreError> {
        self.commit(|data| data.update_player(player)).await
    }

    async fn insert_quest(&self, quest: Quest) -> Result<(), StoreError> {
        self.commit(move |data| {
            data.quests.push(quest);
            Ok(())
        })
        .await
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
        self.commit(|data| {
            data.upsert_progress(progress);
            Ok(())
        })
        .await
    }

    async fn commit_completion(
        &self,
        player: &Player,
        progress: &QuestProgress,
    ) -> Result<(), StoreError> {
        self.commit(|data| {
            data.update_player(player)?;
            data.upsert_progress(progress);
            Ok(())
        })
        .await
    }
}
