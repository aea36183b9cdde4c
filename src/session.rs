//! Transient per-player dialog state.
//!
//! A `DialogSession` only remembers which question the player is mid-way
//! through answering; everything of record lives in the store. Losing it on
//! restart costs at most one prompt. The store is a trait so a multi-process
//! deployment can back it with an external keyed store instead of process
//! memory.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::player::PlayerId;
use crate::quest::QuestId;

// Which field of character creation we are waiting on. The pending name is
// held here, not in the store: name and class are persisted together once
// both are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationStep {
    Name,
    Class { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogSession {
    #[default]
    Idle,
    CreatingCharacter(CreationStep),
    InQuest {
        quest_id: QuestId,
    },
}

// get/set/clear by player id, nothing else. Implementations must be safe to
// share across concurrently handled players.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, player: PlayerId) -> DialogSession;
    async fn set(&self, player: PlayerId, session: DialogSession);
    async fn clear(&self, player: PlayerId);
}

// In-memory backing for single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySessions {
    sessions: RwLock<HashMap<PlayerId, DialogSession>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn get(&self, player: PlayerId) -> DialogSession {
        self.sessions
            .read()
            .await
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }

    async fn set(&self, player: PlayerId, session: DialogSession) {
        self.sessions.write().await.insert(player, session);
    }

    async fn clear(&self, player: PlayerId) {
        self.sessions.write().await.remove(&player);
    }
}
