pub mod ai;
pub mod catalog;
pub mod character;
pub mod error;
pub mod game;
pub mod logging;
pub mod message;
pub mod player;
pub mod quest;
pub mod save;
pub mod session;
pub mod settings;
pub mod store;

// Re-export commonly used items for easier access
pub use ai::{NarrativeClient, NarrativeGenerator};
pub use character::{Character, normalize_class};
pub use error::{AppError, GameError, NarrativeError, StoreError};
pub use game::{Game, NARRATION_PLACEHOLDER, error_reply};
pub use message::{Choice, Reply};
pub use player::{Player, PlayerId};
pub use quest::{FINAL_STAGE, Quest, QuestId, QuestProgress};
pub use session::{DialogSession, InMemorySessions, SessionStore};
pub use store::{GameStore, MemoryStore};
