use serde_json;
use thiserror::Error;

// Enum for handling various application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Game error: {0}")]
    Game(#[from] GameError), // Errors specific to game rules or routing.

    #[error("Store error: {0}")]
    Store(#[from] StoreError), // Errors from the persistence layer.

    #[error("Narrative error: {0}")]
    Narrative(#[from] NarrativeError), // Errors from the narrative service client.

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error), // Errors related to data serialization.

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error), // Input/output errors.
}

// Enum for game-specific errors. These surface to the player as chat text,
// never as a crash.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Character already exists: {0}")]
    CharacterAlreadyExists(String), // A second creation attempt for a finished character.

    #[error("Character not found")]
    CharacterNotFound, // The player has not created a character yet.

    #[error("Quest not found: {0}")]
    QuestNotFound(i64), // A referenced quest id has no catalog record.

    #[error("Another quest is already in progress: {0}")]
    QuestAlreadyActive(String), // At most one non-completed quest per player.

    #[error("Quest already completed: {0}")]
    QuestAlreadyCompleted(String), // Completed quests never restart.

    #[error("Quest is not active")]
    QuestInactive, // The catalog entry exists but is switched off.
}

// Errors from the persistence layer are separated into their own enum so the
// engine can turn them into a generic retry-later message.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Player not found: {0}")]
    PlayerNotFound(i64),

    #[error("Quest not found: {0}")]
    QuestNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

// Errors talking to the narrative service. Typed so callers can tell a
// declined generation from an unreachable network before substituting the
// placeholder narration.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String), // Token endpoint rejected us or returned garbage.

    #[error("Malformed response: {0}")]
    MalformedResponse(String), // The completion payload had no usable text.
}
