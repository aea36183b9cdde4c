//! The quest progression engine.
//!
//! Routes each player event through the transient dialog session, drives the
//! character creation flow and the five-stage quest state machine, and calls
//! the narrative generator for flavor text. The chat transport only ever
//! talks to this type.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::ai::NarrativeGenerator;
use crate::character::Character;
use crate::error::{AppError, GameError};
use crate::message::{Choice, Reply};
use crate::player::PlayerId;
use crate::quest::{FINAL_STAGE, Quest, QuestId, QuestProgress};
use crate::session::{CreationStep, DialogSession, SessionStore};
use crate::store::GameStore;

// Shown in place of narration when the generator fails. The quest clock still
// advances, so a flaky narrative service never stalls a quest.
pub const NARRATION_PLACEHOLDER: &str =
    "The storyteller falls silent for a moment, then waves you onward.";

const QUEST_MASTER_ROLE: &str = "You are the host of an RPG quest. The quest runs for at most 5 \
     stages. At every stage, react to the player's action and move the story forward. When the \
     5th stage is reached, judge whether the quest's final goal was achieved.";

pub const HELP_TEXT: &str = "Available commands:\n\
     /start — Begin playing.\n\
     /createcharacter — Create a new RPG character.\n\
     /mycharacter — Show your character.\n\
     /quests — List available quests.\n\
     /help — Show this message.";

pub struct Game {
    store: Arc<dyn GameStore>,
    sessions: Arc<dyn SessionStore>,
    narrator: Arc<dyn NarrativeGenerator>,
    language: String, // Language the storyteller is asked to narrate in.
}

impl Game {
    pub fn new(
        store: Arc<dyn GameStore>,
        sessions: Arc<dyn SessionStore>,
        narrator: Arc<dyn NarrativeGenerator>,
        language: impl Into<String>,
    ) -> Self {
        Game {
            store,
            sessions,
            narrator,
            language: language.into(),
        }
    }

    fn system_role(&self) -> String {
        format!("{QUEST_MASTER_ROLE} Narrate in {}.", self.language)
    }

    /// First contact: makes sure the player row exists and greets them.
    pub async fn greet(
        &self,
        player_id: PlayerId,
        username: Option<String>,
    ) -> Result<Reply, AppError> {
        self.store.get_or_create_player(player_id, username).await?;
        Ok(Reply::text(
            "Welcome to the quest game!\nType /help to see the available commands.",
        ))
    }

    pub fn help(&self) -> Reply {
        Reply::text(HELP_TEXT)
    }

    /// Starts the two-step character creation dialog. Errors if the player
    /// already has a finished character.
    pub async fn begin_creation(&self, player_id: PlayerId) -> Result<Reply, AppError> {
        let player = self.store.get_or_create_player(player_id, None).await?;

        if let Some(character) = &player.character {
            return Err(GameError::CharacterAlreadyExists(format!(
                "{} ({})",
                character.name, character.class
            ))
            .into());
        }

        self.sessions
            .set(player_id, DialogSession::CreatingCharacter(CreationStep::Name))
            .await;
        Ok(Reply::text("Enter your character's name:"))
    }

    /// Shows the player's character sheet.
    pub async fn show_character(&self, player_id: PlayerId) -> Result<Reply, AppError> {
        let player = self.store.get_or_create_player(player_id, None).await?;
        match &player.character {
            Some(character) => Ok(Reply::text(character.to_string())),
            None => Ok(Reply::text(
                "You don't have a character yet. Use /createcharacter.",
            )),
        }
    }

    /// Lists, in catalog order, every active quest the player's level allows
    /// and that they have not already completed. An empty list is not an
    /// error; the caller renders the "nothing available" text.
    pub async fn list_available(&self, player_id: PlayerId) -> Result<Reply, AppError> {
        let player = self.store.get_or_create_player(player_id, None).await?;
        let Some(level) = player.level() else {
            return Ok(Reply::text(
                "You need a character before taking on quests. Use /createcharacter.",
            ));
        };

        let mut choices = Vec::new();
        for quest in self.store.quests().await? {
            if !quest.is_active || quest.required_level > level {
                continue;
            }
            // Skip quests this player has already completed.
            let completed = self
                .store
                .progress(player_id, quest.id)
                .await?
                .is_some_and(|p| p.is_completed);
            if completed {
                continue;
            }
            choices.push((
                format!("{} (Lvl {})", quest.title, quest.required_level),
                Choice::SelectQuest(quest.id),
            ));
        }

        if choices.is_empty() {
            return Ok(Reply::text(
                "No quests are available right now. Level up or come back later.",
            ));
        }
        Ok(Reply::with_choices("Available quests:", choices))
    }

    /// Pure read: shows a quest's summary card with start/cancel options.
    /// Nothing is recorded until the player actually starts.
    pub async fn describe_quest(&self, quest_id: QuestId) -> Result<Reply, AppError> {
        let quest = self
            .store
            .quest(quest_id)
            .await?
            .ok_or(GameError::QuestNotFound(quest_id.0))?;

        Ok(Reply::with_choices(
            quest.describe(),
            vec![
                (format!("Start '{}'", quest.title), Choice::StartQuest(quest.id)),
                ("Cancel".to_string(), Choice::CancelSelection),
            ],
        ))
    }

    /// Abandoning a described-but-not-started quest changes no state.
    pub fn cancel_selection(&self) -> Reply {
        Reply::text("You cancelled the quest selection.")
    }

    /// Starts (or resumes) a quest: creates the progress record on first
    /// start, narrates the opening, and sets the stage to 1 whether or not
    /// the narration succeeded. At most one quest may be open at a time.
    pub async fn start_quest(
        &self,
        player_id: PlayerId,
        quest_id: QuestId,
    ) -> Result<Reply, AppError> {
        let player = self.store.get_or_create_player(player_id, None).await?;
        if !player.has_character() {
            return Err(GameError::CharacterNotFound.into());
        }

        let quest = self
            .store
            .quest(quest_id)
            .await?
            .ok_or(GameError::QuestNotFound(quest_id.0))?;
        if !quest.is_active {
            return Err(GameError::QuestInactive.into());
        }

        // One open quest per player. Restarting the same quest reuses its
        // row; anything else is refused.
        if let Some(active) = self.store.active_progress(player_id).await? {
            if active.quest_id != quest_id {
                let title = self
                    .store
                    .quest(active.quest_id)
                    .await?
                    .map(|q| q.title)
                    .unwrap_or_else(|| format!("quest {}", active.quest_id));
                return Err(GameError::QuestAlreadyActive(title).into());
            }
        }

        let mut progress = match self.store.progress(player_id, quest_id).await? {
            Some(existing) if existing.is_completed => {
                return Err(GameError::QuestAlreadyCompleted(quest.title).into());
            }
            Some(existing) => existing,
            None => QuestProgress::new(player_id, quest_id),
        };

        let opening = format!(
            "The player begins the quest '{}'. {}",
            quest.title, quest.description
        );
        let narration = self.narrate(&self.system_role(), &opening).await;

        progress.current_stage = 1;
        self.store.upsert_progress(&progress).await?;
        self.sessions
            .set(player_id, DialogSession::InQuest { quest_id })
            .await;

        info!("Player {player_id} started quest '{}'", quest.title);
        Ok(Reply::text(format!(
            "Quest '{}' started!\n{narration}",
            quest.title
        )))
    }

    /// One quest exchange: narrates the consequences of the player's action
    /// and increments the stage. Completing the final stage credits the
    /// reward, applies leveling, and persists character and progress
    /// together.
    ///
    /// Returns `Ok(None)` when the player has no open quest; the routing
    /// layer may call this speculatively and a missing progress record is
    /// nothing to act on.
    pub async fn advance(
        &self,
        player_id: PlayerId,
        action_text: &str,
    ) -> Result<Option<Reply>, AppError> {
        let Some(mut progress) = self.store.active_progress(player_id).await? else {
            self.sessions.clear(player_id).await;
            return Ok(None);
        };
        let Some(quest) = self.store.quest(progress.quest_id).await? else {
            warn!(
                "Active progress for player {player_id} references missing quest {}",
                progress.quest_id
            );
            return Ok(None);
        };

        let mut player = self.store.get_or_create_player(player_id, None).await?;
        let class = player
            .character
            .as_ref()
            .map(|c| c.class.clone())
            .unwrap_or_else(|| "Adventurer".to_string());

        let prompt = continuation_prompt(&quest, &class, action_text, progress.current_stage);
        let narration = self.narrate(&self.system_role(), &prompt).await;

        progress.current_stage += 1;

        if progress.current_stage >= FINAL_STAGE {
            progress.is_completed = true;

            let levels_gained = match player.character.as_mut() {
                Some(character) => character.gain_experience(quest.reward_exp),
                None => 0,
            };
            // Both records go in one commit; only then do we report anything.
            self.store.commit_completion(&player, &progress).await?;
            self.sessions.clear(player_id).await;

            let (level, experience) = player
                .character
                .as_ref()
                .map(|c| (c.level, c.experience))
                .unwrap_or((0, 0));
            info!(
                "Player {player_id} completed quest '{}' (+{} exp, +{levels_gained} levels)",
                quest.title, quest.reward_exp
            );

            Ok(Some(Reply::text(format!(
                "{narration}\n\nThat was the final stage of the quest! \
                 You earned {} experience.\nYour level is now {level}, experience: {experience}.",
                quest.reward_exp
            ))))
        } else {
            self.store.upsert_progress(&progress).await?;
            self.sessions
                .set(player_id, DialogSession::InQuest { quest_id: progress.quest_id })
                .await;
            Ok(Some(Reply::text(narration)))
        }
    }

    /// Routes a free-text message by the player's dialog session: an answer
    /// to a creation prompt, a quest action, or neither.
    pub async fn handle_message(
        &self,
        player_id: PlayerId,
        text: &str,
    ) -> Result<Option<Reply>, AppError> {
        match self.sessions.get(player_id).await {
            DialogSession::CreatingCharacter(step) => {
                Ok(Some(self.submit_answer(player_id, step, text).await?))
            }
            DialogSession::InQuest { .. } => self.advance(player_id, text).await,
            DialogSession::Idle => Ok(Some(Reply::text(
                "Unknown command or message. Type /help to see the command list.",
            ))),
        }
    }

    // Second half of the creation flow. The pending name lives only in the
    // session; name and class hit the store together.
    async fn submit_answer(
        &self,
        player_id: PlayerId,
        step: CreationStep,
        text: &str,
    ) -> Result<Reply, AppError> {
        match step {
            CreationStep::Name => {
                self.sessions
                    .set(
                        player_id,
                        DialogSession::CreatingCharacter(CreationStep::Class {
                            name: text.to_string(),
                        }),
                    )
                    .await;
                Ok(Reply::text(
                    "Great! Now enter your character's class (Swordsman, Mage or Archer):",
                ))
            }
            CreationStep::Class { name } => {
                let mut player = self.store.get_or_create_player(player_id, None).await?;
                let character = Character::new(name, text);
                player.character = Some(character.clone());
                self.store.update_player(&player).await?;
                self.sessions.clear(player_id).await;

                info!(
                    "Player {player_id} created character '{}' ({})",
                    character.name, character.class
                );
                Ok(Reply::text(format!("Character created!\n{character}")))
            }
        }
    }

    // Converts a generation failure into the placeholder once, keeping the
    // reason in the log.
    async fn narrate(&self, role: &str, prompt: &str) -> String {
        match self.narrator.generate_step(role, prompt).await {
            Ok(text) => {
                debug!("Narration generated ({} chars)", text.len());
                text
            }
            Err(err) => {
                warn!("Narrative generation failed, using placeholder: {err:#}");
                NARRATION_PLACEHOLDER.to_string()
            }
        }
    }
}

fn continuation_prompt(quest: &Quest, class: &str, action: &str, stage: u32) -> String {
    format!(
        "Current quest: {}\nGoal: {}\nThe player (class {class}) responds: {action}\n\
         This is stage {stage}. Continue the story and describe the consequences. \
         If this is the 5th response, decide whether the final goal was reached.",
        quest.title, quest.final_goal
    )
}

/// Maps an engine error onto the chat text shown to the player. Rule
/// violations get specific wording; infrastructure failures collapse into a
/// generic retry-later message.
pub fn error_reply(err: &AppError) -> Reply {
    let text = match err {
        AppError::Game(GameError::CharacterAlreadyExists(summary)) => {
            format!("You already have a character: {summary}.")
        }
        AppError::Game(GameError::CharacterNotFound) => {
            "You don't have a character yet. Use /createcharacter.".to_string()
        }
        AppError::Game(GameError::QuestNotFound(_)) => "Quest not found.".to_string(),
        AppError::Game(GameError::QuestAlreadyCompleted(title)) => {
            format!("You have already completed '{title}'.")
        }
        AppError::Game(GameError::QuestAlreadyActive(title)) => {
            format!("Finish '{title}' before starting another quest.")
        }
        AppError::Game(GameError::QuestInactive) => {
            "That quest is not available right now.".to_string()
        }
        _ => "Something went wrong. Please try again later.".to_string(),
    };
    Reply::text(text)
}
