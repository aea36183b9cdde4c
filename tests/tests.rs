// ../tests/tests.rs
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use questline::ai::NarrativeGenerator;
use questline::character::Character;
use questline::error::{AppError, GameError, NarrativeError};
use questline::game::{Game, NARRATION_PLACEHOLDER};
use questline::player::PlayerId;
use questline::quest::{Quest, QuestId};
use questline::save::FileStore;
use questline::session::InMemorySessions;
use questline::store::{GameStore, MemoryStore};
use questline::{normalize_class, quest::QuestProgress};

const PLAYER: PlayerId = PlayerId(42);

// Scripted narrator: either always narrates or always fails, counts how
// often it was asked, and remembers the last role it was given.
struct FakeNarrator {
    fail: bool,
    calls: AtomicUsize,
    last_role: std::sync::Mutex<String>,
}

impl FakeNarrator {
    fn new(fail: bool) -> Self {
        FakeNarrator {
            fail,
            calls: AtomicUsize::new(0),
            last_role: std::sync::Mutex::new(String::new()),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for FakeNarrator {
    async fn generate_step(
        &self,
        system_role: &str,
        player_message: &str,
    ) -> Result<String, NarrativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_role.lock().expect("role lock poisoned") = system_role.to_string();
        if self.fail {
            Err(NarrativeError::MalformedResponse(
                "simulated transport failure".to_string(),
            ))
        } else {
            Ok(format!("The story continues after: {player_message}"))
        }
    }
}

fn quest(id: i64, title: &str, required_level: u32, reward_exp: u32) -> Quest {
    Quest {
        id: QuestId(id),
        title: title.to_string(),
        description: format!("Description of {title}"),
        required_level,
        reward_exp,
        final_goal: format!("Final goal of {title}"),
        is_active: true,
    }
}

fn new_game(fail_narration: bool) -> (Game, Arc<MemoryStore>, Arc<FakeNarrator>) {
    let store = Arc::new(MemoryStore::new());
    let narrator = Arc::new(FakeNarrator::new(fail_narration));
    let game = Game::new(
        store.clone(),
        Arc::new(InMemorySessions::new()),
        narrator.clone(),
        "English",
    );
    (game, store, narrator)
}

async fn create_character(game: &Game, name: &str, class: &str) {
    game.begin_creation(PLAYER)
        .await
        .expect("begin_creation failed");
    game.handle_message(PLAYER, name)
        .await
        .expect("name answer failed");
    game.handle_message(PLAYER, class)
        .await
        .expect("class answer failed");
}

#[test]
fn test_experience_converts_each_full_hundred() {
    for (start_exp, gained) in [(0u32, 0u32), (0, 99), (0, 100), (50, 49), (50, 50), (99, 1), (30, 1000), (0, 1200)] {
        let mut character = Character::new("Test".to_string(), "Mage");
        character.experience = start_exp;
        let levels = character.gain_experience(gained);

        let total = start_exp + gained;
        assert_eq!(character.experience, total % 100, "leftover for {start_exp}+{gained}");
        assert_eq!(levels, total / 100, "levels for {start_exp}+{gained}");
        assert_eq!(character.level, 1 + total / 100);
    }
}

#[test]
fn test_class_normalization() {
    assert_eq!(normalize_class("warrior"), "Warrior");
    assert_eq!(normalize_class("mAGE"), "Mage");
    assert_eq!(normalize_class("  archer "), "Archer");
    assert_eq!(normalize_class("маг"), "Маг");
    assert_eq!(normalize_class(""), "");
}

#[tokio::test]
async fn test_character_creation_flow() {
    let (game, store, _) = new_game(false);

    let reply = game.begin_creation(PLAYER).await.expect("begin failed");
    assert!(reply.text.contains("name"));

    let reply = game
        .handle_message(PLAYER, "Conan")
        .await
        .expect("name step failed")
        .expect("expected a prompt for the class");
    assert!(reply.text.contains("class"));

    let reply = game
        .handle_message(PLAYER, "wArRiOr")
        .await
        .expect("class step failed")
        .expect("expected a confirmation");
    assert!(reply.text.contains("Character created"));

    let player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("player lookup failed");
    let character = player.character.expect("character should be persisted");
    assert_eq!(character.name, "Conan");
    assert_eq!(character.class, "Warrior");
    assert_eq!(character.level, 1);
    assert_eq!(character.experience, 0);

    // A finished character blocks a second creation.
    let err = game.begin_creation(PLAYER).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Game(GameError::CharacterAlreadyExists(_))
    ));
}

#[tokio::test]
async fn test_pending_name_is_not_persisted() {
    let (game, store, _) = new_game(false);

    game.begin_creation(PLAYER).await.expect("begin failed");
    game.handle_message(PLAYER, "Halfway")
        .await
        .expect("name step failed");

    // Only the name was answered; nothing may be committed yet.
    let player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("player lookup failed");
    assert!(player.character.is_none());
}

#[tokio::test]
async fn test_start_is_idempotent_on_progress_identity() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;

    game.start_quest(PLAYER, QuestId(1)).await.expect("first start failed");
    game.start_quest(PLAYER, QuestId(1)).await.expect("second start failed");

    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("progress lookup failed")
        .expect("one progress record should exist");
    assert_eq!(progress.current_stage, 1, "restart must not reset to 0");
    assert!(!progress.is_completed);
}

#[tokio::test]
async fn test_advance_increments_and_completes_exactly_at_stage_5() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;
    game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");

    // Stage after start is 1; each exchange adds exactly one.
    for expected_stage in 2..=4u32 {
        let reply = game
            .advance(PLAYER, "I press on")
            .await
            .expect("advance failed")
            .expect("active quest should produce narration");
        assert!(!reply.text.contains("final stage"));

        let progress = store
            .progress(PLAYER, QuestId(1))
            .await
            .expect("lookup failed")
            .expect("progress should exist");
        assert_eq!(progress.current_stage, expected_stage);
        assert!(!progress.is_completed, "must not complete before stage 5");
    }

    let reply = game
        .advance(PLAYER, "I finish the job")
        .await
        .expect("final advance failed")
        .expect("final stage should produce narration");
    assert!(reply.text.contains("final stage"));

    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed")
        .expect("progress should exist");
    assert_eq!(progress.current_stage, 5);
    assert!(progress.is_completed);
}

#[tokio::test]
async fn test_reward_credited_once_and_completed_quest_is_inert() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 80)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;
    game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");

    for _ in 0..4 {
        game.advance(PLAYER, "onward").await.expect("advance failed");
    }

    let player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("lookup failed");
    let character = player.character.expect("character should exist");
    assert_eq!(character.experience, 80);
    assert_eq!(character.level, 1);

    // A completed quest no longer reacts; no double reward.
    let reply = game.advance(PLAYER, "again").await.expect("advance failed");
    assert!(reply.is_none());

    let player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("lookup failed");
    assert_eq!(player.character.expect("character").experience, 80);
}

#[tokio::test]
async fn test_big_reward_yields_twelve_level_ups() {
    let (game, store, _) = new_game(false);
    store
        .insert_quest(quest(1, "Dragon", 1, 1200))
        .await
        .expect("seed failed");
    create_character(&game, "Ayla", "mage").await;

    game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");
    for _ in 0..5 {
        game.advance(PLAYER, "I fight the dragon")
            .await
            .expect("advance failed");
    }

    let player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("lookup failed");
    let character = player.character.expect("character should exist");
    assert_eq!(character.level, 13);
    assert_eq!(character.experience, 0);

    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed")
        .expect("progress should exist");
    assert!(progress.is_completed);
}

#[tokio::test]
async fn test_list_available_filters_level_activity_and_completion() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    store.insert_quest(quest(2, "Caravan", 3, 120)).await.expect("seed failed");
    store.insert_quest(quest(3, "Bell", 5, 250)).await.expect("seed failed");
    let mut inactive = quest(4, "Closed", 1, 10);
    inactive.is_active = false;
    store.insert_quest(inactive).await.expect("seed failed");

    create_character(&game, "Ayla", "scout").await;

    // Raise the character to level 3 directly through the store.
    let mut player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("lookup failed");
    player.character.as_mut().expect("character").level = 3;
    store.update_player(&player).await.expect("update failed");

    // Mark "Rats" as already completed, regardless of level.
    let mut done = QuestProgress::new(PLAYER, QuestId(1));
    done.current_stage = 5;
    done.is_completed = true;
    store.upsert_progress(&done).await.expect("upsert failed");

    let reply = game.list_available(PLAYER).await.expect("list failed");
    let labels: Vec<&str> = reply.choices.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, vec!["Caravan (Lvl 3)"]);
}

#[tokio::test]
async fn test_generator_failure_still_advances_with_placeholder() {
    let (game, store, narrator) = new_game(true);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;

    let reply = game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");
    assert!(reply.text.contains(NARRATION_PLACEHOLDER));

    let reply = game
        .advance(PLAYER, "I look around")
        .await
        .expect("advance must not propagate generator errors")
        .expect("turn should still produce a reply");
    assert_eq!(reply.text, NARRATION_PLACEHOLDER);

    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed")
        .expect("progress should exist");
    assert_eq!(progress.current_stage, 2, "stage advances despite the failure");
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_single_active_quest_enforced() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    store.insert_quest(quest(2, "Caravan", 1, 120)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;

    game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");
    let err = game.start_quest(PLAYER, QuestId(2)).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Game(GameError::QuestAlreadyActive(_))
    ));
}

#[tokio::test]
async fn test_advance_without_active_quest_is_a_silent_noop() {
    let (game, _, narrator) = new_game(false);

    let reply = game.advance(PLAYER, "hello?").await.expect("advance failed");
    assert!(reply.is_none());
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 0, "no narration without a quest");
}

#[tokio::test]
async fn test_restarting_a_completed_quest_is_refused() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;

    game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");
    for _ in 0..4 {
        game.advance(PLAYER, "onward").await.expect("advance failed");
    }

    let err = game.start_quest(PLAYER, QuestId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Game(GameError::QuestAlreadyCompleted(_))
    ));

    // The refused restart must leave the finished record untouched.
    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed")
        .expect("progress should exist");
    assert!(progress.is_completed);
    assert_eq!(progress.current_stage, 5);
}

#[tokio::test]
async fn test_inactive_quest_cannot_be_started() {
    let (game, store, narrator) = new_game(false);
    let mut closed = quest(1, "Closed", 1, 50);
    closed.is_active = false;
    store.insert_quest(closed).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;

    let err = game.start_quest(PLAYER, QuestId(1)).await.unwrap_err();
    assert!(matches!(err, AppError::Game(GameError::QuestInactive)));

    // Nothing was narrated and no progress record appeared.
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 0);
    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed");
    assert!(progress.is_none());
}

#[tokio::test]
async fn test_narration_role_carries_configured_language() {
    let (game, store, narrator) = new_game(false);
    store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");
    create_character(&game, "Ayla", "scout").await;

    game.start_quest(PLAYER, QuestId(1)).await.expect("start failed");
    let role = narrator.last_role.lock().expect("role lock poisoned").clone();
    assert!(role.contains("Narrate in English."), "role was: {role}");
}

#[tokio::test]
async fn test_describe_quest_is_a_pure_read() {
    let (game, store, _) = new_game(false);
    store.insert_quest(quest(1, "Rats", 2, 50)).await.expect("seed failed");

    let reply = game.describe_quest(QuestId(1)).await.expect("describe failed");
    assert!(reply.text.contains("Rats"));
    assert!(reply.text.contains("Required level: 2"));
    assert_eq!(reply.choices.len(), 2);

    // Describing commits nothing.
    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed");
    assert!(progress.is_none());

    let err = game.describe_quest(QuestId(99)).await.unwrap_err();
    assert!(matches!(err, AppError::Game(GameError::QuestNotFound(99))));
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("world.json");

    {
        let store = FileStore::open(&path).expect("open failed");
        let mut player = store
            .get_or_create_player(PLAYER, Some("tester".to_string()))
            .await
            .expect("create failed");
        player.character = Some(Character::new("Ayla".to_string(), "scout"));
        store.update_player(&player).await.expect("update failed");
        store.insert_quest(quest(1, "Rats", 1, 50)).await.expect("seed failed");

        let mut progress = QuestProgress::new(PLAYER, QuestId(1));
        progress.current_stage = 3;
        store.upsert_progress(&progress).await.expect("upsert failed");
    }

    // Reopen from disk and check everything survived.
    let store = FileStore::open(&path).expect("reopen failed");
    let player = store
        .get_or_create_player(PLAYER, None)
        .await
        .expect("lookup failed");
    let character = player.character.expect("character should be persisted");
    assert_eq!(character.name, "Ayla");
    assert_eq!(character.class, "Scout");

    let quests = store.quests().await.expect("quests failed");
    assert_eq!(quests.len(), 1);

    let progress = store
        .progress(PLAYER, QuestId(1))
        .await
        .expect("lookup failed")
        .expect("progress should be persisted");
    assert_eq!(progress.current_stage, 3);
    assert!(!progress.is_completed);
}
