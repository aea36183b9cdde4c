use std::sync::Arc;

use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use questline::ai::NarrativeClient;
use questline::catalog;
use questline::game::{Game, error_reply};
use questline::message::{Choice, Reply};
use questline::player::PlayerId;
use questline::save::FileStore;
use questline::session::InMemorySessions;
use questline::settings::Settings;
use questline::{logging, store::GameStore};

const CATALOG_FILE: &str = "./data/quests.json";

// Single local player for the console transport. A chat platform transport
// would hand us real account ids instead.
const LOCAL_PLAYER: PlayerId = PlayerId(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().unwrap_or_else(|_| {
        let settings = Settings::new();
        let _ = settings.save();
        settings
    });
    logging::init(settings.debug_mode)?;

    let authorization_key = settings.authorization_key.clone().unwrap_or_else(|| {
        warn!("No authorization key configured; narration will use placeholders");
        String::new()
    });

    let worlds = questline::save::scan_save_files();
    if !worlds.is_empty() {
        log::info!("Found saved worlds: {worlds:?}");
    }

    let store: Arc<dyn GameStore> = Arc::new(FileStore::open_default("world")?);
    // Fill an empty catalog from the admin file, or with the built-in set.
    if store.quests().await?.is_empty() && std::path::Path::new(CATALOG_FILE).exists() {
        catalog::load_catalog_file(store.as_ref(), CATALOG_FILE).await?;
    }
    catalog::seed_default_quests(store.as_ref()).await?;

    let game = Game::new(
        store,
        Arc::new(InMemorySessions::new()),
        Arc::new(NarrativeClient::new(&settings, authorization_key)),
        settings.language.clone(),
    );

    run_console(&game).await
}

// Minimal stand-in for the chat transport: one local player, one line per
// turn, numbered options instead of buttons.
async fn run_console(game: &Game) -> anyhow::Result<()> {
    let username = std::env::var("USER").ok();
    print_reply(&game.greet(LOCAL_PLAYER, username).await?);

    let mut pending_choices: Vec<(String, Choice)> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" {
            break;
        }

        let result = match input {
            "/start" => game.greet(LOCAL_PLAYER, None).await.map(Some),
            "/help" => Ok(Some(game.help())),
            "/createcharacter" => game.begin_creation(LOCAL_PLAYER).await.map(Some),
            "/mycharacter" => game.show_character(LOCAL_PLAYER).await.map(Some),
            "/quests" => game.list_available(LOCAL_PLAYER).await.map(Some),
            _ => match parse_selection(input, &pending_choices) {
                Some(choice) => match choice {
                    Choice::SelectQuest(id) => game.describe_quest(id).await.map(Some),
                    Choice::StartQuest(id) => game.start_quest(LOCAL_PLAYER, id).await.map(Some),
                    Choice::CancelSelection => Ok(Some(game.cancel_selection())),
                },
                None => game.handle_message(LOCAL_PLAYER, input).await,
            },
        };

        let reply = match result {
            Ok(Some(reply)) => reply,
            Ok(None) => continue,
            Err(err) => {
                warn!("Turn failed: {err:#}");
                error_reply(&err)
            }
        };

        print_reply(&reply);
        pending_choices = reply.choices;
    }

    Ok(())
}

// A bare number picks one of the options offered by the previous reply.
fn parse_selection(input: &str, pending: &[(String, Choice)]) -> Option<Choice> {
    let index: usize = input.parse().ok()?;
    pending.get(index.checked_sub(1)?).map(|(_, c)| c.clone())
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.text);
    for (index, (label, _)) in reply.choices.iter().enumerate() {
        println!("  [{}] {}", index + 1, label);
    }
}
