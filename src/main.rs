use anyhow::Result;
use log::info;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use shkolnik::bot::{self, AppState, Command};
use shkolnik::db::Repository;
use shkolnik::dialogue::ChatState;
use shkolnik::search::GoogleSearch;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    info!("Starting Shkolnik Telegram Bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");
    let database_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "bot.db".to_string());
    let photos_dir = PathBuf::from(env::var("PHOTOS_DIR").unwrap_or_else(|_| "photos".to_string()));

    info!("Initializing database at: {}", database_path);
    let repo = Repository::open(&database_path)?;

    std::fs::create_dir_all(&photos_dir)?;

    let http = reqwest::Client::new();
    let state = Arc::new(AppState {
        repo,
        search: GoogleSearch::new(http.clone()),
        http,
        photos_dir,
    });

    let bot = Bot::new(bot_token);

    info!("Bot initialized, starting dispatcher");

    let message_handler = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<ChatState>, ChatState>()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(bot::command_handler),
        )
        .branch(dptree::endpoint(bot::message_handler));

    let callback_handler = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, InMemStorage<ChatState>, ChatState>()
        .endpoint(bot::callback_handler);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, InMemStorage::<ChatState>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
