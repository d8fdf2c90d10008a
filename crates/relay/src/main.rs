use std::sync::Arc;

use relay_core::{
    config::{Config, UpdateMode},
    dialog::DialogStore,
    messaging::port::ChatClient,
    router::Router,
};
use relay_sqlite::SqliteDialogStore;
use relay_telegram::{polling, webhook, AppState, TelegramChatClient};
use teloxide::Bot;

#[tokio::main]
async fn main() -> Result<(), relay_core::Error> {
    relay_core::logging::init("relay")?;

    let cfg = Config::load()?;
    let store: Arc<dyn DialogStore> = Arc::new(SqliteDialogStore::open(&cfg.database_path)?);
    tracing::info!(path = %cfg.database_path.display(), "dialog store opened");

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let chat: Arc<dyn ChatClient> =
        Arc::new(TelegramChatClient::new(bot.clone(), cfg.operator_chat_id));
    let router = Arc::new(Router::new(cfg.operator_chat_id, chat.clone(), store));
    let app = Arc::new(AppState { router, chat });

    let run = match &cfg.update_mode {
        UpdateMode::Polling => polling::run_polling(bot, app).await,
        UpdateMode::Webhook(wh) => webhook::run_webhook(bot, app, wh).await,
    };
    run.map_err(|e| relay_core::Error::Chat(format!("telegram transport failed: {e}")))?;

    Ok(())
}
