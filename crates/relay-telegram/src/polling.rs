//! Long-polling transport.

use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{debug, info};

use crate::{inbound, AppState};

/// Drop any registered webhook and dispatch updates until Ctrl-C.
pub async fn run_polling(bot: Bot, app: Arc<AppState>) -> anyhow::Result<()> {
    bot.delete_webhook().await?;
    if let Ok(me) = bot.get_me().await {
        info!(username = %me.username(), "relay bot started (polling)");
    }

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(on_callback))
        .branch(Update::filter_message().endpoint(on_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn on_message(msg: Message, app: Arc<AppState>) -> ResponseResult<()> {
    match inbound::from_message(&msg) {
        Some(event) => app.deliver(event).await,
        None => debug!(chat_id = msg.chat.id.0, "ignoring message without relayable content"),
    }
    Ok(())
}

async fn on_callback(q: CallbackQuery, app: Arc<AppState>) -> ResponseResult<()> {
    app.deliver(inbound::from_callback(&q)).await;
    Ok(())
}
