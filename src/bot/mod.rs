pub mod handlers;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::AppState;

/// Long-polling dispatcher; services all chats until the process is
/// terminated (Ctrl+C is handled by the dispatcher itself).
pub async fn run(bot: Bot, state: Arc<AppState>) {
    let handler = Update::filter_message().endpoint(handlers::handle_message);

    info!("starting Telegram dispatcher");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
