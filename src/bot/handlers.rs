use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Document, KeyboardButton, KeyboardMarkup};
use tracing::{info, warn};

use crate::AppState;
use crate::error::RelayError;
use crate::services::pending::ConversationState;
use crate::services::resolver::{Decision, DecisionTokens};
use crate::services::staging;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> Result<()> {
    if let Some(document) = msg.document() {
        handle_document(&bot, &msg, &state, document).await?;
    } else if let Some(text) = msg.text() {
        handle_text(&bot, &msg, &state, text).await?;
    }
    Ok(())
}

/// Receive a document, stage it locally and relay it to the backend.
async fn handle_document(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    document: &Document,
) -> Result<()> {
    let chat = msg.chat.id;
    let file_name = document
        .file_name
        .clone()
        .unwrap_or_else(|| "document".to_string());

    // Acknowledge before staging so the user is not left waiting blind.
    bot.send_message(chat, format!("📄 Received your file: {file_name}\nProcessing..."))
        .await?;

    let staged_path = match stage_document(bot, document, &file_name).await {
        Ok(path) => path,
        Err(err) => {
            warn!(chat = chat.0, "staging failed: {err}");
            bot.send_message(chat, format!("❌ Failed to process the file: {err}"))
                .await?;
            return Ok(());
        }
    };

    info!(
        chat = chat.0,
        file = %file_name,
        staged = %staged_path.display(),
        "staged inbound document"
    );

    let outcome = state.relay.process(chat.0, staged_path, &file_name).await;

    let mut request = bot.send_message(chat, outcome.reply);
    if outcome.prompt_decision {
        request = request.reply_markup(decision_keyboard(state.resolver.tokens()));
    }
    request.await?;
    Ok(())
}

/// Route free text: commands are answered directly, decision text goes to
/// the resolver, anything else outside a duplicate prompt is ignored.
async fn handle_text(bot: &Bot, msg: &Message, state: &AppState, text: &str) -> Result<()> {
    if text.starts_with('/') {
        if matches!(text, "/start" | "/help") {
            bot.send_message(msg.chat.id, welcome_text(state.resolver.tokens()))
                .await?;
        }
        return Ok(());
    }

    let chat = msg.chat.id;
    if state.conversations.state(chat.0) != ConversationState::AwaitingDecision {
        return Ok(());
    }

    if state.resolver.tokens().classify(text) == Some(Decision::Overwrite) {
        bot.send_message(chat, "Overwriting file, please wait...")
            .await?;
    }

    let resolution = state.resolver.resolve(chat.0, text).await;
    bot.send_message(chat, resolution.reply).await?;
    Ok(())
}

/// Download the Telegram document into a staged temp file. On failure the
/// partially written file is removed before the error propagates.
async fn stage_document(
    bot: &Bot,
    document: &Document,
    file_name: &str,
) -> Result<PathBuf, RelayError> {
    let path =
        staging::allocate_staged(file_name).map_err(|err| RelayError::Staging(err.to_string()))?;

    if let Err(err) = download_into(bot, &document.file.id, &path).await {
        staging::discard_staged(&path);
        return Err(RelayError::Staging(err.to_string()));
    }
    Ok(path)
}

async fn download_into(bot: &Bot, file_id: &str, dest: &Path) -> Result<()> {
    let file = bot.get_file(file_id).await?;
    let mut out = tokio::fs::File::create(dest).await?;
    bot.download_file(&file.path, &mut out).await?;
    Ok(())
}

fn decision_keyboard(tokens: &DecisionTokens) -> KeyboardMarkup {
    let row = tokens.labels().map(KeyboardButton::new).to_vec();
    KeyboardMarkup::new(vec![row])
        .one_time_keyboard(true)
        .resize_keyboard(true)
}

fn welcome_text(tokens: &DecisionTokens) -> String {
    format!(
        "Bot ready. Send a file to upload it.\n\n\
         If the file already exists you can answer with the buttons:\n\
         • {} – overwrite\n\
         • {} – skip\n\
         • {} – cancel",
        tokens.overwrite, tokens.skip, tokens.cancel
    )
}
