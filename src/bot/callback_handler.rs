//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;

use crate::callback::CallbackPayload;
use crate::chat::{try_edit_text, EditOutcome};
use crate::dialogue::{ChatDialogue, ChatState};
use crate::pagination::{navigate, page_keyboard, page_text, Direction};
use crate::search::cached_links;
use crate::translate::Lang;

use super::ui_builder::{target_language_keyboard, textbooks_keyboard};
use super::AppState;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    state: Arc<AppState>,
    dialogue: ChatDialogue,
    q: CallbackQuery,
) -> Result<()> {
    debug!("Received callback query from user {}", q.from.id);

    let payload = match q.data.as_deref().map(CallbackPayload::decode) {
        Some(Ok(payload)) => payload,
        Some(Err(e)) => {
            warn!("Rejected callback from user {}: {e}", q.from.id);
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
        None => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };

    if let Some(msg) = &q.message {
        let chat_id = msg.chat().id;
        let message_id = msg.id();
        let user_id = q.from.id.0 as i64;
        let chat_state = dialogue.get().await?.unwrap_or_default();

        match payload {
            CallbackPayload::SourceLanguage(lang) => {
                handle_source_language(&bot, &dialogue, chat_state, chat_id, message_id, lang)
                    .await?;
            }
            CallbackPayload::TargetLanguage(lang) => {
                handle_target_language(&bot, &dialogue, chat_state, chat_id, message_id, lang)
                    .await?;
            }
            CallbackPayload::Subject(subject) => {
                handle_subject(&bot, &state, chat_id, message_id, user_id, &subject).await?;
            }
            CallbackPayload::Textbook(name) => {
                dialogue
                    .update(ChatState::AwaitingTaskNumber { textbook: name })
                    .await?;
                try_edit_text(&bot, chat_id, message_id, "Введите номер задания:", None).await?;
            }
            CallbackPayload::Page {
                direction,
                index,
                user_id: owner,
                message_id: results_message,
            } => {
                // Buttons stay functional for the owner only; anyone else
                // tapping a forwarded keyboard is ignored
                if owner == user_id {
                    handle_page(&bot, &state, chat_id, owner, direction, index, results_message)
                        .await?;
                }
            }
        }
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn handle_source_language(
    bot: &Bot,
    dialogue: &ChatDialogue,
    chat_state: ChatState,
    chat_id: ChatId,
    message_id: MessageId,
    lang: Lang,
) -> Result<()> {
    if chat_state != ChatState::ChoosingSourceLanguage {
        debug!("Ignoring source-language callback outside the translate flow");
        return Ok(());
    }

    try_edit_text(
        bot,
        chat_id,
        message_id,
        "Теперь выберите язык, на который нужно перевести:",
        Some(target_language_keyboard()),
    )
    .await?;
    dialogue
        .update(ChatState::ChoosingTargetLanguage { source: Some(lang) })
        .await?;
    Ok(())
}

async fn handle_target_language(
    bot: &Bot,
    dialogue: &ChatDialogue,
    chat_state: ChatState,
    chat_id: ChatId,
    message_id: MessageId,
    lang: Lang,
) -> Result<()> {
    let ChatState::ChoosingTargetLanguage { source } = chat_state else {
        debug!("Ignoring target-language callback outside the translate flow");
        return Ok(());
    };

    try_edit_text(
        bot,
        chat_id,
        message_id,
        "Отлично! Теперь отправьте текст для перевода:",
        None,
    )
    .await?;
    dialogue
        .update(ChatState::Translating {
            source,
            target: Some(lang),
        })
        .await?;
    Ok(())
}

async fn handle_subject(
    bot: &Bot,
    state: &Arc<AppState>,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    subject: &str,
) -> Result<()> {
    let Some(grade) = state.repo.grade_of(user_id).await? else {
        try_edit_text(bot, chat_id, message_id, "Сначала выберите класс: /start", None).await?;
        return Ok(());
    };

    let books = state.repo.textbooks(grade, subject).await?;
    if books.is_empty() {
        try_edit_text(
            bot,
            chat_id,
            message_id,
            "По этому предмету учебников пока нет.",
            None,
        )
        .await?;
        return Ok(());
    }

    try_edit_text(
        bot,
        chat_id,
        message_id,
        "Выберите учебник:",
        Some(textbooks_keyboard(&books)),
    )
    .await?;
    Ok(())
}

async fn handle_page(
    bot: &Bot,
    state: &Arc<AppState>,
    chat_id: ChatId,
    user_id: i64,
    direction: Direction,
    index: usize,
    results_message: i32,
) -> Result<()> {
    let links = cached_links(&state.repo, user_id).await?;

    // Bounds are re-validated here; a stale button press outside the list
    // is a no-op
    let Some(next) = navigate(index, direction, links.len()) else {
        debug!("Pagination no-op for user {user_id}: index {index} of {}", links.len());
        return Ok(());
    };

    let text = page_text(&links, next);
    let keyboard = page_keyboard(next, links.len(), user_id, results_message);

    let outcome = try_edit_text(
        bot,
        chat_id,
        MessageId(results_message),
        &text,
        Some(keyboard),
    )
    .await?;

    if outcome != EditOutcome::Edited {
        // The results message is gone; start a fresh one and rebind the
        // keyboard to its id
        debug!("Results message {results_message} not editable ({outcome:?}), sending a new one");
        let sent = bot.send_message(chat_id, text).await?;
        bot.edit_message_reply_markup(chat_id, sent.id)
            .reply_markup(page_keyboard(next, links.len(), user_id, sent.id.0))
            .await?;
    }

    Ok(())
}
