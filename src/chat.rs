//! Thin adapter over the chat platform's edit/delete calls.
//!
//! "Message is gone" and "message cannot be touched" are ordinary outcomes
//! for this bot (cosmetic cleanup, pagination edits), so they come back as
//! enum variants instead of errors; only transport-level failures propagate.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use teloxide::{ApiError, RequestError};

/// Outcome of editing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The target message no longer exists (or was never ours to edit).
    NotFound,
    /// The platform refuses the edit.
    Forbidden,
}

/// Outcome of deleting a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Forbidden,
}

/// Edit a message's text (and keyboard), reporting a missing target as an
/// outcome rather than an error.
pub async fn try_edit_text(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<EditOutcome> {
    let request = bot.edit_message_text(chat_id, message_id, text);
    let result = match markup {
        Some(markup) => request.reply_markup(markup).await,
        None => request.await,
    };

    match result {
        Ok(_) => Ok(EditOutcome::Edited),
        // An identical re-render is as good as an edit
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(EditOutcome::Edited),
        Err(RequestError::Api(ApiError::MessageToEditNotFound))
        | Err(RequestError::Api(ApiError::MessageIdInvalid)) => Ok(EditOutcome::NotFound),
        Err(RequestError::Api(ApiError::MessageCantBeEdited)) => Ok(EditOutcome::Forbidden),
        Err(e) => Err(e.into()),
    }
}

/// Delete a message, reporting refusal or absence as outcomes.
pub async fn try_delete_message(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
) -> Result<DeleteOutcome> {
    match bot.delete_message(chat_id, message_id).await {
        Ok(_) => Ok(DeleteOutcome::Deleted),
        Err(RequestError::Api(ApiError::MessageToDeleteNotFound))
        | Err(RequestError::Api(ApiError::MessageIdInvalid)) => Ok(DeleteOutcome::NotFound),
        Err(RequestError::Api(ApiError::MessageCantBeDeleted)) => Ok(DeleteOutcome::Forbidden),
        Err(e) => Err(e.into()),
    }
}
