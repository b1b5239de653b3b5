//! Per-user conversation state for the multi-step flows.
//!
//! State lives in teloxide's [`InMemStorage`], keyed by chat. It is
//! intentionally not persisted: a restart drops every in-flight
//! conversation back to [`ChatState::Idle`].

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::translate::Lang;

/// Current step of a user's multi-step interaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatState {
    #[default]
    Idle,
    /// Scan flow: the next photo message is downloaded and run through OCR.
    AwaitingPhoto,
    /// Translate flow: waiting for the source-language button.
    ChoosingSourceLanguage,
    /// Translate flow: waiting for the target-language button.
    ChoosingTargetLanguage { source: Option<Lang> },
    /// Translate flow: the next text message is translated. Either language
    /// can still be absent when the user arrives here through stale state;
    /// the handler re-checks before calling the translation adapter.
    Translating {
        source: Option<Lang>,
        target: Option<Lang>,
    },
    /// GDZ flow: the next text message is a task number for `textbook`.
    AwaitingTaskNumber { textbook: String },
}

/// Dialogue handle used by all handlers.
pub type ChatDialogue = Dialogue<ChatState, InMemStorage<ChatState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(ChatState::default(), ChatState::Idle);
    }

    #[test]
    fn test_translating_state_carries_both_languages() {
        let state = ChatState::Translating {
            source: Some(Lang::English),
            target: Some(Lang::Russian),
        };
        match state {
            ChatState::Translating { source, target } => {
                assert_eq!(source, Some(Lang::English));
                assert_eq!(target, Some(Lang::Russian));
            }
            _ => panic!("Unexpected state"),
        }
    }
}
