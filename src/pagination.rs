//! Cursor logic for paginated search results.
//!
//! A results page shows one of up to three links with inline Back/Forward
//! buttons. The Back button is hidden on the first page and Forward on the
//! last; [`navigate`] re-validates bounds anyway, so a stale button press is
//! a no-op.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::callback::CallbackPayload;

/// Which way a pagination button moves the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Back => "back",
            Direction::Forward => "fwd",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Direction> {
        match tag {
            "back" => Some(Direction::Back),
            "fwd" => Some(Direction::Forward),
            _ => None,
        }
    }
}

/// Compute the index one step from `current`, or `None` when the step would
/// leave `[0, len)` or `current` itself is already out of range.
pub fn navigate(current: usize, direction: Direction, len: usize) -> Option<usize> {
    if current >= len {
        return None;
    }
    match direction {
        Direction::Back => current.checked_sub(1),
        Direction::Forward => {
            let next = current + 1;
            (next < len).then_some(next)
        }
    }
}

/// Text of the results message for the link at `index`.
pub fn page_text(links: &[String], index: usize) -> String {
    format!("Результат {} из {}:\n{}", index + 1, links.len(), links[index])
}

/// Inline keyboard for the page at `index`. Buttons carry the shown index;
/// the handler derives the target from the direction.
pub fn page_keyboard(
    index: usize,
    len: usize,
    user_id: i64,
    message_id: i32,
) -> InlineKeyboardMarkup {
    let mut row = Vec::new();

    if index > 0 {
        row.push(InlineKeyboardButton::callback(
            "⬅️ Назад",
            CallbackPayload::Page {
                direction: Direction::Back,
                index,
                user_id,
                message_id,
            }
            .encode(),
        ));
    }
    if index + 1 < len {
        row.push(InlineKeyboardButton::callback(
            "Вперед ➡️",
            CallbackPayload::Page {
                direction: Direction::Forward,
                index,
                user_id,
                message_id,
            }
            .encode(),
        ));
    }

    InlineKeyboardMarkup::new(vec![row])
}
