//! UI Builder module for creating keyboards and button labels

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

use crate::callback::CallbackPayload;
use crate::db::Grade;
use crate::translate::Lang;

// Main-menu button labels. The message handler matches incoming text
// against these, so they double as command aliases.
pub const BTN_SCAN: &str = "Сканировать текст 📸";
pub const BTN_TRANSLATE: &str = "Перевести текст 🌐";
pub const BTN_GOOGLE: &str = "Загуглить вопрос 🔎";
pub const BTN_GDZ: &str = "Открыть ГДЗ 📚";
pub const BTN_CHANGE_CLASS: &str = "Изменить класс 🎒";
pub const BTN_HELP: &str = "Помощь ❓";

/// The persistent reply keyboard with every feature entry point.
pub fn main_menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BTN_SCAN), KeyboardButton::new(BTN_TRANSLATE)],
        vec![KeyboardButton::new(BTN_GOOGLE), KeyboardButton::new(BTN_GDZ)],
        vec![KeyboardButton::new(BTN_CHANGE_CLASS), KeyboardButton::new(BTN_HELP)],
    ])
    .resize_keyboard()
}

/// Grade picker shown at registration and on class change.
pub fn grade_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![Grade::ALL
        .iter()
        .map(|grade| KeyboardButton::new(grade.to_string()))
        .collect::<Vec<_>>()])
    .resize_keyboard()
}

/// Single-button keyboard offered while a multi-step flow is active.
pub fn cancel_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new("/cancel")]]).resize_keyboard()
}

/// Inline source-language picker for the translate flow.
pub fn source_language_keyboard() -> InlineKeyboardMarkup {
    language_keyboard(CallbackPayload::SourceLanguage)
}

/// Inline target-language picker for the translate flow.
pub fn target_language_keyboard() -> InlineKeyboardMarkup {
    language_keyboard(CallbackPayload::TargetLanguage)
}

fn language_keyboard(payload: fn(Lang) -> CallbackPayload) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        Lang::ALL
            .iter()
            .map(|&lang| {
                vec![InlineKeyboardButton::callback(
                    lang.title(),
                    payload(lang).encode(),
                )]
            })
            .collect::<Vec<_>>(),
    )
}

/// Inline subject picker for the GDZ flow.
pub fn subjects_keyboard(grade: Grade) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        crate::gdz::subjects(grade)
            .iter()
            .map(|&subject| {
                vec![InlineKeyboardButton::callback(
                    subject,
                    CallbackPayload::Subject(subject.to_string()).encode(),
                )]
            })
            .collect::<Vec<_>>(),
    )
}

/// Inline textbook picker for the GDZ flow.
pub fn textbooks_keyboard(books: &[String]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        books
            .iter()
            .map(|name| {
                vec![InlineKeyboardButton::callback(
                    name.clone(),
                    CallbackPayload::Textbook(name.clone()).encode(),
                )]
            })
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_has_all_feature_buttons() {
        let kb = main_menu_keyboard();
        let labels: Vec<String> = kb
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect();
        for expected in [BTN_SCAN, BTN_TRANSLATE, BTN_GOOGLE, BTN_GDZ, BTN_CHANGE_CLASS, BTN_HELP]
        {
            assert!(labels.iter().any(|l| l == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_grade_keyboard_is_the_fixed_set() {
        let kb = grade_keyboard();
        let labels: Vec<String> = kb
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect();
        assert_eq!(labels, vec!["9", "10", "11"]);
    }

    #[test]
    fn test_language_keyboards_encode_decodable_payloads() {
        use crate::callback::CallbackPayload;
        use teloxide::types::InlineKeyboardButtonKind;

        for kb in [source_language_keyboard(), target_language_keyboard()] {
            for button in kb.inline_keyboard.iter().flatten() {
                let InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
                    panic!("language button should carry callback data");
                };
                assert!(CallbackPayload::decode(data).is_ok());
            }
        }
    }
}
