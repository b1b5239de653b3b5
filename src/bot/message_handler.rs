//! Message Handler module for commands, menu buttons and state-driven text

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::utils::command::BotCommands;

use crate::chat::try_delete_message;
use crate::db::Grade;
use crate::dialogue::{ChatDialogue, ChatState};
use crate::gdz;
use crate::ocr;
use crate::pagination::{page_keyboard, page_text};
use crate::search;
use crate::translate::{self, resolve_pair};

use super::ui_builder::{
    cancel_keyboard, grade_keyboard, main_menu_keyboard, source_language_keyboard,
    subjects_keyboard, BTN_CHANGE_CLASS, BTN_GDZ, BTN_GOOGLE, BTN_HELP, BTN_SCAN, BTN_TRANSLATE,
};
use super::AppState;

/// Commands understood by the bot. Every multi-step feature is also
/// reachable through the main-menu buttons.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "регистрация и главное меню")]
    Start,
    #[command(description = "справка")]
    Help,
    #[command(description = "распознать текст с фото")]
    ScanText,
    #[command(description = "перевести текст")]
    Translate,
    #[command(description = "загуглить вопрос")]
    Search(String),
    #[command(description = "открыть ГДЗ")]
    Gdz,
    #[command(description = "изменить класс")]
    ChangeClass,
    #[command(description = "отменить текущее действие")]
    Cancel,
}

pub async fn command_handler(
    bot: Bot,
    state: Arc<AppState>,
    dialogue: ChatDialogue,
    msg: Message,
    cmd: Command,
) -> Result<()> {
    match cmd {
        Command::Start => handle_start(&bot, &state, &msg).await,
        Command::Help => handle_help(&bot, &msg).await,
        Command::ScanText => start_scan_flow(&bot, &dialogue, &msg).await,
        Command::Translate => start_translate_flow(&bot, &dialogue, &msg).await,
        Command::Search(query) => handle_search(&bot, &state, &msg, query.trim()).await,
        Command::Gdz => start_gdz_flow(&bot, &state, &msg).await,
        Command::ChangeClass => handle_change_class(&bot, &msg).await,
        Command::Cancel => handle_cancel(&bot, &dialogue, &msg).await,
    }
}

pub async fn message_handler(
    bot: Bot,
    state: Arc<AppState>,
    dialogue: ChatDialogue,
    msg: Message,
) -> Result<()> {
    let chat_state = dialogue.get().await?.unwrap_or_default();

    if let Some(text) = msg.text() {
        // A grade string is a grade selection no matter which flow is active
        if let Some(grade) = Grade::parse(text) {
            return handle_grade_selection(&bot, &state, &msg, grade).await;
        }

        match chat_state {
            ChatState::Idle => match text {
                BTN_SCAN => start_scan_flow(&bot, &dialogue, &msg).await,
                BTN_TRANSLATE => start_translate_flow(&bot, &dialogue, &msg).await,
                BTN_GOOGLE => {
                    bot.send_message(
                        msg.chat.id,
                        "Напишите /search и ваш запрос, например: /search теорема Пифагора",
                    )
                    .await?;
                    Ok(())
                }
                BTN_GDZ => start_gdz_flow(&bot, &state, &msg).await,
                BTN_CHANGE_CLASS => handle_change_class(&bot, &msg).await,
                BTN_HELP => handle_help(&bot, &msg).await,
                _ => {
                    debug!("Ignoring unmatched text from chat {}", msg.chat.id);
                    Ok(())
                }
            },
            ChatState::Translating { source, target } => {
                handle_translation_input(&bot, &state, &dialogue, &msg, text, source, target).await
            }
            ChatState::AwaitingTaskNumber { textbook } => {
                handle_task_number(&bot, &state, &dialogue, &msg, text, &textbook).await
            }
            // Scan and the language pickers accept no free text
            _ => Ok(()),
        }
    } else if msg.photo().is_some() {
        match chat_state {
            ChatState::AwaitingPhoto => handle_photo(&bot, &state, &dialogue, &msg).await,
            _ => Ok(()),
        }
    } else {
        Ok(())
    }
}

fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .map(|u| u.id.0 as i64)
        .unwrap_or(msg.chat.id.0)
}

fn sender_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| "друг".to_string())
}

async fn handle_start(bot: &Bot, state: &Arc<AppState>, msg: &Message) -> Result<()> {
    let user_id = sender_id(msg);
    info!("Received /start from user {user_id}");

    if state.repo.find_user(user_id).await?.is_none() {
        bot.send_message(
            msg.chat.id,
            "Привет! Вы не зарегистрированы. Выберите ваш класс:",
        )
        .reply_markup(grade_keyboard())
        .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, format!("Привет, {}", sender_name(msg)))
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

async fn handle_help(bot: &Bot, msg: &Message) -> Result<()> {
    let help = format!(
        "Я помогаю с учебой: сканирую текст с фото, перевожу между русским и \
         английским, ищу ответы в Google и открываю ГДЗ по учебникам.\n\n{}",
        Command::descriptions()
    );
    bot.send_message(msg.chat.id, help)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

async fn handle_grade_selection(
    bot: &Bot,
    state: &Arc<AppState>,
    msg: &Message,
    grade: Grade,
) -> Result<()> {
    let user_id = sender_id(msg);

    if state.repo.find_user(user_id).await?.is_none() {
        state.repo.add_user(user_id, grade).await?;
        bot.send_message(
            msg.chat.id,
            format!("Вы успешно зарегистрированы! Ваш класс {grade}-ый."),
        )
        .await?;
    } else {
        state.repo.update_user_grade(user_id, grade).await?;
        bot.send_message(
            msg.chat.id,
            format!("Ваш класс успешно изменен на {grade}!"),
        )
        .await?;
    }

    bot.send_message(msg.chat.id, format!("Привет, {}", sender_name(msg)))
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

async fn handle_change_class(bot: &Bot, msg: &Message) -> Result<()> {
    bot.send_message(msg.chat.id, "Выберите новый класс:")
        .reply_markup(grade_keyboard())
        .await?;
    Ok(())
}

async fn start_scan_flow(bot: &Bot, dialogue: &ChatDialogue, msg: &Message) -> Result<()> {
    bot.send_message(msg.chat.id, "Пришли мне фото, чтобы я мог его отсканировать.")
        .reply_markup(cancel_keyboard())
        .await?;
    dialogue.update(ChatState::AwaitingPhoto).await?;
    Ok(())
}

async fn handle_photo(
    bot: &Bot,
    state: &Arc<AppState>,
    dialogue: &ChatDialogue,
    msg: &Message,
) -> Result<()> {
    let user_id = sender_id(msg);
    let Some(photos) = msg.photo() else {
        return Ok(());
    };
    // Variants come smallest first; scan the highest resolution
    let Some(largest_photo) = photos.last() else {
        return Ok(());
    };

    info!("Received photo to scan from user {user_id}");

    let photo_path = match download_photo(bot, state, largest_photo.file.id.clone(), user_id).await
    {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to download photo for user {user_id}: {e:?}");
            bot.send_message(msg.chat.id, "Не удалось загрузить фото. Попробуйте еще раз.")
                .await?;
            return Ok(());
        }
    };

    if !ocr::is_supported_image_format(&photo_path) {
        warn!("Unsupported image format from user {user_id}");
        bot.send_message(msg.chat.id, "Этот формат изображения не поддерживается.")
            .reply_markup(main_menu_keyboard())
            .await?;
        dialogue.update(ChatState::Idle).await?;
        return Ok(());
    }

    match ocr::extract_text_from_image(&photo_path).await {
        Ok(text) if text.is_empty() => {
            bot.send_message(msg.chat.id, "Не удалось распознать текст на фото.")
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        Ok(text) => {
            bot.send_message(msg.chat.id, text)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        Err(e) => {
            error!("OCR failed for user {user_id}: {e:?}");
            bot.send_message(msg.chat.id, "Не получилось распознать текст. Попробуйте еще раз.")
                .reply_markup(main_menu_keyboard())
                .await?;
        }
    }

    dialogue.update(ChatState::Idle).await?;
    Ok(())
}

/// Download the photo to the per-user scan path, overwriting the previous
/// scan for this user.
async fn download_photo(
    bot: &Bot,
    state: &Arc<AppState>,
    file_id: teloxide::types::FileId,
    user_id: i64,
) -> Result<String> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let bytes = state
        .http
        .get(&url)
        .send()
        .await
        .context("Photo download request failed")?
        .bytes()
        .await
        .context("Failed to read photo bytes")?;

    let path = state.photos_dir.join(format!("{user_id}.jpg"));
    std::fs::write(&path, &bytes).context("Failed to store downloaded photo")?;

    Ok(path.to_string_lossy().to_string())
}

async fn start_translate_flow(bot: &Bot, dialogue: &ChatDialogue, msg: &Message) -> Result<()> {
    bot.send_message(msg.chat.id, "Выберите язык, с которого нужно перевести:")
        .reply_markup(source_language_keyboard())
        .await?;
    dialogue.update(ChatState::ChoosingSourceLanguage).await?;
    Ok(())
}

async fn handle_translation_input(
    bot: &Bot,
    state: &Arc<AppState>,
    dialogue: &ChatDialogue,
    msg: &Message,
    text: &str,
    source: Option<translate::Lang>,
    target: Option<translate::Lang>,
) -> Result<()> {
    // The one defensive check of the conversation flows: stale state may
    // reach this step without both languages, and then the adapter must
    // not be called.
    let Some((source, target)) = resolve_pair(source, target) else {
        warn!("Translation state missing a language for chat {}", msg.chat.id);
        bot.send_message(msg.chat.id, "Что-то пошло не так. Пожалуйста, попробуйте еще раз.")
            .await?;
        return Ok(());
    };

    match translate::translate_text(&state.http, text, source, target).await {
        Ok(translated) => {
            bot.send_message(msg.chat.id, translated)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        Err(e) => {
            error!("Translation failed for chat {}: {e:?}", msg.chat.id);
            bot.send_message(msg.chat.id, "Не удалось перевести текст. Попробуйте еще раз.")
                .await?;
        }
    }

    dialogue.update(ChatState::Idle).await?;
    Ok(())
}

async fn handle_search(
    bot: &Bot,
    state: &Arc<AppState>,
    msg: &Message,
    query: &str,
) -> Result<()> {
    if query.is_empty() {
        bot.send_message(msg.chat.id, "Использование: /search <запрос>")
            .await?;
        return Ok(());
    }

    let user_id = sender_id(msg);
    info!("Search from user {user_id}: {query}");

    let links = search::resolve_links(&state.repo, &state.search, user_id, query).await?;
    if links.is_empty() {
        bot.send_message(msg.chat.id, "По запросу ничего не найдено.")
            .await?;
        return Ok(());
    }

    // Send the first page, then attach the keyboard once the message id
    // is known: the pagination buttons carry it, so the callback knows
    // which message to edit without any shared reference.
    let sent = bot.send_message(msg.chat.id, page_text(&links, 0)).await?;
    bot.edit_message_reply_markup(msg.chat.id, sent.id)
        .reply_markup(page_keyboard(0, links.len(), user_id, sent.id.0))
        .await?;
    Ok(())
}

async fn start_gdz_flow(bot: &Bot, state: &Arc<AppState>, msg: &Message) -> Result<()> {
    let user_id = sender_id(msg);
    let Some(grade) = state.repo.grade_of(user_id).await? else {
        bot.send_message(msg.chat.id, "Сначала выберите класс: /start")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Выберите предмет:")
        .reply_markup(subjects_keyboard(grade))
        .await?;
    Ok(())
}

async fn handle_task_number(
    bot: &Bot,
    state: &Arc<AppState>,
    dialogue: &ChatDialogue,
    msg: &Message,
    task: &str,
    textbook: &str,
) -> Result<()> {
    let user_id = sender_id(msg);
    let Some(grade) = state.repo.grade_of(user_id).await? else {
        bot.send_message(msg.chat.id, "Сначала выберите класс: /start")
            .await?;
        dialogue.update(ChatState::Idle).await?;
        return Ok(());
    };

    let Some((prefix, suffix)) = state.repo.textbook_url(grade, textbook).await? else {
        warn!("Textbook {textbook} missing for grade {grade}");
        bot.send_message(msg.chat.id, "Учебник не найден. Начните заново: /gdz")
            .await?;
        dialogue.update(ChatState::Idle).await?;
        return Ok(());
    };

    let url = gdz::compose_task_url(&prefix, task, &suffix);
    let images = match gdz::fetch_task_images(&state.http, &url).await {
        Ok(images) => images,
        Err(e) => {
            error!("GDZ page fetch failed for user {user_id}: {e:?}");
            bot.send_message(msg.chat.id, "Не удалось открыть страницу с ответом. Попробуйте позже.")
                .await?;
            return Ok(());
        }
    };

    if images.is_empty() {
        bot.send_message(msg.chat.id, "Задание не найдено. Попробуйте другой номер.")
            .await?;
    } else {
        for image in &images {
            bot.send_message(msg.chat.id, image.clone()).await?;
        }
    }

    if let Some(next) = gdz::state_after_lookup(images.len()) {
        dialogue.update(next).await?;
    }
    Ok(())
}

async fn handle_cancel(bot: &Bot, dialogue: &ChatDialogue, msg: &Message) -> Result<()> {
    dialogue.update(ChatState::Idle).await?;

    // Cosmetic cleanup of the two preceding prompt messages; failure to
    // delete is an ordinary outcome, not an error
    for offset in 1..=2 {
        let target = MessageId(msg.id.0 - offset);
        match try_delete_message(bot, msg.chat.id, target).await {
            Ok(outcome) => debug!("Cancel cleanup of message {target:?}: {outcome:?}"),
            Err(e) => warn!("Cancel cleanup of message {target:?} failed: {e:?}"),
        }
    }

    bot.send_message(msg.chat.id, "Действие отменено.")
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}
