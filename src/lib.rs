//! # Shkolnik Telegram Bot
//!
//! A study-helper bot for school students (grades 9–11): scans photographed
//! pages with OCR, translates short snippets between Russian and English,
//! proxies Google searches with paginated results, and looks up GDZ
//! (answer-key) images for textbooks by grade, subject and task number.

pub mod bot;
pub mod callback;
pub mod chat;
pub mod db;
pub mod dialogue;
pub mod gdz;
pub mod ocr;
pub mod pagination;
pub mod search;
pub mod translate;
