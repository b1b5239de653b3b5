//! Translation adapter over the public Google translate endpoint.
//!
//! The bot supports exactly two languages; [`Lang`] maps the Russian button
//! titles to ISO codes.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// A language the bot can translate from or to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lang {
    Russian,
    English,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::English, Lang::Russian];

    /// Button title shown in the language picker.
    pub fn title(self) -> &'static str {
        match self {
            Lang::Russian => "Русский",
            Lang::English => "Английский",
        }
    }

    /// ISO 639-1 code used by the translation endpoint.
    pub fn code(self) -> &'static str {
        match self {
            Lang::Russian => "ru",
            Lang::English => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Lang> {
        match code {
            "ru" => Some(Lang::Russian),
            "en" => Some(Lang::English),
            _ => None,
        }
    }
}

/// Resolve the accumulated dialogue data into a concrete language pair.
/// Returns `None` when either side is missing — the caller must not invoke
/// the translation adapter in that case.
pub fn resolve_pair(source: Option<Lang>, target: Option<Lang>) -> Option<(Lang, Lang)> {
    Some((source?, target?))
}

/// Translate `text` verbatim from `source` to `target`.
pub async fn translate_text(
    client: &reqwest::Client,
    text: &str,
    source: Lang,
    target: Lang,
) -> Result<String> {
    info!(
        "Translating {} characters {} -> {}",
        text.len(),
        source.code(),
        target.code()
    );

    let response = client
        .get(TRANSLATE_URL)
        .query(&[
            ("client", "gtx"),
            ("sl", source.code()),
            ("tl", target.code()),
            ("dt", "t"),
            ("q", text),
        ])
        .send()
        .await
        .context("Translation request failed")?
        .error_for_status()
        .context("Translation endpoint returned an error status")?;

    let body: serde_json::Value = response
        .json()
        .await
        .context("Failed to parse translation response")?;

    Ok(collect_translation(&body))
}

/// The endpoint answers with nested arrays; the translated text is the first
/// element of each segment under the first top-level array.
fn collect_translation(body: &serde_json::Value) -> String {
    body.get(0)
        .and_then(|segments| segments.as_array())
        .map(|segments| {
            segments
                .iter()
                .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}
