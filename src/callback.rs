//! Typed callback payloads for inline keyboards.
//!
//! Every inline button encodes one [`CallbackPayload`] variant; the callback
//! handler decodes with [`CallbackPayload::decode`] and rejects anything
//! malformed instead of pattern-matching on raw strings.

use crate::pagination::Direction;
use crate::translate::Lang;

/// Everything an inline button of this bot can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackPayload {
    /// Translate flow: source language picked.
    SourceLanguage(Lang),
    /// Translate flow: target language picked.
    TargetLanguage(Lang),
    /// GDZ flow: subject picked.
    Subject(String),
    /// GDZ flow: textbook picked.
    Textbook(String),
    /// Search pagination: move from `index` in `direction`. The payload
    /// carries the owning user and the results message to edit, so no
    /// process-wide "last message" reference is needed.
    Page {
        direction: Direction,
        index: usize,
        user_id: i64,
        message_id: i32,
    },
}

/// Why a callback payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParseError {
    /// The tag before the first `:` is not one we emit.
    UnknownTag(String),
    /// The tag is known but the fields do not parse.
    BadFields(String),
}

impl std::fmt::Display for CallbackParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackParseError::UnknownTag(data) => write!(f, "Unknown callback tag: {data}"),
            CallbackParseError::BadFields(data) => write!(f, "Malformed callback fields: {data}"),
        }
    }
}

impl std::error::Error for CallbackParseError {}

impl CallbackPayload {
    /// Serialize for `InlineKeyboardButton::callback`.
    pub fn encode(&self) -> String {
        match self {
            CallbackPayload::SourceLanguage(lang) => format!("srclang:{}", lang.code()),
            CallbackPayload::TargetLanguage(lang) => format!("tgtlang:{}", lang.code()),
            CallbackPayload::Subject(subject) => format!("subject:{subject}"),
            CallbackPayload::Textbook(name) => format!("book:{name}"),
            CallbackPayload::Page {
                direction,
                index,
                user_id,
                message_id,
            } => format!(
                "page:{}:{}:{}:{}",
                direction.tag(),
                index,
                user_id,
                message_id
            ),
        }
    }

    /// Decode what an inline button sent back.
    pub fn decode(data: &str) -> Result<CallbackPayload, CallbackParseError> {
        let (tag, rest) = data
            .split_once(':')
            .ok_or_else(|| CallbackParseError::UnknownTag(data.to_string()))?;

        let bad = || CallbackParseError::BadFields(data.to_string());

        match tag {
            "srclang" => Lang::from_code(rest)
                .map(CallbackPayload::SourceLanguage)
                .ok_or_else(bad),
            "tgtlang" => Lang::from_code(rest)
                .map(CallbackPayload::TargetLanguage)
                .ok_or_else(bad),
            "subject" if !rest.is_empty() => Ok(CallbackPayload::Subject(rest.to_string())),
            "book" if !rest.is_empty() => Ok(CallbackPayload::Textbook(rest.to_string())),
            "page" => {
                let mut fields = rest.split(':');
                let direction = fields.next().and_then(Direction::from_tag).ok_or_else(bad)?;
                let index = fields
                    .next()
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(bad)?;
                let user_id = fields
                    .next()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(bad)?;
                let message_id = fields
                    .next()
                    .and_then(|s| s.parse::<i32>().ok())
                    .ok_or_else(bad)?;
                if fields.next().is_some() {
                    return Err(bad());
                }
                Ok(CallbackPayload::Page {
                    direction,
                    index,
                    user_id,
                    message_id,
                })
            }
            _ => Err(CallbackParseError::UnknownTag(data.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_payload_roundtrip() {
        for lang in Lang::ALL {
            let src = CallbackPayload::SourceLanguage(lang);
            assert_eq!(CallbackPayload::decode(&src.encode()), Ok(src));

            let tgt = CallbackPayload::TargetLanguage(lang);
            assert_eq!(CallbackPayload::decode(&tgt.encode()), Ok(tgt));
        }
    }

    #[test]
    fn test_subject_and_textbook_roundtrip() {
        let subject = CallbackPayload::Subject("Алгебра".to_string());
        assert_eq!(CallbackPayload::decode(&subject.encode()), Ok(subject));

        let book = CallbackPayload::Textbook("Макарычев Ю.Н.".to_string());
        assert_eq!(CallbackPayload::decode(&book.encode()), Ok(book));
    }

    #[test]
    fn test_page_payload_roundtrip() {
        let page = CallbackPayload::Page {
            direction: Direction::Forward,
            index: 1,
            user_id: 987654321,
            message_id: 42,
        };
        assert_eq!(page.encode(), "page:fwd:1:987654321:42");
        assert_eq!(CallbackPayload::decode(&page.encode()), Ok(page));
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        assert!(matches!(
            CallbackPayload::decode("no-separator"),
            Err(CallbackParseError::UnknownTag(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("mystery:9"),
            Err(CallbackParseError::UnknownTag(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("srclang:fr"),
            Err(CallbackParseError::BadFields(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("subject:"),
            Err(CallbackParseError::UnknownTag(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("page:fwd:abc:1:2"),
            Err(CallbackParseError::BadFields(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("page:up:0:1:2"),
            Err(CallbackParseError::BadFields(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("page:fwd:0:1:2:extra"),
            Err(CallbackParseError::BadFields(_))
        ));
        assert!(matches!(
            CallbackPayload::decode("page:fwd:0:1"),
            Err(CallbackParseError::BadFields(_))
        ));
    }
}
