use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelegramMessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelegramUrlError {
    #[error("telegram url has too few segments: {0}")]
    TooShort(String),
    #[error("telegram url segment is not numeric: {0}")]
    InvalidSegment(String),
}

/// Extract chat and message identifiers from a Telegram message URL.
///
/// The URL is split on `/` and the last two segments are parsed as integers.
/// Unlike the other platform parsers this one is strict: malformed input is
/// an error rather than a "not recognized" sentinel, since these URLs are
/// generated by the ingestion side and a parse failure means corrupt data.
pub fn parse(url: &str) -> Result<TelegramMessageRef, TelegramUrlError> {
    let mut segments = url.rsplit('/');

    let message_segment = segments
        .next()
        .ok_or_else(|| TelegramUrlError::TooShort(url.to_string()))?;
    let chat_segment = segments
        .next()
        .ok_or_else(|| TelegramUrlError::TooShort(url.to_string()))?;

    let message_id = message_segment
        .parse::<i64>()
        .map_err(|_| TelegramUrlError::InvalidSegment(message_segment.to_string()))?;
    let chat_id = chat_segment
        .parse::<i64>()
        .map_err(|_| TelegramUrlError::InvalidSegment(chat_segment.to_string()))?;

    Ok(TelegramMessageRef {
        chat_id,
        message_id,
    })
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{TelegramUrlError, parse};

    #[test]
    fn parse_extracts_chat_and_message_ids() {
        let parsed = parse("https://t.me/c/-1234567890/42").expect("url should parse");
        assert_eq!(parsed.chat_id, -1234567890);
        assert_eq!(parsed.message_id, 42);
    }

    #[test]
    fn parse_accepts_positive_chat_ids() {
        let parsed = parse("https://t.me/c/777/9").expect("url should parse");
        assert_eq!(parsed.chat_id, 777);
        assert_eq!(parsed.message_id, 9);
    }

    #[test_case("https://t.me/c/-123/abc"; "non numeric message id")]
    #[test_case("https://t.me/c/chat/42"; "non numeric chat id")]
    #[test_case("https://t.me/c/-123/42/"; "trailing slash leaves empty segment")]
    fn parse_rejects_non_numeric_trailing_segments(url: &str) {
        assert!(matches!(
            parse(url),
            Err(TelegramUrlError::InvalidSegment(_))
        ));
    }

    #[test]
    fn parse_rejects_input_without_separators() {
        assert!(matches!(
            parse("plain-text"),
            Err(TelegramUrlError::TooShort(_))
        ));
    }
}
