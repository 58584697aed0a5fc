//! Text normalization — step 1 of the dispatch pipeline. Strips a leading
//! `@mention`, drops embedded null bytes, caps length, and warn-logs a
//! fixed set of prompt-injection patterns without acting on them.

use tracing::warn;

/// Hard cap on normalized message length. Anything longer is truncated with
/// a trailing marker rather than rejected outright.
pub const MAX_MESSAGE_CHARS: usize = 8_000;

const INJECTION_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard the system prompt",
    "you are now",
    "new instructions:",
    "reveal your system prompt",
    "print your instructions",
];

/// Normalize raw inbound text into what the rest of the pipeline sees.
pub fn normalize(raw: &str, bot_user_id: &str) -> String {
    let without_mention = strip_leading_mention(raw, bot_user_id);
    let without_nulls: String = without_mention.chars().filter(|c| *c != '\0').collect();
    let trimmed = without_nulls.trim();

    for pattern in INJECTION_PATTERNS {
        if trimmed.to_lowercase().contains(pattern) {
            warn!(pattern, "normalized text matched a known prompt-injection pattern");
        }
    }

    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        let truncated: String = trimmed.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{truncated}\n[... message truncated ...]")
    } else {
        trimmed.to_string()
    }
}

fn strip_leading_mention(text: &str, bot_user_id: &str) -> &str {
    let trimmed = text.trim_start();
    let mention = format!("<@{bot_user_id}>");
    if let Some(rest) = trimmed.strip_prefix(&mention) {
        return rest.trim_start();
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_mention() {
        assert_eq!(normalize("<@U_BOT> hello there", "U_BOT"), "hello there");
    }

    #[test]
    fn drops_null_bytes() {
        assert_eq!(normalize("hi\0there", "U_BOT"), "hithere");
    }

    #[test]
    fn truncates_long_messages() {
        let long = "a".repeat(MAX_MESSAGE_CHARS + 50);
        let result = normalize(&long, "U_BOT");
        assert!(result.ends_with("[... message truncated ...]"));
    }

    #[test]
    fn leaves_ordinary_text_untouched() {
        assert_eq!(normalize("what's the status?", "U_BOT"), "what's the status?");
    }
}
