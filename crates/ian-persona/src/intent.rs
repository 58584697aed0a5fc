//! Deterministic intent classification — a pure function, no model call, no
//! I/O, scored from keyword tables so it stays independently unit-testable.

use serde::{Deserialize, Serialize};

/// Fixed classification enum produced by [`classify_intent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    StatusLookup,
    FaqAnswer,
    Runbook,
    Triage,
    RequestCapture,
    DevHandoff,
    OutOfScope,
    NeedsClarification,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::StatusLookup => "status_lookup",
            Intent::FaqAnswer => "faq_answer",
            Intent::Runbook => "runbook",
            Intent::Triage => "triage",
            Intent::RequestCapture => "request_capture",
            Intent::DevHandoff => "dev_handoff",
            Intent::OutOfScope => "out_of_scope",
            Intent::NeedsClarification => "needs_clarification",
        }
    }

    /// Tool names a dispatcher call made under this intent is allowed to use.
    pub fn allowed_tools(&self) -> &'static [&'static str] {
        match self {
            Intent::StatusLookup => &["filesystem_read", "filesystem_list", "web_search"],
            Intent::FaqAnswer | Intent::Runbook | Intent::Triage => &["filesystem_read", "web_search"],
            Intent::RequestCapture | Intent::OutOfScope | Intent::DevHandoff | Intent::NeedsClarification => &[],
        }
    }
}

/// Result of [`classify_intent`]: the chosen intent, a confidence in
/// `[0, 1]`, and a short human-readable reason (audit/debug only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    pub reason: String,
}

const DEV_KEYWORDS: &[&str] = &[
    "implement",
    "deploy",
    "migration",
    "refactor",
    "pull request",
    "merge conflict",
    "fix the bug",
    "write code",
];

const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (Intent::StatusLookup, &["status", "is it up", "down", "health", "running"]),
    (Intent::FaqAnswer, &["what is", "how do i", "what's the", "explain", "difference between"]),
    (Intent::Runbook, &["runbook", "how to restart", "escalate", "on-call", "incident"]),
    (Intent::Triage, &["bug", "broken", "error", "not working", "crash"]),
    (Intent::RequestCapture, &["please add", "can you add", "feature request", "it would be nice", "idea:"]),
];

/// Classify one piece of user text. Deterministic and wall-clock independent:
/// `classify_intent(x) == classify_intent(x)` for any `x`, always.
pub fn classify_intent(text: &str, min_confidence: f64) -> Classification {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Classification {
            intent: Intent::NeedsClarification,
            confidence: 0.0,
            reason: "empty message".to_string(),
        };
    }

    let lower = trimmed.to_lowercase();

    if DEV_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Classification {
            intent: Intent::DevHandoff,
            confidence: 0.99,
            reason: "matched a development keyword".to_string(),
        };
    }

    let mut scores: Vec<(Intent, usize)> = KEYWORD_TABLE
        .iter()
        .map(|(intent, keywords)| (*intent, keywords.iter().filter(|k| lower.contains(*k)).count()))
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let top_score = scores.first().map(|(_, s)| *s).unwrap_or(0);
    if top_score == 0 {
        return Classification {
            intent: Intent::OutOfScope,
            confidence: 0.25,
            reason: "no keyword matched any known intent".to_string(),
        };
    }

    let tied = scores.iter().filter(|(_, s)| *s == top_score).count();
    if tied >= 2 {
        return Classification {
            intent: Intent::NeedsClarification,
            confidence: 0.45,
            reason: "top intents tied on keyword score".to_string(),
        };
    }

    let confidence = (0.45 + 0.20 * top_score as f64).min(0.95);
    let (intent, _) = scores[0];
    if confidence < min_confidence {
        return Classification {
            intent: Intent::NeedsClarification,
            confidence,
            reason: "confidence below threshold".to_string(),
        };
    }

    Classification {
        intent,
        confidence,
        reason: format!("matched {top_score} keyword(s) for {}", intent.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_needs_clarification() {
        let c = classify_intent("", 0.5);
        assert_eq!(c.intent, Intent::NeedsClarification);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn dev_keyword_wins_outright() {
        let c = classify_intent("please implement the login migration", 0.5);
        assert_eq!(c.intent, Intent::DevHandoff);
        assert_eq!(c.confidence, 0.99);
    }

    #[test]
    fn no_keyword_hits_is_out_of_scope() {
        let c = classify_intent("what a lovely day outside", 0.5);
        assert_eq!(c.intent, Intent::OutOfScope);
        assert_eq!(c.confidence, 0.25);
    }

    #[test]
    fn status_keyword_is_status_lookup() {
        let c = classify_intent("is the service down right now?", 0.3);
        assert_eq!(c.intent, Intent::StatusLookup);
    }

    #[test]
    fn is_deterministic() {
        let a = classify_intent("what is the status of the deploy", 0.3);
        let b = classify_intent("what is the status of the deploy", 0.3);
        assert_eq!(a.intent, b.intent);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn allowed_tools_are_empty_for_request_capture() {
        assert!(Intent::RequestCapture.allowed_tools().is_empty());
        assert!(Intent::OutOfScope.allowed_tools().is_empty());
    }

    #[test]
    fn allowed_tools_for_status_lookup_include_web_search() {
        assert!(Intent::StatusLookup.allowed_tools().contains(&"web_search"));
    }
}
