//! Parses the Brainstormer's **TASK DEFINITION** block into normalized
//! ticket fields. Each field is located by a bold-label marker
//! (`**Title:**`, `**The Problem:**`, …), whitespace-collapsed, and falls
//! back to a fixed placeholder string when missing, empty, or
//! placeholder-like — parsing must never fail outright, since a malformed
//! synthesis still has to produce a ticket.

const MAX_FIELD_CHARS: usize = 400;
const FALLBACK: &str = "not specified";

/// Fields extracted from a Synthesis-stage reply, ready to hand to
/// `ian_backlog::NewTicket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFields {
    pub title: String,
    pub summary: String,
    pub requested_outcome: String,
    pub impact: String,
}

/// Parse the bold-label fields out of `text`. Never errors: any field that
/// can't be located or is placeholder-like gets [`FALLBACK`].
pub fn parse_ticket_fields(text: &str) -> TicketFields {
    let title = extract_field(text, "Title").unwrap_or_else(|| FALLBACK.to_string());
    let summary = extract_field(text, "The Solution").unwrap_or_else(|| FALLBACK.to_string());
    let requested_outcome =
        extract_field(text, "What Success Looks Like").unwrap_or_else(|| FALLBACK.to_string());
    let impact = extract_field(text, "Who Benefits").unwrap_or_else(|| FALLBACK.to_string());

    TicketFields {
        title,
        summary,
        requested_outcome,
        impact,
    }
}

/// Every recognized `**Label:**` marker the Synthesis template emits, used
/// by [`extract_field`] to find the end of one field's value.
const ALL_LABELS: &[&str] = &[
    "Title",
    "The Problem",
    "The Solution",
    "Who Benefits",
    "What Success Looks Like",
    "Estimated Effort",
    "Key Risks",
];

fn extract_field(text: &str, label: &str) -> Option<String> {
    let marker = format!("**{label}:**");
    let start = text.find(&marker)? + marker.len();
    let rest = &text[start..];

    let mut end = rest.len();
    for other in ALL_LABELS {
        if *other == label {
            continue;
        }
        let other_marker = format!("**{other}:**");
        if let Some(pos) = rest.find(&other_marker) {
            end = end.min(pos);
        }
    }

    let raw = rest[..end].trim();
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_FIELD_CHARS).collect();

    if is_placeholder_like(&truncated) {
        None
    } else {
        Some(truncated)
    }
}

fn is_placeholder_like(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    let lower = s.to_lowercase();
    lower == "tbd" || lower == "n/a" || lower == "..." || lower == "?" || lower.starts_with("[insert")
}

/// Upper-snake-case slug derived from a title, for the Markdown task
/// filename `tasks/pending/TASK_<SLUG>.md`.
pub fn slugify(title: &str) -> String {
    let mut slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    while slug.contains("__") {
        slug = slug.replace("__", "_");
    }
    slug.trim_matches('_').to_string()
}
