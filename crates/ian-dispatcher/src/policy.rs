//! Structured policy-decision replies — step 7 of the dispatch pipeline.
//! Formatting is pure; ticket creation and the dev-handoff file search are
//! driven by the dispatcher, which owns the collaborators these need.

use std::path::Path;

use ian_persona::{Classification, Intent};

/// Render the fixed policy-decision block every non-actionable intent
/// replies with: `intent`, `confidence`, `ticket_id`, `next_step`.
pub fn render_policy_block(classification: &Classification, ticket_id: Option<&str>, next_step: &str) -> String {
    let mut out = String::new();
    out.push_str("**Policy decision**\n");
    out.push_str(&format!("- intent: `{}`\n", classification.intent.as_str()));
    out.push_str(&format!("- confidence: {:.2}\n", classification.confidence));
    out.push_str(&format!("- ticket_id: {}\n", ticket_id.unwrap_or("none")));
    out.push_str(&format!("- next_step: {next_step}"));
    out
}

pub fn next_step_for(intent: Intent) -> &'static str {
    match intent {
        Intent::NeedsClarification => "reply with more detail so I can route this correctly",
        Intent::OutOfScope => "no action taken — this is outside what I can help with",
        Intent::RequestCapture => "logged to the backlog for triage",
        Intent::DevHandoff => "handed off for development with related docs attached",
        _ => "none",
    }
}

/// Stopwords excluded from the keyword-overlap score so scoring isn't
/// dominated by filler words shared by almost every message.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "to", "of", "and", "or", "is", "it", "for", "in", "on", "with", "this",
    "that", "can", "you", "please", "i", "we",
];

fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

fn overlap_score(query_words: &[String], content: &str) -> usize {
    let lower = content.to_lowercase();
    query_words.iter().filter(|w| lower.contains(w.as_str())).count()
}

/// Find the `n` markdown files under `tasks_dir` (recursively) whose content
/// shares the most keywords with `text`, highest score first. Files with a
/// zero score are excluded.
pub fn find_top_handoff_files(tasks_dir: &Path, text: &str, n: usize) -> Vec<String> {
    let query_words = keywords(text);
    if query_words.is_empty() || !tasks_dir.is_dir() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, String)> = Vec::new();
    collect_markdown_scores(tasks_dir, &query_words, &mut scored);
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().filter(|(score, _)| *score > 0).take(n).map(|(_, path)| path).collect()
}

fn collect_markdown_scores(dir: &Path, query_words: &[String], out: &mut Vec<(usize, String)>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown_scores(&path, query_words, out);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        if let Ok(content) = std::fs::read_to_string(&path) {
            let score = overlap_score(query_words, &content);
            out.push((score, path.display().to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ian_persona::Classification;

    #[test]
    fn renders_all_four_fields() {
        let c = Classification {
            intent: Intent::OutOfScope,
            confidence: 0.25,
            reason: "no match".to_string(),
        };
        let block = render_policy_block(&c, None, next_step_for(Intent::OutOfScope));
        assert!(block.contains("intent: `out_of_scope`"));
        assert!(block.contains("confidence: 0.25"));
        assert!(block.contains("ticket_id: none"));
    }

    #[test]
    fn finds_highest_overlap_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("TASK_A.md"), "this task is about the login migration bug").unwrap();
        std::fs::write(dir.path().join("TASK_B.md"), "unrelated weather report content").unwrap();

        let results = find_top_handoff_files(dir.path(), "fix the login migration bug please", 2);
        assert_eq!(results.len(), 1);
        assert!(results[0].ends_with("TASK_A.md"));
    }

    #[test]
    fn returns_empty_when_no_files_overlap() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("TASK_A.md"), "totally unrelated content here").unwrap();
        let results = find_top_handoff_files(dir.path(), "xyzxyz qqqqq", 2);
        assert!(results.is_empty());
    }
}
