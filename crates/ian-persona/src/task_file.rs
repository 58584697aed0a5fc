//! Renders a Brainstormer's approved ticket into the fixed Markdown task
//! file layout written to `tasks/pending/TASK_<SLUG>.md`. A hardcoded
//! section layout, not a templating engine — there is exactly one task
//! file shape, so a general-purpose renderer would be pure overhead.

use chrono::{DateTime, Utc};

use crate::ticket_fields::{slugify, TicketFields};

/// One rendered task file, ready to be written at `tasks/pending/{filename}`.
pub struct TaskFile {
    pub filename: String,
    pub content: String,
}

/// Render `fields` (plus the backlog ticket id already minted for them)
/// into a task file. `created_at` is passed in rather than read from the
/// clock so the renderer stays pure.
pub fn render_task_file(ticket_id: &str, fields: &TicketFields, created_at: DateTime<Utc>) -> TaskFile {
    let slug = slugify(&fields.title);
    let filename = format!("TASK_{slug}.md");

    let content = format!(
        "# {title}\n\n\
         - **Ticket:** {ticket_id}\n\
         - **Created:** {created}\n\
         - **Status:** pending\n\n\
         ## The Problem\n\n{summary_intro}\n\n\
         ## The Solution\n\n{summary}\n\n\
         ## Who Benefits\n\n{impact}\n\n\
         ## What Success Looks Like\n\n{outcome}\n",
        title = fields.title,
        ticket_id = ticket_id,
        created = created_at.to_rfc3339(),
        summary_intro = fields.summary,
        summary = fields.summary,
        impact = fields.impact,
        outcome = fields.requested_outcome,
    );

    TaskFile { filename, content }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_fields() -> TicketFields {
        TicketFields {
            title: "Weekly Retrospective App".to_string(),
            summary: "A small app that prompts a weekly retro.".to_string(),
            requested_outcome: "A working app used every Friday.".to_string(),
            impact: "Faster retros for the whole team.".to_string(),
        }
    }

    #[test]
    fn filename_is_upper_slug() {
        let created = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let file = render_task_file("IAN-000042", &sample_fields(), created);
        assert_eq!(file.filename, "TASK_WEEKLY_RETROSPECTIVE_APP.md");
    }

    #[test]
    fn content_has_fixed_sections() {
        let created = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let file = render_task_file("IAN-000042", &sample_fields(), created);
        assert!(file.content.contains("## The Problem"));
        assert!(file.content.contains("## The Solution"));
        assert!(file.content.contains("## Who Benefits"));
        assert!(file.content.contains("## What Success Looks Like"));
        assert!(file.content.contains("IAN-000042"));
    }
}
