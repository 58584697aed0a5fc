//! Persona selection — a pure function over text and session metadata.
//! Priority order stops at the first match; continuity with an in-flight
//! FSM always wins over a fresh keyword hit.

use ian_core::types::{BrainstormState, PlannerState, Persona, SessionMetadata};

const BRAINSTORMER_KEYWORDS: &[&str] = &["idea:", "brainstorm", "let's brainstorm", "i have an idea"];
const PLANNER_KEYWORDS: &[&str] = &["make a plan", "plan this out", "implementation plan"];
const CHOICE_TOKENS: &[&str] = &["option 1", "option 2", "yes", "no", "first", "second", "approve"];

/// Select the persona for this turn. `metadata` is the *current* session's
/// metadata, read before this turn is processed.
pub fn select_persona(text: &str, metadata: &SessionMetadata) -> Persona {
    if metadata.persona == Some(Persona::Brainstormer)
        && metadata.brainstorm_state != Some(BrainstormState::TicketCreated)
    {
        return Persona::Brainstormer;
    }
    if metadata.persona == Some(Persona::Planner) && metadata.planner_state != Some(PlannerState::PlanCreated) {
        return Persona::Planner;
    }

    let lower = text.trim().to_lowercase();

    if lower.starts_with("!brainstorm") {
        return Persona::Brainstormer;
    }
    if lower.starts_with("!plan") {
        return Persona::Planner;
    }
    if BRAINSTORMER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Persona::Brainstormer;
    }
    if PLANNER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Persona::Planner;
    }

    let normalized: String = lower.chars().take(50).collect();
    if normalized.len() <= 50 && CHOICE_TOKENS.contains(&normalized.as_str()) {
        return Persona::Planner;
    }

    Persona::General
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SessionMetadata {
        SessionMetadata::default()
    }

    #[test]
    fn continuity_wins_over_text() {
        let mut m = meta();
        m.persona = Some(Persona::Brainstormer);
        m.brainstorm_state = Some(BrainstormState::Refinement);
        assert_eq!(select_persona("anything at all", &m), Persona::Brainstormer);
    }

    #[test]
    fn terminal_state_does_not_force_continuity() {
        let mut m = meta();
        m.persona = Some(Persona::Brainstormer);
        m.brainstorm_state = Some(BrainstormState::TicketCreated);
        assert_eq!(select_persona("hello", &m), Persona::General);
    }

    #[test]
    fn explicit_prefix_selects_brainstormer() {
        assert_eq!(select_persona("!brainstorm a new feature", &meta()), Persona::Brainstormer);
    }

    #[test]
    fn explicit_prefix_selects_planner() {
        assert_eq!(select_persona("!plan the migration", &meta()), Persona::Planner);
    }

    #[test]
    fn keyword_selects_brainstormer() {
        assert_eq!(select_persona("idea: a weekly retro app", &meta()), Persona::Brainstormer);
    }

    #[test]
    fn bare_yes_falls_back_to_planner() {
        assert_eq!(select_persona("yes", &meta()), Persona::Planner);
    }

    #[test]
    fn otherwise_general() {
        assert_eq!(select_persona("what time is it", &meta()), Persona::General);
    }

    #[test]
    fn is_pure() {
        let m = meta();
        assert_eq!(select_persona("idea: x", &m), select_persona("idea: x", &m));
    }
}
