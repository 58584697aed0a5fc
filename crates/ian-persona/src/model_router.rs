//! Model selection — a pure two-tier decision over plain text. This router
//! never calls a provider; it only picks a model id.

const HEAVY_KEYWORDS: &[&str] = &["deep dive", "thorough", "complex", "architecture", "design a"];

/// `(chosen_model, reason)` — pure, deterministic, no I/O.
pub fn select_model(text: &str, default_model: &str, heavy_model: &str) -> (String, &'static str) {
    let lower = text.trim().to_lowercase();

    if lower.starts_with("!sonnet") || lower.starts_with("!plan") {
        return (heavy_model.to_string(), "explicit Sonnet/Planner override");
    }
    if lower.starts_with("!brainstorm") {
        return (default_model.to_string(), "explicit Brainstormer override forces the default model");
    }
    if HEAVY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return (heavy_model.to_string(), "heavy keyword matched");
    }

    (default_model.to_string(), "default tier")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonnet_override_forces_heavy() {
        let (model, reason) = select_model("!sonnet design a scheduler", "haiku", "sonnet");
        assert_eq!(model, "sonnet");
        assert_eq!(reason, "explicit Sonnet/Planner override");
    }

    #[test]
    fn plan_override_forces_heavy() {
        let (model, _) = select_model("!plan the migration", "haiku", "sonnet");
        assert_eq!(model, "sonnet");
    }

    #[test]
    fn brainstorm_override_forces_default() {
        let (model, _) = select_model("!brainstorm a new idea", "haiku", "sonnet");
        assert_eq!(model, "haiku");
    }

    #[test]
    fn heavy_keyword_triggers_heavy_tier() {
        let (model, _) = select_model("give me a thorough architecture review", "haiku", "sonnet");
        assert_eq!(model, "sonnet");
    }

    #[test]
    fn default_otherwise() {
        let (model, _) = select_model("what time is it", "haiku", "sonnet");
        assert_eq!(model, "haiku");
    }

    #[test]
    fn is_pure_and_idempotent() {
        let a = select_model("design a thing", "haiku", "sonnet");
        let b = select_model("design a thing", "haiku", "sonnet");
        assert_eq!(a.0, b.0);
    }
}
