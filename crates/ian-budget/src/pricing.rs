/// USD price per 1,000,000 tokens for a single model.
#[derive(Debug, Clone, Copy)]
pub struct ModelPrice {
    pub model: &'static str,
    pub input: f64,
    pub output: f64,
    pub cache_write: f64,
    pub cache_read: f64,
}

/// Static pricing table. Unknown models fall back to `DEFAULT_PRICE`, which
/// mirrors the default (cheap) model so an unrecognised id never silently
/// under- or over-charges against the heavy-model budget.
pub const PRICES: &[ModelPrice] = &[
    ModelPrice {
        model: "claude-haiku-4-5",
        input: 1.0,
        output: 5.0,
        cache_write: 1.25,
        cache_read: 0.10,
    },
    ModelPrice {
        model: "claude-sonnet-4-6",
        input: 3.0,
        output: 15.0,
        cache_write: 3.75,
        cache_read: 0.30,
    },
];

pub const DEFAULT_PRICE: ModelPrice = PRICES[0];

pub fn price_for(model: &str) -> ModelPrice {
    PRICES
        .iter()
        .find(|p| p.model == model)
        .copied()
        .unwrap_or(DEFAULT_PRICE)
}

/// Deterministic cost computation used at insert time, so a `BudgetEvent`'s
/// `cost_usd` never needs to be recomputed against a pricing table that may
/// have moved on by the time it's read back.
pub fn compute_cost(
    model: &str,
    input_tokens: u32,
    output_tokens: u32,
    cache_written: u32,
    cache_read: u32,
) -> f64 {
    let price = price_for(model);
    let per_million = 1_000_000.0;
    (input_tokens as f64 * price.input
        + output_tokens as f64 * price.output
        + cache_written as f64 * price.cache_write
        + cache_read as f64 * price.cache_read)
        / per_million
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_falls_back_to_default() {
        let p = price_for("some-future-model");
        assert_eq!(p.model, DEFAULT_PRICE.model);
    }

    #[test]
    fn cost_is_proportional_to_tokens() {
        let cost = compute_cost("claude-haiku-4-5", 1_000_000, 0, 0, 0);
        assert!((cost - 1.0).abs() < 1e-9);
    }
}
