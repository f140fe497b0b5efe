//! Team cost estimation

use super::types::{CostEstimate, NodeCost, OrchestrationTeam, TeamNode};

const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

fn node_cost(node: &TeamNode, prompt_tokens: u64, completion_tokens: u64) -> NodeCost {
    // Missing pricing means zero cost
    let (prompt_price, completion_price) = node
        .pricing
        .as_ref()
        .map(|pricing| {
            (
                pricing.prompt_per_1m.unwrap_or(0.0),
                pricing.completion_per_1m.unwrap_or(0.0),
            )
        })
        .unwrap_or((0.0, 0.0));

    let prompt_cost = (prompt_tokens as f64 / TOKENS_PER_PRICE_UNIT) * prompt_price;
    let completion_cost = (completion_tokens as f64 / TOKENS_PER_PRICE_UNIT) * completion_price;

    NodeCost {
        model_id: node.model_id.clone(),
        role: node.role,
        prompt_cost,
        completion_cost,
        total: prompt_cost + completion_cost,
    }
}

/// Estimate the cost of one run: every enabled node sees the full prompt and
/// produces `completion_tokens`.
pub fn estimate_team_cost(
    team: &OrchestrationTeam,
    prompt_tokens: u64,
    completion_tokens: u64,
) -> CostEstimate {
    let breakdown: Vec<NodeCost> = team
        .nodes
        .iter()
        .filter(|node| node.enabled)
        .map(|node| node_cost(node, prompt_tokens, completion_tokens))
        .collect();
    let total = breakdown.iter().map(|cost| cost.total).sum();

    CostEstimate {
        prompt_tokens,
        completion_tokens,
        breakdown,
        total,
    }
}
