use crate::types::MarketParams;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You are a macroeconomic analyst. Given a simulated market state, \
     write a short commentary (at most three paragraphs) on how the policy rate, exchange \
     rate, asset values and bond index interact. Do not give investment advice.";

/// A fully rendered request for the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentaryRequest {
    pub params: MarketParams,
    pub system_prompt: String,
    pub user_prompt: String
}

impl CommentaryRequest {
    pub fn new(params: MarketParams) -> Self {
        Self {
            params,
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: render_user_prompt(&params)
        }
    }
}

fn render_user_prompt(params: &MarketParams) -> String {
    format!(
        "Current simulated market state:\n- Policy rate: {:.2}%\n- FX rate: {:.1}\n- Asset A \
         (equities): {:.0}\n- Asset B (property): {:.0}\n- Bond index: {:.1}\n\nExplain the \
         likely transmission between these values.",
        params.rate, params.fx, params.asset_a, params.asset_b, params.bond_index
    )
}
