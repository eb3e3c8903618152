use async_trait::async_trait;
use errors::UpstreamFailure;
use gw_core::{Commentary, CommentaryRequest, InferenceBackend, MarketParams};

pub const SYNTHETIC_MODEL: &str = "synthetic-rules-v1";

/// Offline backend that composes commentary from fixed rules.
///
/// Output depends only on the request parameters, so identical inputs always
/// produce identical text.
#[derive(Debug, Default, Clone)]
pub struct SyntheticBackend;

impl SyntheticBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(params: &MarketParams) -> String {
        let rate = if params.rate < 2.0 {
            "Accommodative policy at {rate}% keeps borrowing cheap and supports risk appetite."
        } else if params.rate < 5.0 {
            "A neutral policy rate of {rate}% leaves financing conditions broadly balanced."
        } else {
            "Restrictive policy at {rate}% tightens credit and weighs on leveraged sectors."
        };

        let fx = if params.fx > 1400.0 {
            "The currency is weak at {fx}, lifting import prices while helping exporters."
        } else if params.fx < 1100.0 {
            "A strong currency at {fx} eases imported inflation but squeezes exporters."
        } else {
            "The exchange rate at {fx} sits in a middle range with limited pass-through."
        };

        let assets = if params.asset_b > params.asset_a * 1.5 {
            "Property values clearly outpace equities, hinting at rate-sensitive housing demand."
        } else if params.asset_a > params.asset_b {
            "Equities lead property, consistent with growth expectations outrunning real estate."
        } else {
            "Equity and property valuations move in rough step with each other."
        };

        let bonds = if params.bond_index < 90.0 {
            "A bond index of {bond} signals falling prices as yields reprice higher."
        } else if params.bond_index > 110.0 {
            "A bond index of {bond} reflects rallying prices and expectations of easing."
        } else {
            "A bond index of {bond} shows yields close to their recent average."
        };

        [rate, fx, assets, bonds]
            .join(" ")
            .replace("{rate}", &format!("{:.2}", params.rate))
            .replace("{fx}", &format!("{:.1}", params.fx))
            .replace("{bond}", &format!("{:.1}", params.bond_index))
    }
}

#[async_trait]
impl InferenceBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_synthetic(&self) -> bool {
        true
    }

    async fn generate(&self, request: &CommentaryRequest) -> Result<Commentary, UpstreamFailure> {
        Ok(Commentary::new(
            Self::compose(&request.params),
            SYNTHETIC_MODEL
        ))
    }
}
