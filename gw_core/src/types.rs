use errors::{FieldViolation, ViolationCode};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_CLIENT_ID_LEN: usize = 128;
const ANONYMOUS_CLIENT: &str = "anonymous";

/// Opaque caller identity used as the admission-control key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Builds an identity from a caller-supplied value.
    ///
    /// Surrounding whitespace is trimmed and overly long values are truncated;
    /// an empty value maps to the shared anonymous identity.
    pub fn new(id: impl AsRef<str>) -> Self {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Self::anonymous();
        }
        Self(trimmed.chars().take(MAX_CLIENT_ID_LEN).collect())
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_CLIENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The five request fields, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketField {
    Rate,
    Fx,
    AssetA,
    AssetB,
    BondIndex
}

impl MarketField {
    pub const ALL: [MarketField; 5] = [
        MarketField::Rate,
        MarketField::Fx,
        MarketField::AssetA,
        MarketField::AssetB,
        MarketField::BondIndex
    ];

    /// Name used in JSON bodies and violation reports.
    pub fn json_name(&self) -> &'static str {
        match self {
            MarketField::Rate => "rate",
            MarketField::Fx => "fx",
            MarketField::AssetA => "assetA",
            MarketField::AssetB => "assetB",
            MarketField::BondIndex => "bondIndex"
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            MarketField::Rate => &["policyRate"],
            MarketField::Fx => &["fxRate"],
            MarketField::AssetA => &["asset_a"],
            MarketField::AssetB => &["asset_b"],
            MarketField::BondIndex => &["bondIdx", "bond_index"]
        }
    }
}

impl fmt::Display for MarketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name())
    }
}

/// Raw, unvalidated market state as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInput {
    #[serde(default, alias = "policyRate")]
    pub rate: Option<f64>,
    #[serde(default, alias = "fxRate")]
    pub fx: Option<f64>,
    #[serde(default, alias = "asset_a")]
    pub asset_a: Option<f64>,
    #[serde(default, alias = "asset_b")]
    pub asset_b: Option<f64>,
    #[serde(default, alias = "bondIdx", alias = "bond_index")]
    pub bond_index: Option<f64>,
    #[serde(skip)]
    type_errors: Vec<FieldViolation>
}

impl MarketInput {
    pub fn new(rate: f64, fx: f64, asset_a: f64, asset_b: f64, bond_index: f64) -> Self {
        Self {
            rate: Some(rate),
            fx: Some(fx),
            asset_a: Some(asset_a),
            asset_b: Some(asset_b),
            bond_index: Some(bond_index),
            type_errors: Vec::new()
        }
    }

    /// Reads the five fields out of an arbitrary JSON body.
    ///
    /// Unlike plain deserialization this never fails: a field holding a
    /// non-numeric value is recorded and reported later by
    /// [`MarketInput::validate`] together with every other violation.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let mut input = Self::default();
        let Some(object) = body.as_object() else {
            input.type_errors.push(FieldViolation::new(
                "body",
                ViolationCode::NotANumber,
                "request body must be a JSON object"
            ));
            return input;
        };

        for field in MarketField::ALL {
            let raw = std::iter::once(field.json_name())
                .chain(field.aliases().iter().copied())
                .find_map(|name| object.get(name))
                .filter(|value| !value.is_null());

            let parsed = match raw {
                None => None,
                Some(value) => match value.as_f64() {
                    Some(number) => Some(number),
                    None => {
                        input.type_errors.push(FieldViolation::new(
                            field.json_name(),
                            ViolationCode::NotANumber,
                            "must be a number"
                        ));
                        None
                    }
                }
            };
            input.set(field, parsed);
        }

        input
    }

    pub fn get(&self, field: MarketField) -> Option<f64> {
        match field {
            MarketField::Rate => self.rate,
            MarketField::Fx => self.fx,
            MarketField::AssetA => self.asset_a,
            MarketField::AssetB => self.asset_b,
            MarketField::BondIndex => self.bond_index
        }
    }

    pub fn set(&mut self, field: MarketField, value: Option<f64>) {
        match field {
            MarketField::Rate => self.rate = value,
            MarketField::Fx => self.fx = value,
            MarketField::AssetA => self.asset_a = value,
            MarketField::AssetB => self.asset_b = value,
            MarketField::BondIndex => self.bond_index = value
        }
    }

    pub(crate) fn type_errors(&self) -> &[FieldViolation] {
        &self.type_errors
    }
}

/// Validated market state: every field present, finite and within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketParams {
    pub rate: f64,
    pub fx: f64,
    pub asset_a: f64,
    pub asset_b: f64,
    pub bond_index: f64
}

impl MarketParams {
    pub fn get(&self, field: MarketField) -> f64 {
        match field {
            MarketField::Rate => self.rate,
            MarketField::Fx => self.fx,
            MarketField::AssetA => self.asset_a,
            MarketField::AssetB => self.asset_b,
            MarketField::BondIndex => self.bond_index
        }
    }
}

/// Token accounting reported by the inference service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32
}

/// Generated commentary. The gateway never interprets `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commentary {
    pub text: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>
}

impl Commentary {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage: None
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
