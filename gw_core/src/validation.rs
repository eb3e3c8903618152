use crate::types::{MarketField, MarketInput, MarketParams};
use errors::{FieldViolation, ViolationCode};

/// Inclusive domain bounds for one market field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: Option<f64>
}

impl FieldBounds {
    pub const fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }

    fn describe(&self) -> String {
        match self.max {
            Some(max) => format!("must be between {} and {}", self.min, max),
            None => format!("must be at least {}", self.min)
        }
    }
}

impl MarketField {
    pub fn bounds(&self) -> FieldBounds {
        match self {
            MarketField::Rate => FieldBounds::new(0.0, Some(25.0)),
            MarketField::Fx => FieldBounds::new(100.0, Some(5000.0)),
            MarketField::AssetA | MarketField::AssetB => FieldBounds::new(0.0, None),
            MarketField::BondIndex => FieldBounds::new(0.0, Some(1000.0))
        }
    }
}

impl MarketInput {
    /// Checks every field and returns the validated parameters.
    ///
    /// All violations are collected, so a caller sees every bad field in one
    /// response rather than fixing them one at a time.
    pub fn validate(&self) -> Result<MarketParams, Vec<FieldViolation>> {
        let mut violations: Vec<FieldViolation> = self.type_errors().to_vec();

        for field in MarketField::ALL {
            let name = field.json_name();
            if violations.iter().any(|v| v.field == name) {
                continue;
            }

            match self.get(field) {
                None => violations.push(FieldViolation::new(
                    name,
                    ViolationCode::Missing,
                    "is required"
                )),
                Some(value) if !value.is_finite() => violations.push(FieldViolation::new(
                    name,
                    ViolationCode::NotFinite,
                    "must be a finite number"
                )),
                Some(value) => {
                    let bounds = field.bounds();
                    if !bounds.contains(value) {
                        violations.push(FieldViolation::new(
                            name,
                            ViolationCode::OutOfRange,
                            bounds.describe()
                        ));
                    }
                }
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(MarketParams {
            rate: self.rate.unwrap_or_default(),
            fx: self.fx.unwrap_or_default(),
            asset_a: self.asset_a.unwrap_or_default(),
            asset_b: self.asset_b.unwrap_or_default(),
            bond_index: self.bond_index.unwrap_or_default()
        })
    }
}
