//! Canonical catalog types shared by the client, the cascade and the views.
//!
//! The FIPE API spells the same `{code, label}` pair differently per endpoint
//! and encodes codes as numbers or strings depending on the stage. Everything
//! past the HTTP client works on these normalised shapes only.

use serde::{Deserialize, Serialize};

/// One of the four ordered lookup steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Brand,
    Model,
    Year,
    Vehicle,
}

impl Stage {
    /// The three stages that carry a user selection, in cascade order.
    pub const SELECTABLE: [Stage; 3] = [Stage::Brand, Stage::Model, Stage::Year];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Brand => "brand",
            Stage::Model => "model",
            Stage::Year => "year",
            Stage::Vehicle => "vehicle",
        }
    }

    /// Parses a stage name as used in routes and CLI output.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brand" => Some(Stage::Brand),
            "model" => Some(Stage::Model),
            "year" => Some(Stage::Year),
            "vehicle" => Some(Stage::Vehicle),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selectable entry of the brand, model or year list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub code: String,
    pub label: String,
}

impl CatalogItem {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Pricing and specification record of a fully resolved vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetail {
    pub model_name: String,
    /// Already formatted by the API, e.g. `"R$ 52.340,00"`.
    pub price: String,
    pub brand_name: String,
    pub model_year: u32,
    pub fuel_type: String,
    pub fipe_code: String,
    pub reference_month: String,
    pub fuel_acronym: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_round_trips_through_its_name() {
        for stage in [Stage::Brand, Stage::Model, Stage::Year, Stage::Vehicle] {
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::parse("trim"), None);
    }

    #[test]
    fn stage_serializes_as_snake_case() {
        let json = serde_json::to_string(&Stage::Brand).expect("serialize");
        assert_eq!(json, "\"brand\"");
    }

    #[test]
    fn selectable_stages_exclude_vehicle() {
        assert!(!Stage::SELECTABLE.contains(&Stage::Vehicle));
    }
}
