use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn neutral_factor() -> f64 {
    1.0
}

/// A surcharge or site condition that applies on top of the main catalog,
/// e.g. "Altbau mit hohen Decken".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialService {
    pub id: String,
    pub title: String,
    /// Room areas the condition applies to (e.g. "Wand", "Decke")
    #[serde(default)]
    pub affects_area: Vec<String>,
    /// Service that must be activated when this condition applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_service: Option<String>,
    /// Services whose computation this condition modifies
    #[serde(default)]
    pub affects_service: Vec<String>,
    /// Multiplier, 1.0 is neutral
    #[serde(default = "neutral_factor")]
    pub factor: f64,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecialService {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            affects_area: Vec::new(),
            required_service: None,
            affects_service: Vec::new(),
            factor: neutral_factor(),
            onboarding_completed: false,
            extra: Map::new(),
        }
    }
}

/// A named global multiplier (e.g. weekend or express surcharge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurchargeFactor {
    pub id: String,
    pub title: String,
    #[serde(default = "neutral_factor")]
    pub factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_defaults_to_neutral() {
        let special: SpecialService =
            serde_json::from_str(r#"{"id": "sp1", "title": "Hohe Decken"}"#).unwrap();
        assert_eq!(special.factor, 1.0);
        assert!(special.affects_service.is_empty());
        assert!(!special.onboarding_completed);

        let surcharge: SurchargeFactor =
            serde_json::from_str(r#"{"id": "f1", "title": "Wochenende"}"#).unwrap();
        assert_eq!(surcharge.factor, 1.0);
    }

    #[test]
    fn test_unmodelled_fields_round_trip() {
        let json = r#"{"id": "sp1", "title": "Hohe Decken", "minHeight": 3.2}"#;
        let special: SpecialService = serde_json::from_str(json).unwrap();
        assert_eq!(special.extra["minHeight"], 3.2);

        let value = serde_json::to_value(&special).unwrap();
        assert_eq!(value["minHeight"], 3.2);
        assert_eq!(value["factor"], 1.0);
    }
}
