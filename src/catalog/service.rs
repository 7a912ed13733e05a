use super::phase::{MaterialType, WorkflowPhase};
use super::tags::{ServiceTag, ServiceTags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog entry: a category header, a main service, a sub-service, or a
/// main service that is also bundled into other services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Stable identifier, unique across the catalog
    pub id: String,
    /// Display name, also the sort key
    pub title: String,
    /// Classification tags. `None` when the record carries no type field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceTags>,
    /// Grouping header this service is listed under (lookup only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_service_id: Option<String>,
    /// Main services this service is implicitly bundled into
    #[serde(default)]
    pub included_in: Vec<String>,
    /// Sub-services explicitly bundled into this service
    #[serde(default)]
    pub included_sub_services: Vec<String>,
    #[serde(flatten)]
    pub config: ServiceConfig,
    #[serde(default)]
    pub config_onboarding_completed: bool,
    #[serde(default)]
    pub material_onboarding_completed: bool,
    #[serde(default)]
    pub sub_service_config_onboarding_completed: bool,
    /// Set whenever onboarding saves this service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Stored fields not modelled above, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Configuration fields edited during onboarding. Every field is optional in
/// storage; defaults are applied when a form is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Minutes of work per unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_value_per_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency_step_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_productivity_per_day: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_type: Option<MaterialType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_phase: Option<WorkflowPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creates_dust: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_explanation: Option<String>,
}

impl Service {
    /// Create an untagged service with empty configuration.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            service_type: None,
            parent_service_id: None,
            included_in: Vec::new(),
            included_sub_services: Vec::new(),
            config: ServiceConfig::default(),
            config_onboarding_completed: false,
            material_onboarding_completed: false,
            sub_service_config_onboarding_completed: false,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Builder-style helper for tagging a service.
    pub fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = ServiceTag>,
    {
        self.service_type = Some(tags.into_iter().collect());
        self
    }

    pub fn with_included_in<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_in = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_included_sub_services<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_sub_services = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_tag(&self, tag: &ServiceTag) -> bool {
        self.service_type
            .as_ref()
            .is_some_and(|tags| tags.contains(tag))
    }

    pub fn is_category_header(&self) -> bool {
        self.has_tag(&ServiceTag::CategoryHeader)
    }

    /// Editable main service: "Shop Leistung" and not a category header.
    pub fn is_main_service(&self) -> bool {
        self.has_tag(&ServiceTag::MainService) && !self.is_category_header()
    }

    pub fn is_sub_service(&self) -> bool {
        self.has_tag(&ServiceTag::BackendSubService)
    }

    /// Carries both the main-service and the sub-service tag.
    pub fn is_dual_role(&self) -> bool {
        self.has_tag(&ServiceTag::MainService) && self.is_sub_service()
    }

    /// Whether the efficiency ramp is inverted. Stored data is not rejected
    /// for this; callers only report it.
    pub fn has_inverted_efficiency_range(&self) -> bool {
        match (self.config.efficiency_start, self.config.efficiency_cap) {
            (Some(start), Some(cap)) => start > cap,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_never_main() {
        let header = Service::new("h1", "Innenarbeiten")
            .with_tags([ServiceTag::CategoryHeader, ServiceTag::MainService]);
        assert!(header.is_category_header());
        assert!(!header.is_main_service());
    }

    #[test]
    fn test_dual_role() {
        let dual = Service::new("d1", "Spachteln")
            .with_tags([ServiceTag::MainService, ServiceTag::BackendSubService]);
        assert!(dual.is_main_service());
        assert!(dual.is_sub_service());
        assert!(dual.is_dual_role());

        let untagged = Service::new("u1", "Ohne Typ");
        assert!(!untagged.is_main_service());
        assert!(!untagged.is_dual_role());
    }

    #[test]
    fn test_deserialize_camel_case_with_composite_type() {
        let json = r#"{
            "id": "m1",
            "title": "Wand streichen",
            "serviceType": "Shop Leistung",
            "includedSubServices": ["s1"],
            "standardValuePerUnit": 2.5,
            "materialType": "fixed",
            "workflowPhase": "grundierung",
            "createsDust": true,
            "configOnboardingCompleted": true
        }"#;
        let service: Service = serde_json::from_str(json).unwrap();
        assert!(service.is_main_service());
        assert_eq!(service.included_sub_services, vec!["s1".to_string()]);
        assert_eq!(service.config.standard_value_per_unit, Some(2.5));
        assert_eq!(service.config.material_type, Some(MaterialType::Fixed));
        assert_eq!(service.config.workflow_phase, Some(WorkflowPhase::Grundierung));
        assert_eq!(service.config.creates_dust, Some(true));
        assert!(service.config_onboarding_completed);
        assert!(!service.material_onboarding_completed);
    }

    #[test]
    fn test_missing_type_field_is_none() {
        let service: Service = serde_json::from_str(r#"{"id": "x", "title": "X"}"#).unwrap();
        assert!(service.service_type.is_none());
        assert!(service.included_in.is_empty());
    }

    #[test]
    fn test_inverted_efficiency_range() {
        let mut service = Service::new("m1", "Lackieren");
        assert!(!service.has_inverted_efficiency_range());
        service.config.efficiency_start = Some(80.0);
        service.config.efficiency_cap = Some(60.0);
        assert!(service.has_inverted_efficiency_range());
    }
}
