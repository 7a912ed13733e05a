//! Typed onboarding form for one service.
//!
//! Raw user input goes through one coercion per field kind, selected from
//! [`FIELDS`]:
//!
//! - number fields clamp anything unparseable (empty, text, NaN, infinity)
//!   to `0`; a decimal comma is accepted
//! - checkbox fields only toggle
//! - choice fields keep their value and report an error on unknown input
//! - text fields store the trimmed input

use crate::catalog::{MaterialType, ServiceConfig, WorkflowPhase};
use std::fmt;

pub const DEFAULT_EFFICIENCY_STEP_PERCENT: f64 = 1.0;
pub const DEFAULT_MATERIAL_VALUE: f64 = 15.0;
pub const DEFAULT_WORKFLOW_ORDER: f64 = 20.0;

/// Editable fields of a service, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    StandardValuePerUnit,
    MinTime,
    WaitTime,
    EfficiencyStart,
    EfficiencyCap,
    EfficiencyStepPercent,
    MaxProductivityPerDay,
    MaterialType,
    MaterialValue,
    WorkflowOrder,
    WorkflowPhase,
    CreatesDust,
    SubWorkflowOrder,
    SubWorkflowTotal,
    SubWorkflowExplanation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Checkbox,
    MaterialChoice,
    PhaseChoice,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: FormField,
    /// Stored field name, also accepted as input key
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

pub const FIELDS: &[FieldSpec] = &[
    FormField::StandardValuePerUnit.spec(),
    FormField::MinTime.spec(),
    FormField::WaitTime.spec(),
    FormField::EfficiencyStart.spec(),
    FormField::EfficiencyCap.spec(),
    FormField::EfficiencyStepPercent.spec(),
    FormField::MaxProductivityPerDay.spec(),
    FormField::MaterialType.spec(),
    FormField::MaterialValue.spec(),
    FormField::WorkflowOrder.spec(),
    FormField::WorkflowPhase.spec(),
    FormField::CreatesDust.spec(),
    FormField::SubWorkflowOrder.spec(),
    FormField::SubWorkflowTotal.spec(),
    FormField::SubWorkflowExplanation.spec(),
];

impl FormField {
    pub const fn spec(self) -> FieldSpec {
        let (key, label, kind) = match self {
            Self::StandardValuePerUnit => (
                "standardValuePerUnit",
                "Zeitwert pro Einheit (min)",
                FieldKind::Number,
            ),
            Self::MinTime => ("minTime", "Mindestzeit (min)", FieldKind::Number),
            Self::WaitTime => ("waitTime", "Wartezeit (min)", FieldKind::Number),
            Self::EfficiencyStart => ("efficiencyStart", "Effizienz ab Menge", FieldKind::Number),
            Self::EfficiencyCap => ("efficiencyCap", "Effizienz bis Menge", FieldKind::Number),
            Self::EfficiencyStepPercent => (
                "efficiencyStepPercent",
                "Effizienzschritt (%)",
                FieldKind::Number,
            ),
            Self::MaxProductivityPerDay => (
                "maxProductivityPerDay",
                "Max. Leistung pro Tag",
                FieldKind::Number,
            ),
            Self::MaterialType => ("materialType", "Materialart", FieldKind::MaterialChoice),
            Self::MaterialValue => ("materialValue", "Materialwert", FieldKind::Number),
            Self::WorkflowOrder => ("workflowOrder", "Reihenfolge", FieldKind::Number),
            Self::WorkflowPhase => ("workflowPhase", "Arbeitsphase", FieldKind::PhaseChoice),
            Self::CreatesDust => ("createsDust", "Staubentwicklung", FieldKind::Checkbox),
            Self::SubWorkflowOrder => (
                "subWorkflowOrder",
                "Reihenfolge als Unterleistung",
                FieldKind::Number,
            ),
            Self::SubWorkflowTotal => (
                "subWorkflowTotal",
                "Schritte als Unterleistung",
                FieldKind::Number,
            ),
            Self::SubWorkflowExplanation => (
                "subWorkflowExplanation",
                "Erläuterung Unterleistung",
                FieldKind::Text,
            ),
        };
        FieldSpec {
            field: self,
            key,
            label,
            kind,
        }
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    /// Look a field up by its stored name, case-insensitively.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        FIELDS
            .iter()
            .find(|spec| spec.key.eq_ignore_ascii_case(key))
            .map(|spec| spec.field)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("'{input}' is not a valid value for {field} (expected one of: {expected})")]
    InvalidChoice {
        field: FormField,
        input: String,
        expected: String,
    },

    #[error("{field} is a checkbox and can only be toggled")]
    CheckboxNeedsToggle { field: FormField },

    #[error("{field} is not a checkbox")]
    NotACheckbox { field: FormField },
}

/// Parse a number field. Never fails: unusable input becomes `0`.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// In-memory form state for the service being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceForm {
    pub standard_value_per_unit: f64,
    pub min_time: f64,
    pub wait_time: f64,
    pub efficiency_start: f64,
    pub efficiency_cap: f64,
    pub efficiency_step_percent: f64,
    pub max_productivity_per_day: f64,
    pub material_type: MaterialType,
    pub material_value: f64,
    pub workflow_order: f64,
    pub workflow_phase: WorkflowPhase,
    pub creates_dust: bool,
    pub sub_workflow_order: f64,
    pub sub_workflow_total: f64,
    pub sub_workflow_explanation: String,
}

impl Default for ServiceForm {
    fn default() -> Self {
        Self {
            standard_value_per_unit: 0.0,
            min_time: 0.0,
            wait_time: 0.0,
            efficiency_start: 0.0,
            efficiency_cap: 0.0,
            efficiency_step_percent: DEFAULT_EFFICIENCY_STEP_PERCENT,
            max_productivity_per_day: 0.0,
            material_type: MaterialType::Percent,
            material_value: DEFAULT_MATERIAL_VALUE,
            workflow_order: DEFAULT_WORKFLOW_ORDER,
            workflow_phase: WorkflowPhase::Beschichtung,
            creates_dust: false,
            sub_workflow_order: 0.0,
            sub_workflow_total: 0.0,
            sub_workflow_explanation: String::new(),
        }
    }
}

impl ServiceForm {
    /// Load stored configuration, filling absent fields with defaults.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let defaults = Self::default();
        Self {
            standard_value_per_unit: config
                .standard_value_per_unit
                .unwrap_or(defaults.standard_value_per_unit),
            min_time: config.min_time.unwrap_or(defaults.min_time),
            wait_time: config.wait_time.unwrap_or(defaults.wait_time),
            efficiency_start: config.efficiency_start.unwrap_or(defaults.efficiency_start),
            efficiency_cap: config.efficiency_cap.unwrap_or(defaults.efficiency_cap),
            efficiency_step_percent: config
                .efficiency_step_percent
                .unwrap_or(defaults.efficiency_step_percent),
            max_productivity_per_day: config
                .max_productivity_per_day
                .unwrap_or(defaults.max_productivity_per_day),
            material_type: config.material_type.unwrap_or(defaults.material_type),
            material_value: config.material_value.unwrap_or(defaults.material_value),
            workflow_order: config.workflow_order.unwrap_or(defaults.workflow_order),
            workflow_phase: config.workflow_phase.unwrap_or(defaults.workflow_phase),
            creates_dust: config.creates_dust.unwrap_or(defaults.creates_dust),
            sub_workflow_order: config
                .sub_workflow_order
                .unwrap_or(defaults.sub_workflow_order),
            sub_workflow_total: config
                .sub_workflow_total
                .unwrap_or(defaults.sub_workflow_total),
            sub_workflow_explanation: config
                .sub_workflow_explanation
                .clone()
                .unwrap_or(defaults.sub_workflow_explanation),
        }
    }

    /// Every field set, ready for a full overwrite of the stored record.
    pub fn to_config(&self) -> ServiceConfig {
        ServiceConfig {
            standard_value_per_unit: Some(self.standard_value_per_unit),
            min_time: Some(self.min_time),
            wait_time: Some(self.wait_time),
            efficiency_start: Some(self.efficiency_start),
            efficiency_cap: Some(self.efficiency_cap),
            efficiency_step_percent: Some(self.efficiency_step_percent),
            max_productivity_per_day: Some(self.max_productivity_per_day),
            material_type: Some(self.material_type),
            material_value: Some(self.material_value),
            workflow_order: Some(self.workflow_order),
            workflow_phase: Some(self.workflow_phase),
            creates_dust: Some(self.creates_dust),
            sub_workflow_order: Some(self.sub_workflow_order),
            sub_workflow_total: Some(self.sub_workflow_total),
            sub_workflow_explanation: Some(self.sub_workflow_explanation.clone()),
        }
    }

    /// Apply raw input to a non-checkbox field.
    pub fn set(&mut self, field: FormField, raw: &str) -> Result<(), FormError> {
        match field.kind() {
            FieldKind::Number => {
                if let Some(slot) = self.number_mut(field) {
                    *slot = coerce_number(raw);
                }
                Ok(())
            }
            FieldKind::Checkbox => Err(FormError::CheckboxNeedsToggle { field }),
            FieldKind::MaterialChoice => {
                self.material_type =
                    MaterialType::from_key(raw).ok_or_else(|| FormError::InvalidChoice {
                        field,
                        input: raw.to_string(),
                        expected: join_keys(MaterialType::ALL.iter().map(|m| m.key())),
                    })?;
                Ok(())
            }
            FieldKind::PhaseChoice => {
                self.workflow_phase =
                    WorkflowPhase::from_key(raw).ok_or_else(|| FormError::InvalidChoice {
                        field,
                        input: raw.to_string(),
                        expected: join_keys(WorkflowPhase::ALL.iter().map(|p| p.key())),
                    })?;
                Ok(())
            }
            FieldKind::Text => {
                if field == FormField::SubWorkflowExplanation {
                    self.sub_workflow_explanation = raw.trim().to_string();
                }
                Ok(())
            }
        }
    }

    /// Flip a checkbox field. Returns the new value.
    pub fn toggle(&mut self, field: FormField) -> Result<bool, FormError> {
        match field {
            FormField::CreatesDust => {
                self.creates_dust = !self.creates_dust;
                Ok(self.creates_dust)
            }
            _ => Err(FormError::NotACheckbox { field }),
        }
    }

    /// Current value formatted for display.
    pub fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::MaterialType => self.material_type.key().to_string(),
            FormField::WorkflowPhase => format!(
                "{} ({})",
                self.workflow_phase.key(),
                self.workflow_phase.label()
            ),
            FormField::CreatesDust => if self.creates_dust { "ja" } else { "nein" }.to_string(),
            FormField::SubWorkflowExplanation => self.sub_workflow_explanation.clone(),
            number => self
                .number(number)
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn number(&self, field: FormField) -> Option<f64> {
        Some(match field {
            FormField::StandardValuePerUnit => self.standard_value_per_unit,
            FormField::MinTime => self.min_time,
            FormField::WaitTime => self.wait_time,
            FormField::EfficiencyStart => self.efficiency_start,
            FormField::EfficiencyCap => self.efficiency_cap,
            FormField::EfficiencyStepPercent => self.efficiency_step_percent,
            FormField::MaxProductivityPerDay => self.max_productivity_per_day,
            FormField::MaterialValue => self.material_value,
            FormField::WorkflowOrder => self.workflow_order,
            FormField::SubWorkflowOrder => self.sub_workflow_order,
            FormField::SubWorkflowTotal => self.sub_workflow_total,
            _ => return None,
        })
    }

    fn number_mut(&mut self, field: FormField) -> Option<&mut f64> {
        Some(match field {
            FormField::StandardValuePerUnit => &mut self.standard_value_per_unit,
            FormField::MinTime => &mut self.min_time,
            FormField::WaitTime => &mut self.wait_time,
            FormField::EfficiencyStart => &mut self.efficiency_start,
            FormField::EfficiencyCap => &mut self.efficiency_cap,
            FormField::EfficiencyStepPercent => &mut self.efficiency_step_percent,
            FormField::MaxProductivityPerDay => &mut self.max_productivity_per_day,
            FormField::MaterialValue => &mut self.material_value,
            FormField::WorkflowOrder => &mut self.workflow_order,
            FormField::SubWorkflowOrder => &mut self.sub_workflow_order,
            FormField::SubWorkflowTotal => &mut self.sub_workflow_total,
            _ => return None,
        })
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    keys.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number_clamps_to_zero() {
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number("inf"), 0.0);
        assert_eq!(coerce_number("  12.5 "), 12.5);
        assert_eq!(coerce_number("2,75"), 2.75);
        assert_eq!(coerce_number("-3"), -3.0);
    }

    #[test]
    fn test_defaults() {
        let form = ServiceForm::from_config(&ServiceConfig::default());
        assert_eq!(form.efficiency_step_percent, 1.0);
        assert_eq!(form.material_type, MaterialType::Percent);
        assert_eq!(form.material_value, 15.0);
        assert_eq!(form.workflow_order, 20.0);
        assert_eq!(form.workflow_phase, WorkflowPhase::Beschichtung);
        assert_eq!(form.min_time, 0.0);
        assert!(!form.creates_dust);
    }

    #[test]
    fn test_stored_values_win_over_defaults() {
        let config = ServiceConfig {
            material_value: Some(0.0),
            workflow_phase: Some(WorkflowPhase::Reinigung),
            creates_dust: Some(true),
            ..Default::default()
        };
        let form = ServiceForm::from_config(&config);
        assert_eq!(form.material_value, 0.0);
        assert_eq!(form.workflow_phase, WorkflowPhase::Reinigung);
        assert!(form.creates_dust);
    }

    #[test]
    fn test_every_field_has_one_spec() {
        for spec in FIELDS {
            assert_eq!(spec.field.spec().key, spec.key);
            assert_eq!(FormField::from_key(spec.key), Some(spec.field));
        }
        assert_eq!(FIELDS.len(), 15);

        let keys: std::collections::HashSet<&str> = FIELDS.iter().map(|spec| spec.key).collect();
        assert_eq!(keys.len(), FIELDS.len());
        assert_eq!(FormField::SubWorkflowTotal.key(), "subWorkflowTotal");
        assert_eq!(FormField::MaterialType.kind(), FieldKind::MaterialChoice);
    }

    #[test]
    fn test_set_number_fields() {
        let mut form = ServiceForm::default();
        form.set(FormField::MinTime, "45").unwrap();
        form.set(FormField::WaitTime, "").unwrap();
        form.set(FormField::MaterialValue, "abc").unwrap();
        assert_eq!(form.min_time, 45.0);
        assert_eq!(form.wait_time, 0.0);
        assert_eq!(form.material_value, 0.0);
    }

    #[test]
    fn test_set_choice_keeps_value_on_bad_input() {
        let mut form = ServiceForm::default();
        let err = form.set(FormField::WorkflowPhase, "tapezieren").unwrap_err();
        assert!(matches!(err, FormError::InvalidChoice { .. }));
        assert_eq!(form.workflow_phase, WorkflowPhase::Beschichtung);

        form.set(FormField::MaterialType, "fest").unwrap();
        assert_eq!(form.material_type, MaterialType::Fixed);
    }

    #[test]
    fn test_checkbox_only_toggles() {
        let mut form = ServiceForm::default();
        assert!(form.set(FormField::CreatesDust, "true").is_err());
        assert!(form.toggle(FormField::CreatesDust).unwrap());
        assert!(!form.toggle(FormField::CreatesDust).unwrap());
        assert!(form.toggle(FormField::MinTime).is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let mut form = ServiceForm::default();
        form.set(FormField::StandardValuePerUnit, "3.5").unwrap();
        form.set(FormField::SubWorkflowExplanation, "  Vor dem Streichen ").unwrap();
        form.toggle(FormField::CreatesDust).unwrap();

        let reloaded = ServiceForm::from_config(&form.to_config());
        assert_eq!(reloaded, form);
        assert_eq!(reloaded.sub_workflow_explanation, "Vor dem Streichen");
    }
}
