use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::info;

use crate::catalog::{Service, SpecialService};
use crate::services::catalog_service::{CatalogService, ClassifyOptions, IntegrityWarning};
use crate::store::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Warning,
    Error,
}

/// Repairs the doctor knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FixAction {
    /// Drop references to ids that are not in the store
    PruneDanglingReferences,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub category: String,
    pub message: String,
    pub status: ValidationStatus,
    pub fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_action: Option<FixAction>,
}

/// Consistency checks over the catalog store.
pub struct CatalogDoctor<'a> {
    db: &'a mut Database,
    options: ClassifyOptions,
    results: Vec<ValidationResult>,
    fix_mode: bool,
}

impl<'a> CatalogDoctor<'a> {
    pub fn new(db: &'a mut Database, options: ClassifyOptions, fix_mode: bool) -> Self {
        Self {
            db,
            options,
            results: Vec::new(),
            fix_mode,
        }
    }

    pub fn run_diagnostics(&mut self) -> Result<Vec<ValidationResult>> {
        self.check_catalog();
        self.check_references();
        self.check_efficiency_ranges();
        self.check_progress();

        if self.fix_mode {
            self.fix_issues()?;
        }

        Ok(self.results.clone())
    }

    fn fix_issues(&mut self) -> Result<()> {
        let wants_prune = self.results.iter().any(|r| {
            r.status != ValidationStatus::Pass
                && r.fix_action == Some(FixAction::PruneDanglingReferences)
        });
        if !wants_prune {
            return Ok(());
        }

        let pruned = self.prune_dangling_references()?;
        info!("Doctor pruned {} dangling references", pruned);
        self.add_result(
            "Fix",
            &format!("Removed {} dangling references", pruned),
            ValidationStatus::Pass,
            None,
        );
        Ok(())
    }

    fn add_result(
        &mut self,
        category: &str,
        message: &str,
        status: ValidationStatus,
        fix_action: Option<FixAction>,
    ) {
        self.results.push(ValidationResult {
            category: category.to_string(),
            message: message.to_string(),
            status,
            fixable: fix_action.is_some(),
            fix_action,
        });
    }

    fn check_catalog(&mut self) {
        let classification =
            CatalogService::classify(self.db.services().find_all(), &self.options);

        for warning in &classification.warnings {
            let status = match warning {
                IntegrityWarning::CatalogBelowMinimum { .. } => ValidationStatus::Warning,
                IntegrityWarning::MissingServiceType { .. }
                | IntegrityWarning::NoMainServices { .. } => ValidationStatus::Error,
            };
            self.add_result("Catalog", &warning.to_string(), status, None);
        }

        if classification.warnings.is_empty() {
            self.add_result(
                "Catalog",
                &format!(
                    "{} records: {} main services, {} sub-services, {} dual-role",
                    classification.catalog_size,
                    classification.main_services.len(),
                    classification.sub_services.len(),
                    classification.dual_role_count()
                ),
                ValidationStatus::Pass,
                None,
            );
        }
    }

    fn check_references(&mut self) {
        let ids: HashSet<String> = self.db.services().iter().map(|s| s.id.clone()).collect();
        let sub_ids: HashSet<String> = self
            .db
            .services()
            .iter()
            .filter(|s| s.is_sub_service())
            .map(|s| s.id.clone())
            .collect();

        let mut dangling = Vec::new();
        let mut not_sub = Vec::new();
        for service in self.db.services().iter() {
            if let Some(parent) = &service.parent_service_id {
                if !ids.contains(parent) {
                    dangling.push(format!("{}.parentServiceId -> {}", service.id, parent));
                }
            }
            for id in &service.included_in {
                if !ids.contains(id) {
                    dangling.push(format!("{}.includedIn -> {}", service.id, id));
                }
            }
            for id in &service.included_sub_services {
                if !ids.contains(id) {
                    dangling.push(format!("{}.includedSubServices -> {}", service.id, id));
                } else if !sub_ids.contains(id) {
                    not_sub.push(format!("{} -> {}", service.id, id));
                }
            }
        }
        for special in self.db.special_services().iter() {
            if let Some(required) = &special.required_service {
                if !ids.contains(required) {
                    dangling.push(format!("{}.requiredService -> {}", special.id, required));
                }
            }
            for id in &special.affects_service {
                if !ids.contains(id) {
                    dangling.push(format!("{}.affectsService -> {}", special.id, id));
                }
            }
        }

        if dangling.is_empty() {
            self.add_result(
                "References",
                "All references point to stored services",
                ValidationStatus::Pass,
                None,
            );
        } else {
            self.add_result(
                "References",
                &format!("{} dangling references: {}", dangling.len(), dangling.join(", ")),
                ValidationStatus::Warning,
                Some(FixAction::PruneDanglingReferences),
            );
        }

        if !not_sub.is_empty() {
            self.add_result(
                "References",
                &format!(
                    "{} selected sub-services are not tagged as sub-service: {}",
                    not_sub.len(),
                    not_sub.join(", ")
                ),
                ValidationStatus::Warning,
                None,
            );
        }
    }

    fn check_efficiency_ranges(&mut self) {
        let inverted: Vec<String> = self
            .db
            .services()
            .iter()
            .filter(|s| s.has_inverted_efficiency_range())
            .map(|s| s.id.clone())
            .collect();

        if inverted.is_empty() {
            self.add_result(
                "Efficiency",
                "Efficiency ranges are consistent",
                ValidationStatus::Pass,
                None,
            );
        } else {
            self.add_result(
                "Efficiency",
                &format!(
                    "efficiencyStart is above efficiencyCap for: {}",
                    inverted.join(", ")
                ),
                ValidationStatus::Warning,
                None,
            );
        }
    }

    fn check_progress(&mut self) {
        let main = CatalogService::main_services(&self.db.services().find_all());
        let configured = main
            .iter()
            .filter(|s| s.config_onboarding_completed)
            .count();
        self.add_result(
            "Progress",
            &format!("{}/{} main services configured", configured, main.len()),
            ValidationStatus::Pass,
            None,
        );

        let specials = self.db.special_services().count();
        let pending = self
            .db
            .special_services()
            .iter()
            .filter(|s| !s.onboarding_completed)
            .count();
        self.add_result(
            "Progress",
            &format!("{}/{} special services configured", specials - pending, specials),
            ValidationStatus::Pass,
            None,
        );
    }

    /// Remove every reference to an id that is not stored. Returns how many
    /// references were dropped.
    fn prune_dangling_references(&mut self) -> Result<usize> {
        let ids: HashSet<String> = self.db.services().iter().map(|s| s.id.clone()).collect();
        let mut pruned = 0;

        let service_fixes: Vec<(String, Map<String, Value>, usize)> = self
            .db
            .services()
            .iter()
            .filter_map(|service| service_fix(service, &ids))
            .collect();
        for (id, fields, count) in service_fixes {
            self.db
                .services_mut()
                .update(&id, fields)
                .with_context(|| format!("Failed to prune references of service '{}'", id))?;
            pruned += count;
        }

        let special_fixes: Vec<(String, Map<String, Value>, usize)> = self
            .db
            .special_services()
            .iter()
            .filter_map(|special| special_fix(special, &ids))
            .collect();
        for (id, fields, count) in special_fixes {
            self.db
                .special_services_mut()
                .update(&id, fields)
                .with_context(|| {
                    format!("Failed to prune references of special service '{}'", id)
                })?;
            pruned += count;
        }

        Ok(pruned)
    }
}

fn retain_known(list: &[String], ids: &HashSet<String>) -> (Vec<String>, usize) {
    let kept: Vec<String> = list.iter().filter(|id| ids.contains(*id)).cloned().collect();
    let removed = list.len() - kept.len();
    (kept, removed)
}

fn service_fix(
    service: &Service,
    ids: &HashSet<String>,
) -> Option<(String, Map<String, Value>, usize)> {
    let mut fields = Map::new();
    let mut count = 0;

    if service
        .parent_service_id
        .as_ref()
        .is_some_and(|parent| !ids.contains(parent))
    {
        fields.insert("parentServiceId".to_string(), Value::Null);
        count += 1;
    }
    let (included_in, removed) = retain_known(&service.included_in, ids);
    if removed > 0 {
        fields.insert("includedIn".to_string(), Value::from(included_in));
        count += removed;
    }
    let (included_subs, removed) = retain_known(&service.included_sub_services, ids);
    if removed > 0 {
        fields.insert("includedSubServices".to_string(), Value::from(included_subs));
        count += removed;
    }

    (count > 0).then(|| (service.id.clone(), fields, count))
}

fn special_fix(
    special: &SpecialService,
    ids: &HashSet<String>,
) -> Option<(String, Map<String, Value>, usize)> {
    let mut fields = Map::new();
    let mut count = 0;

    if special
        .required_service
        .as_ref()
        .is_some_and(|required| !ids.contains(required))
    {
        fields.insert("requiredService".to_string(), Value::Null);
        count += 1;
    }
    let (affects, removed) = retain_known(&special.affects_service, ids);
    if removed > 0 {
        fields.insert("affectsService".to_string(), Value::from(affects));
        count += removed;
    }

    (count > 0).then(|| (special.id.clone(), fields, count))
}
