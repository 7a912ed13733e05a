//! Catalog classification.
//!
//! Splits the raw service collection into the editable main services and
//! the bundled sub-services, and collects data-integrity warnings along the
//! way. Nothing here fails: a partial catalog still yields a usable result.

use crate::catalog::{Service, ServiceTag, ServiceTags};
use crate::utils::collation::compare_titles;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Non-fatal catalog problem found during classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntegrityWarning {
    /// The record has no type field and is left out of every list.
    MissingServiceType { id: String, title: String },
    /// The catalog has records but none of them is a main service.
    NoMainServices { catalog_size: usize },
    /// The catalog holds fewer records than configured.
    CatalogBelowMinimum { actual: usize, expected: usize },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingServiceType { id, title } => {
                write!(f, "Service '{}' ({}) has no service type and was skipped", title, id)
            }
            Self::NoMainServices { catalog_size } => write!(
                f,
                "Catalog has {} records but no main service",
                catalog_size
            ),
            Self::CatalogBelowMinimum { actual, expected } => write!(
                f,
                "Catalog has {} records, expected at least {}",
                actual, expected
            ),
        }
    }
}

/// Options for [`CatalogService::classify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Report a warning when the catalog is smaller than this. `0` disables it.
    pub min_catalog_size: usize,
}

/// Result of classifying a catalog.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Editable main services, sorted by title
    pub main_services: Vec<Service>,
    /// Services tagged as sub-services, sorted by title
    pub sub_services: Vec<Service>,
    pub warnings: Vec<IntegrityWarning>,
    /// Number of records in the raw catalog
    pub catalog_size: usize,
}

impl Classification {
    pub fn dual_role_count(&self) -> usize {
        self.main_services
            .iter()
            .filter(|service| CatalogService::is_dual_role(service))
            .count()
    }

    /// Position of a main service in the sorted list.
    pub fn main_index_of(&self, id: &str) -> Option<usize> {
        self.main_services.iter().position(|s| s.id == id)
    }
}

/// Service for catalog classification.
pub struct CatalogService;

impl CatalogService {
    /// Partition `services` into main services and sub-services.
    pub fn classify(services: Vec<Service>, options: &ClassifyOptions) -> Classification {
        let catalog_size = services.len();
        let mut warnings = Vec::new();

        if options.min_catalog_size > 0 && catalog_size < options.min_catalog_size {
            warnings.push(IntegrityWarning::CatalogBelowMinimum {
                actual: catalog_size,
                expected: options.min_catalog_size,
            });
        }

        let mut main_services = Vec::new();
        let mut sub_services = Vec::new();
        for service in services {
            if service.service_type.as_ref().is_none_or(ServiceTags::is_empty) {
                warnings.push(IntegrityWarning::MissingServiceType {
                    id: service.id.clone(),
                    title: service.title.clone(),
                });
                continue;
            }
            if service.is_sub_service() {
                sub_services.push(service.clone());
            }
            if service.is_main_service() {
                main_services.push(service);
            }
        }

        if main_services.is_empty() && catalog_size > 0 {
            warnings.push(IntegrityWarning::NoMainServices { catalog_size });
        }

        Self::sort_by_title(&mut main_services);
        Self::sort_by_title(&mut sub_services);

        for warning in &warnings {
            warn!("Catalog integrity: {}", warning);
        }

        Classification {
            main_services,
            sub_services,
            warnings,
            catalog_size,
        }
    }

    /// Main services of `services`, sorted by title.
    pub fn main_services(services: &[Service]) -> Vec<Service> {
        let mut main: Vec<Service> = services
            .iter()
            .filter(|s| s.is_main_service())
            .cloned()
            .collect();
        Self::sort_by_title(&mut main);
        main
    }

    /// Sub-services of `services`, sorted by title.
    pub fn sub_services(services: &[Service]) -> Vec<Service> {
        let mut subs: Vec<Service> = services
            .iter()
            .filter(|s| s.is_sub_service())
            .cloned()
            .collect();
        Self::sort_by_title(&mut subs);
        subs
    }

    /// Whether a service is also used as a sub-service. Meant for main
    /// services, where this marks the dual role.
    pub fn is_dual_role(service: &Service) -> bool {
        service.has_tag(&ServiceTag::BackendSubService)
    }

    fn sort_by_title(services: &mut [Service]) {
        services.sort_by(|a, b| compare_titles(&a.title, &b.title).then_with(|| a.id.cmp(&b.id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(id: &str, title: &str, tags: &[ServiceTag]) -> Service {
        Service::new(id, title).with_tags(tags.iter().cloned())
    }

    #[test]
    fn test_classify_partitions_and_sorts() {
        let catalog = vec![
            tagged(
                "h1",
                "Innenarbeiten",
                &[ServiceTag::CategoryHeader, ServiceTag::MainService],
            ),
            tagged("m2", "Wand streichen", &[ServiceTag::MainService]),
            tagged("m1", "Decke streichen", &[ServiceTag::MainService]),
            tagged(
                "d1",
                "Ölsockel lackieren",
                &[ServiceTag::MainService, ServiceTag::BackendSubService],
            ),
            tagged("s1", "Abkleben", &[ServiceTag::BackendSubService]),
        ];

        let result = CatalogService::classify(catalog, &ClassifyOptions::default());
        let main_ids: Vec<&str> = result.main_services.iter().map(|s| s.id.as_str()).collect();
        let sub_ids: Vec<&str> = result.sub_services.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(main_ids, vec!["m1", "d1", "m2"]);
        assert_eq!(sub_ids, vec!["s1", "d1"]);
        assert_eq!(result.dual_role_count(), 1);
        assert!(result.warnings.is_empty());
        assert_eq!(result.main_index_of("m2"), Some(2));
    }

    #[test]
    fn test_missing_type_is_skipped_with_warning() {
        let catalog = vec![
            Service::new("x1", "Ohne Typ"),
            tagged("m1", "Wand streichen", &[ServiceTag::MainService]),
        ];
        let result = CatalogService::classify(catalog, &ClassifyOptions::default());
        assert_eq!(result.main_services.len(), 1);
        assert_eq!(
            result.warnings,
            vec![IntegrityWarning::MissingServiceType {
                id: "x1".to_string(),
                title: "Ohne Typ".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_type_is_skipped_with_warning() {
        let from_string: Service =
            serde_json::from_str(r#"{"id": "x1", "title": "Leer", "serviceType": ""}"#).unwrap();
        let from_list: Service =
            serde_json::from_str(r#"{"id": "x2", "title": "Liste", "serviceType": []}"#).unwrap();
        let catalog = vec![
            from_string,
            from_list,
            tagged("m1", "Wand streichen", &[ServiceTag::MainService]),
        ];

        let result = CatalogService::classify(catalog, &ClassifyOptions::default());

        assert_eq!(result.main_services.len(), 1);
        assert!(result.sub_services.is_empty());
        let flagged: Vec<&str> = result
            .warnings
            .iter()
            .filter_map(|warning| match warning {
                IntegrityWarning::MissingServiceType { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(flagged, vec!["x1", "x2"]);
    }

    #[test]
    fn test_no_main_services_is_reported() {
        let catalog = vec![tagged("s1", "Abkleben", &[ServiceTag::BackendSubService])];
        let result = CatalogService::classify(catalog, &ClassifyOptions::default());
        assert!(result.main_services.is_empty());
        assert!(result
            .warnings
            .contains(&IntegrityWarning::NoMainServices { catalog_size: 1 }));

        let empty = CatalogService::classify(Vec::new(), &ClassifyOptions::default());
        assert!(empty.warnings.is_empty());
    }

    #[test]
    fn test_catalog_below_minimum() {
        let catalog = vec![tagged("m1", "Wand", &[ServiceTag::MainService])];
        let options = ClassifyOptions { min_catalog_size: 5 };
        let result = CatalogService::classify(catalog, &options);
        assert_eq!(
            result.warnings,
            vec![IntegrityWarning::CatalogBelowMinimum { actual: 1, expected: 5 }]
        );
    }

    #[test]
    fn test_is_dual_role_checks_sub_tag() {
        let sub_only = tagged("s1", "Abkleben", &[ServiceTag::BackendSubService]);
        let main_only = tagged("m1", "Wand", &[ServiceTag::MainService]);
        assert!(CatalogService::is_dual_role(&sub_only));
        assert!(!CatalogService::is_dual_role(&main_only));
    }

    #[test]
    fn test_free_functions_match_classify() {
        let catalog = vec![
            tagged("m1", "B", &[ServiceTag::MainService]),
            tagged("m2", "a", &[ServiceTag::MainService]),
            tagged("s1", "c", &[ServiceTag::BackendSubService]),
        ];
        let main = CatalogService::main_services(&catalog);
        assert_eq!(main[0].id, "m2");
        assert_eq!(CatalogService::sub_services(&catalog).len(), 1);
    }
}
