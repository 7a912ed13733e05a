//! Sub-service selection for a main service.
//!
//! A sub-service can be attached to a main service from either side: the
//! main service lists it in `includedSubServices`, or the sub-service lists
//! the main service in `includedIn`. The effective selection is the union.

use crate::catalog::Service;
use std::collections::BTreeSet;

pub struct SubServiceResolver;

impl SubServiceResolver {
    /// Effective sub-service ids for `main`.
    pub fn resolve_selected(main: &Service, sub_services: &[Service]) -> BTreeSet<String> {
        let mut selected: BTreeSet<String> = main.included_sub_services.iter().cloned().collect();
        selected.extend(Self::implicit(main, sub_services));
        selected
    }

    /// Sub-services that name `main` in their `includedIn`.
    pub fn implicit(main: &Service, sub_services: &[Service]) -> BTreeSet<String> {
        sub_services
            .iter()
            .filter(|sub| sub.included_in.iter().any(|id| *id == main.id))
            .map(|sub| sub.id.clone())
            .collect()
    }

    /// The selection in the display order of `sub_services`, followed by
    /// selected ids the catalog does not know (sorted).
    pub fn ordered_selection(selected: &BTreeSet<String>, sub_services: &[Service]) -> Vec<String> {
        let mut ordered: Vec<String> = sub_services
            .iter()
            .filter(|sub| selected.contains(&sub.id))
            .map(|sub| sub.id.clone())
            .collect();
        let known: BTreeSet<&str> = sub_services.iter().map(|s| s.id.as_str()).collect();
        ordered.extend(
            selected
                .iter()
                .filter(|id| !known.contains(id.as_str()))
                .cloned(),
        );
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServiceTag;

    fn sub(id: &str, title: &str, included_in: &[&str]) -> Service {
        Service::new(id, title)
            .with_tags([ServiceTag::BackendSubService])
            .with_included_in(included_in.iter().copied())
    }

    #[test]
    fn test_union_of_explicit_and_implicit() {
        let main = Service::new("m1", "Wand").with_included_sub_services(["s2"]);
        let subs = vec![
            sub("s1", "Abkleben", &["m1"]),
            sub("s2", "Abdecken", &[]),
            sub("s3", "Spachteln", &["m9"]),
        ];

        let selected = SubServiceResolver::resolve_selected(&main, &subs);
        assert_eq!(selected, BTreeSet::from(["s1".to_string(), "s2".to_string()]));
    }

    #[test]
    fn test_overlap_is_deduplicated() {
        let main = Service::new("m1", "Wand").with_included_sub_services(["s1"]);
        let subs = vec![sub("s1", "Abkleben", &["m1"])];
        assert_eq!(SubServiceResolver::resolve_selected(&main, &subs).len(), 1);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let main = Service::new("m1", "Wand");
        let subs = vec![sub("s1", "Abkleben", &["m1", "m2"])];
        let first = SubServiceResolver::resolve_selected(&main, &subs);
        let second = SubServiceResolver::resolve_selected(&main, &subs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ordered_selection_follows_catalog_order() {
        let subs = vec![sub("s2", "Abdecken", &[]), sub("s1", "Abkleben", &[])];
        let selected = BTreeSet::from(["s1".to_string(), "s2".to_string(), "gone".to_string()]);
        assert_eq!(
            SubServiceResolver::ordered_selection(&selected, &subs),
            vec!["s2".to_string(), "s1".to_string(), "gone".to_string()]
        );
    }
}
