//! Classification tags attached to catalog services.
//!
//! Older catalog exports store the tags as one composite label such as
//! `"Shop Leistung, Unterleistung Backend"`. On input both that form and a
//! list of labels are accepted; the stored form is always the list.

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single classification tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceTag {
    /// Grouping row used only for display ("Shop Titel Leistung").
    CategoryHeader,
    /// Purchasable, independently configurable service ("Shop Leistung").
    MainService,
    /// Internal service bundled into main services ("Unterleistung Backend").
    BackendSubService,
    /// Any label this tool does not interpret, kept verbatim.
    Other(String),
}

impl ServiceTag {
    pub const CATEGORY_HEADER_LABEL: &'static str = "Shop Titel Leistung";
    pub const MAIN_SERVICE_LABEL: &'static str = "Shop Leistung";
    pub const BACKEND_SUB_SERVICE_LABEL: &'static str = "Unterleistung Backend";

    /// Map a label to a tag. Matching is exact after trimming; a label that
    /// merely contains a known label is an `Other` tag.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            Self::CATEGORY_HEADER_LABEL => Self::CategoryHeader,
            Self::MAIN_SERVICE_LABEL => Self::MainService,
            Self::BACKEND_SUB_SERVICE_LABEL => Self::BackendSubService,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::CategoryHeader => Self::CATEGORY_HEADER_LABEL,
            Self::MainService => Self::MAIN_SERVICE_LABEL,
            Self::BackendSubService => Self::BACKEND_SUB_SERVICE_LABEL,
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The set of tags carried by one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTags(BTreeSet<ServiceTag>);

impl ServiceTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a composite label on `,` and `;` into tags. Empty segments are
    /// dropped.
    pub fn parse_composite(composite: &str) -> Self {
        composite
            .split([',', ';'])
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(ServiceTag::from_label)
            .collect()
    }

    pub fn contains(&self, tag: &ServiceTag) -> bool {
        self.0.contains(tag)
    }

    pub fn insert(&mut self, tag: ServiceTag) -> bool {
        self.0.insert(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceTag> {
        self.0.iter()
    }

    /// Labels joined the way the legacy composite field looked.
    pub fn composite_label(&self) -> String {
        self.0
            .iter()
            .map(ServiceTag::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<ServiceTag> for ServiceTags {
    fn from_iter<I: IntoIterator<Item = ServiceTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ServiceTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for tag in &self.0 {
            seq.serialize_element(tag.label())?;
        }
        seq.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    Composite(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for ServiceTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match TagsRepr::deserialize(deserializer)? {
            TagsRepr::Composite(composite) => Self::parse_composite(&composite),
            TagsRepr::List(labels) => labels
                .iter()
                .map(String::as_str)
                .filter(|label| !label.trim().is_empty())
                .map(ServiceTag::from_label)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_composite_label() {
        let tags = ServiceTags::parse_composite("Shop Leistung, Unterleistung Backend");
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&ServiceTag::MainService));
        assert!(tags.contains(&ServiceTag::BackendSubService));
    }

    #[test]
    fn test_longer_label_is_not_a_known_tag() {
        let tags = ServiceTags::parse_composite("Shop Leistung Archiv");
        assert!(!tags.contains(&ServiceTag::MainService));
        assert!(tags.contains(&ServiceTag::Other("Shop Leistung Archiv".to_string())));
    }

    #[test]
    fn test_deserialize_string_and_list() {
        let from_string: ServiceTags =
            serde_json::from_str("\"Shop Titel Leistung; Shop Leistung\"").unwrap();
        let from_list: ServiceTags =
            serde_json::from_str("[\"Shop Leistung\", \"Shop Titel Leistung\"]").unwrap();
        assert_eq!(from_string, from_list);
    }

    #[test]
    fn test_serializes_as_label_list() {
        let tags = ServiceTags::parse_composite("Unterleistung Backend,Shop Leistung");
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, "[\"Shop Leistung\",\"Unterleistung Backend\"]");
    }

    #[test]
    fn test_empty_segments_dropped() {
        let tags = ServiceTags::parse_composite(" , ;Shop Leistung,, ");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.composite_label(), "Shop Leistung");
    }
}
