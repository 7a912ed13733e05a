//! Catalog data model: services, special services and surcharge factors.

pub mod phase;
pub mod service;
pub mod special_service;
pub mod tags;

pub use phase::{MaterialType, WorkflowPhase};
pub use service::{Service, ServiceConfig};
pub use special_service::{SpecialService, SurchargeFactor};
pub use tags::{ServiceTag, ServiceTags};
