//! paintquote - service catalog onboarding for painting businesses
//!
//! This library provides the catalog model, a local document store, and the
//! onboarding workflow that walks through every main service of the catalog
//! and records its configuration.

// Core modules
pub mod catalog;
pub mod cli;
pub mod config;
pub mod services;
pub mod store;
pub mod utils;

// Re-exports for convenience
pub use catalog::{Service, ServiceConfig, ServiceTag, ServiceTags, SpecialService, SurchargeFactor};
pub use config::Config;
pub use services::{OnboardingSession, SessionState};
pub use store::{CatalogRepository, Database, StoreError};
