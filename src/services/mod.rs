//! Application services layer.
//!
//! Services hold the catalog logic and stay free of terminal I/O, so the CLI
//! and the tests drive the same code.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   CLI Layer                     │
//! │  (commands, interactive onboarding prompt)      │
//! └─────────────────────┬───────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               Services Layer                         │
//! │  ┌────────────────┐ ┌────────────────────┐           │
//! │  │ CatalogService │ │ SubServiceResolver │           │
//! │  └────────────────┘ └────────────────────┘           │
//! │  ┌───────────────────┐ ┌─────────────┐ ┌────────────┐│
//! │  │ OnboardingSession │ │ SeedService │ │ SpecialSvc ││
//! │  └───────────────────┘ └─────────────┘ └────────────┘│
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────┐
//! │             Infrastructure Layer                 │
//! │  (Database, Collection, Config, etc.)            │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod catalog_service;
pub mod onboarding_service;
pub mod seed_service;
pub mod special_service;
pub mod sub_service_resolver;

// Re-export common types
pub use catalog_service::{CatalogService, Classification, ClassifyOptions, IntegrityWarning};
pub use onboarding_service::{OnboardingError, OnboardingSession, SessionState, Transition};
pub use seed_service::{SeedPayload, SeedReport, SeedService};
pub use special_service::SpecialServiceService;
pub use sub_service_resolver::SubServiceResolver;
