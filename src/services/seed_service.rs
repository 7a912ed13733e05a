//! Catalog seeding.
//!
//! Seeding only adds documents whose id is not stored yet, so running it
//! twice changes nothing. A reset clears the three collections first.

use crate::catalog::{Service, SpecialService, SurchargeFactor};
use crate::store::{Database, InsertReport, Query};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const REFERENCE_CATALOG: &str = include_str!("../../data/reference_catalog.json");

/// Contents of a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPayload {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub special_services: Vec<SpecialService>,
    #[serde(default)]
    pub surcharge_factors: Vec<SurchargeFactor>,
}

/// Per-collection outcome of a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub services: InsertReport,
    pub special_services: InsertReport,
    pub surcharge_factors: InsertReport,
}

impl SeedReport {
    pub fn inserted(&self) -> usize {
        self.services.inserted + self.special_services.inserted + self.surcharge_factors.inserted
    }

    pub fn skipped(&self) -> usize {
        self.services.skipped + self.special_services.skipped + self.surcharge_factors.skipped
    }
}

pub struct SeedService;

impl SeedService {
    /// The catalog bundled with the binary.
    pub fn reference_catalog() -> Result<SeedPayload> {
        serde_json::from_str(REFERENCE_CATALOG).context("Bundled reference catalog is invalid")
    }

    /// Read a seed payload from a JSON file.
    pub fn load_payload(path: &Path) -> Result<SeedPayload> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file: {:?}", path))
    }

    /// Insert every document of `payload` whose id is not stored yet.
    pub fn seed(db: &mut Database, payload: &SeedPayload) -> Result<SeedReport> {
        let report = SeedReport {
            services: db
                .services_mut()
                .insert_missing(payload.services.iter().cloned())
                .context("Failed to seed services")?,
            special_services: db
                .special_services_mut()
                .insert_missing(payload.special_services.iter().cloned())
                .context("Failed to seed special services")?,
            surcharge_factors: db
                .surcharge_factors_mut()
                .insert_missing(payload.surcharge_factors.iter().cloned())
                .context("Failed to seed surcharge factors")?,
        };
        info!(
            "Seeded catalog: {} inserted, {} already present",
            report.inserted(),
            report.skipped()
        );
        Ok(report)
    }

    /// Remove every document from the three collections. Returns how many
    /// were removed.
    pub fn reset(db: &mut Database) -> Result<usize> {
        let removed = db
            .services_mut()
            .remove(&Query::All)
            .context("Failed to clear services")?
            + db
                .special_services_mut()
                .remove(&Query::All)
                .context("Failed to clear special services")?
            + db
                .surcharge_factors_mut()
                .remove(&Query::All)
                .context("Failed to clear surcharge factors")?;
        info!("Cleared {} documents from the store", removed);
        Ok(removed)
    }
}
