//! Shared test utilities for workflow integration tests.
//!
//! Provides `TestEnv` - an isolated catalog store in a `TempDir`, with
//! builders for catalog records and a repository wrapper that can be told to
//! fail saves.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use paintquote::catalog::{Service, ServiceTag, SpecialService};
use paintquote::services::{ClassifyOptions, OnboardingSession, SeedService};
use paintquote::store::error::Result as StoreResult;
use paintquote::store::{CatalogRepository, Database, StoreError};

/// An isolated store directory.
///
/// Automatically cleaned up when dropped.
#[allow(dead_code)]
pub struct TestEnv {
    temp_dir: TempDir,
    pub store_dir: PathBuf,
    services: Vec<Service>,
    special_services: Vec<SpecialService>,
    reference: bool,
}

#[allow(dead_code)]
impl TestEnv {
    /// Start building an environment.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let store_dir = temp_dir.path().join("store");
        Ok(Self {
            temp_dir,
            store_dir,
            services: Vec::new(),
            special_services: Vec::new(),
            reference: false,
        })
    }

    // ==================== Builder ====================

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_special_service(mut self, special: SpecialService) -> Self {
        self.special_services.push(special);
        self
    }

    /// Seed the bundled reference catalog on build.
    pub fn with_reference_catalog(mut self) -> Self {
        self.reference = true;
        self
    }

    /// Write the collected records to the store.
    pub fn build(self) -> Result<Self> {
        {
            let mut db = self.open()?;
            if self.reference {
                SeedService::seed(&mut db, &SeedService::reference_catalog()?)?;
            }
            for service in &self.services {
                db.services_mut().insert(service.clone())?;
            }
            for special in &self.special_services {
                db.special_services_mut().insert(special.clone())?;
            }
        }
        Ok(self)
    }

    // ==================== Access ====================

    /// Open the store. Only one handle can be open at a time.
    pub fn open(&self) -> Result<Database> {
        Database::open(&self.store_dir).context("Failed to open test store")
    }

    /// Start an onboarding session over the store.
    pub fn session(&self) -> Result<OnboardingSession<Database>> {
        Ok(OnboardingSession::start(
            self.open()?,
            ClassifyOptions::default(),
        )?)
    }

    /// Read one stored service from a fresh handle.
    pub fn stored_service(&self, id: &str) -> Result<Service> {
        let db = self.open()?;
        db.services()
            .find_by_id(id)
            .cloned()
            .with_context(|| format!("service '{}' not stored", id))
    }

    pub fn collection_file(&self, name: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", name))
    }

    pub fn read_collection_file(&self, name: &str) -> Result<serde_json::Value> {
        let content = fs::read_to_string(self.collection_file(name))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn temp_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

// ==================== Record Builders ====================

#[allow(dead_code)]
pub fn main_service(id: &str, title: &str) -> Service {
    Service::new(id, title).with_tags([ServiceTag::MainService])
}

#[allow(dead_code)]
pub fn sub_service(id: &str, title: &str, included_in: &[&str]) -> Service {
    Service::new(id, title)
        .with_tags([ServiceTag::BackendSubService])
        .with_included_in(included_in.iter().copied())
}

#[allow(dead_code)]
pub fn dual_role_service(id: &str, title: &str, included_in: &[&str]) -> Service {
    Service::new(id, title)
        .with_tags([ServiceTag::MainService, ServiceTag::BackendSubService])
        .with_included_in(included_in.iter().copied())
}

#[allow(dead_code)]
pub fn category_header(id: &str, title: &str) -> Service {
    Service::new(id, title).with_tags([ServiceTag::CategoryHeader, ServiceTag::MainService])
}

// ==================== Failure Injection ====================

/// Repository wrapper whose saves can be switched to fail.
#[allow(dead_code)]
pub struct FlakyRepository<R> {
    pub inner: R,
    pub fail_saves: bool,
    pub attempts: usize,
}

#[allow(dead_code)]
impl<R> FlakyRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            fail_saves: false,
            attempts: 0,
        }
    }
}

impl<R: CatalogRepository> CatalogRepository for FlakyRepository<R> {
    fn load_services(&self) -> StoreResult<Vec<Service>> {
        self.inner.load_services()
    }

    fn save_service(&mut self, service: &Service) -> StoreResult<Service> {
        self.attempts += 1;
        if self.fail_saves {
            return Err(StoreError::Io {
                path: PathBuf::from("services.json"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.save_service(service)
    }
}
