use crate::catalog::SpecialService;
use crate::store::Database;
use anyhow::{bail, Context, Result};
use tracing::info;

/// Service for configuring special services (site conditions).
pub struct SpecialServiceService;

impl SpecialServiceService {
    /// Special services sorted by title.
    pub fn list(db: &Database) -> Vec<SpecialService> {
        let mut services = db.special_services().find_all();
        services.sort_by(|a, b| crate::utils::collation::compare_titles(&a.title, &b.title));
        services
    }

    /// Set the factor of a special service and mark it as onboarded.
    pub fn configure(db: &mut Database, id: &str, factor: f64) -> Result<SpecialService> {
        if !factor.is_finite() || factor <= 0.0 {
            bail!("Factor must be a positive number, got {}", factor);
        }

        let mut fields = serde_json::Map::new();
        fields.insert("factor".to_string(), serde_json::json!(factor));
        fields.insert("onboardingCompleted".to_string(), serde_json::Value::Bool(true));

        let updated = db
            .special_services_mut()
            .update(id, fields)
            .with_context(|| format!("Failed to configure special service '{}'", id))?;
        info!("Configured special service '{}' with factor {}", id, factor);
        Ok(updated)
    }

    pub fn pending_count(db: &Database) -> usize {
        db.special_services()
            .iter()
            .filter(|s| !s.onboarding_completed)
            .count()
    }
}
