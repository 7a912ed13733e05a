//! The catalog database: one collection per entity type under a single
//! locked store directory.

use super::collection::{Collection, Document};
use super::error::{Result, StoreError};
use super::lock::StoreLock;
use super::schema::{FieldSpec, FieldType, Schema};
use crate::catalog::{Service, SpecialService, SurchargeFactor};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

const MATERIAL_TYPES: &[&str] = &["none", "percent", "fixed"];
const WORKFLOW_PHASES: &[&str] = &[
    "vorbereitung",
    "schutz",
    "untergrund",
    "grundierung",
    "beschichtung",
    "nacharbeit",
    "reinigung",
];

const SERVICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("serviceType", FieldType::Labels),
    FieldSpec::optional("parentServiceId", FieldType::Text),
    FieldSpec::optional("includedIn", FieldType::TextList),
    FieldSpec::optional("includedSubServices", FieldType::TextList),
    FieldSpec::optional("standardValuePerUnit", FieldType::Number),
    FieldSpec::optional("minTime", FieldType::Number),
    FieldSpec::optional("waitTime", FieldType::Number),
    FieldSpec::optional("efficiencyStart", FieldType::Number),
    FieldSpec::optional("efficiencyCap", FieldType::Number),
    FieldSpec::optional("efficiencyStepPercent", FieldType::Number),
    FieldSpec::optional("maxProductivityPerDay", FieldType::Number),
    FieldSpec::optional("materialType", FieldType::OneOf(MATERIAL_TYPES)),
    FieldSpec::optional("materialValue", FieldType::Number),
    FieldSpec::optional("workflowOrder", FieldType::Number),
    FieldSpec::optional("workflowPhase", FieldType::OneOf(WORKFLOW_PHASES)),
    FieldSpec::optional("createsDust", FieldType::Bool),
    FieldSpec::optional("subWorkflowOrder", FieldType::Number),
    FieldSpec::optional("subWorkflowTotal", FieldType::Number),
    FieldSpec::optional("subWorkflowExplanation", FieldType::Text),
    FieldSpec::optional("configOnboardingCompleted", FieldType::Bool),
    FieldSpec::optional("materialOnboardingCompleted", FieldType::Bool),
    FieldSpec::optional("subServiceConfigOnboardingCompleted", FieldType::Bool),
    FieldSpec::optional("updatedAt", FieldType::Timestamp),
];

static SERVICE_SCHEMA: Schema = Schema {
    collection: "services",
    fields: SERVICE_FIELDS,
    indexes: &["parentServiceId", "serviceType", "includedIn"],
};

const SPECIAL_SERVICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("affectsArea", FieldType::TextList),
    FieldSpec::optional("requiredService", FieldType::Text),
    FieldSpec::optional("affectsService", FieldType::TextList),
    FieldSpec::optional("factor", FieldType::Number),
    FieldSpec::optional("onboardingCompleted", FieldType::Bool),
];

static SPECIAL_SERVICE_SCHEMA: Schema = Schema {
    collection: "special_services",
    fields: SPECIAL_SERVICE_FIELDS,
    indexes: &["requiredService", "affectsService"],
};

const SURCHARGE_FACTOR_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("factor", FieldType::Number),
    FieldSpec::optional("description", FieldType::Text),
];

static SURCHARGE_FACTOR_SCHEMA: Schema = Schema {
    collection: "surcharge_factors",
    fields: SURCHARGE_FACTOR_FIELDS,
    indexes: &[],
};

impl Document for Service {
    fn id(&self) -> &str {
        &self.id
    }

    fn schema() -> &'static Schema {
        &SERVICE_SCHEMA
    }
}

impl Document for SpecialService {
    fn id(&self) -> &str {
        &self.id
    }

    fn schema() -> &'static Schema {
        &SPECIAL_SERVICE_SCHEMA
    }
}

impl Document for SurchargeFactor {
    fn id(&self) -> &str {
        &self.id
    }

    fn schema() -> &'static Schema {
        &SURCHARGE_FACTOR_SCHEMA
    }
}

/// Handle to an opened store directory.
///
/// Construct one with [`Database::open`] and pass it to whatever needs the
/// catalog. Only one handle per directory can exist at a time.
pub struct Database {
    root: PathBuf,
    services: Collection<Service>,
    special_services: Collection<SpecialService>,
    surcharge_factors: Collection<SurchargeFactor>,
    _lock: StoreLock,
}

impl Database {
    /// Lock `root` and load every collection in it.
    pub fn open(root: &Path) -> Result<Self> {
        let lock = StoreLock::acquire(root)?;
        let services: Collection<Service> = Collection::open(root)?;
        let special_services: Collection<SpecialService> = Collection::open(root)?;
        let surcharge_factors: Collection<SurchargeFactor> = Collection::open(root)?;

        info!(
            "Opened store {:?}: {} services, {} special services, {} surcharge factors",
            root,
            services.count(),
            special_services.count(),
            surcharge_factors.count()
        );

        Ok(Self {
            root: root.to_path_buf(),
            services,
            special_services,
            surcharge_factors,
            _lock: lock,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn services(&self) -> &Collection<Service> {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Collection<Service> {
        &mut self.services
    }

    pub fn special_services(&self) -> &Collection<SpecialService> {
        &self.special_services
    }

    pub fn special_services_mut(&mut self) -> &mut Collection<SpecialService> {
        &mut self.special_services
    }

    pub fn surcharge_factors(&self) -> &Collection<SurchargeFactor> {
        &self.surcharge_factors
    }

    pub fn surcharge_factors_mut(&mut self) -> &mut Collection<SurchargeFactor> {
        &mut self.surcharge_factors
    }
}

/// What the onboarding session needs from persistence.
pub trait CatalogRepository {
    /// Read the whole service catalog.
    fn load_services(&self) -> Result<Vec<Service>>;

    /// Overwrite the configuration fields, sub-service selection, completion
    /// flags and timestamp of a stored service. Returns the stored record.
    fn save_service(&mut self, service: &Service) -> Result<Service>;
}

impl CatalogRepository for Database {
    fn load_services(&self) -> Result<Vec<Service>> {
        Ok(self.services.find_all())
    }

    fn save_service(&mut self, service: &Service) -> Result<Service> {
        self.services.update(&service.id, onboarding_fields(service)?)
    }
}

impl<R: CatalogRepository + ?Sized> CatalogRepository for &mut R {
    fn load_services(&self) -> Result<Vec<Service>> {
        (**self).load_services()
    }

    fn save_service(&mut self, service: &Service) -> Result<Service> {
        (**self).save_service(service)
    }
}

const CONFIG_KEYS: &[&str] = &[
    "standardValuePerUnit",
    "minTime",
    "waitTime",
    "efficiencyStart",
    "efficiencyCap",
    "efficiencyStepPercent",
    "maxProductivityPerDay",
    "materialType",
    "materialValue",
    "workflowOrder",
    "workflowPhase",
    "createsDust",
    "subWorkflowOrder",
    "subWorkflowTotal",
    "subWorkflowExplanation",
];

/// The subset of a service written by onboarding. Identity, title, tags and
/// hierarchy links are left as stored. Configuration fields missing from
/// `service` are written as `null` so the stored values are cleared rather
/// than merged.
pub fn onboarding_fields(service: &Service) -> Result<Map<String, Value>> {
    let Value::Object(mut fields) = serde_json::to_value(&service.config)? else {
        return Err(StoreError::schema("services", "<config>", "must serialize to an object"));
    };
    for key in CONFIG_KEYS {
        fields.entry((*key).to_string()).or_insert(Value::Null);
    }
    fields.insert(
        "includedSubServices".to_string(),
        serde_json::to_value(&service.included_sub_services)?,
    );
    fields.insert(
        "configOnboardingCompleted".to_string(),
        Value::Bool(service.config_onboarding_completed),
    );
    fields.insert(
        "materialOnboardingCompleted".to_string(),
        Value::Bool(service.material_onboarding_completed),
    );
    fields.insert(
        "subServiceConfigOnboardingCompleted".to_string(),
        Value::Bool(service.sub_service_config_onboarding_completed),
    );
    fields.insert(
        "updatedAt".to_string(),
        serde_json::to_value(service.updated_at)?,
    );
    Ok(fields)
}
