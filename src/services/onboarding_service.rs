//! Onboarding session: walks the user through every main service once.
//!
//! ```text
//! Loading ──► Empty
//!    │
//!    └──► Editing(0) ──► Editing(1) ──► ... ──► Editing(n-1) ──► Completed
//!              ▲  SaveAndNext / Skip advance, Back / JumpTo move freely
//! ```
//!
//! The session owns its repository. Every transition takes `&mut self`, so a
//! save in flight holds the only handle to the session until it returns.

use crate::catalog::Service;
use crate::services::catalog_service::{CatalogService, ClassifyOptions, IntegrityWarning};
use crate::services::sub_service_resolver::SubServiceResolver;
use crate::store::{CatalogRepository, StoreError};
use crate::utils::form::{FormError, FormField, ServiceForm};
use chrono::Utc;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    /// The catalog has no main services; nothing to edit.
    Empty,
    /// Editing the main service at `index` (into the sorted list).
    Editing { index: usize },
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("loading"),
            Self::Empty => f.write_str("empty"),
            Self::Editing { index } => write!(f, "editing #{}", index + 1),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// User-driven moves between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Load,
    SaveAndNext,
    Skip,
    Back,
    JumpTo(usize),
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::SaveAndNext => f.write_str("save and continue"),
            Self::Skip => f.write_str("skip"),
            Self::Back => f.write_str("go back"),
            Self::JumpTo(index) => write!(f, "jump to #{}", index + 1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("cannot {transition} while {state}")]
    InvalidTransition {
        transition: Transition,
        state: SessionState,
    },

    #[error("index {index} is out of range ({count} main services)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("'{id}' is not a selectable sub-service")]
    UnknownSubService { id: String },

    #[error("failed to save service '{id}': {source}")]
    Persistence {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to load the service catalog: {0}")]
    Load(#[source] StoreError),

    #[error(transparent)]
    Form(#[from] FormError),
}

pub struct OnboardingSession<R: CatalogRepository> {
    repository: R,
    options: ClassifyOptions,
    state: SessionState,
    main_services: Vec<Service>,
    sub_services: Vec<Service>,
    warnings: Vec<IntegrityWarning>,
    form: ServiceForm,
    selected: BTreeSet<String>,
    last_error: Option<String>,
}

impl<R: CatalogRepository> OnboardingSession<R> {
    /// A session in `Loading`. Call [`load`](Self::load) next.
    pub fn new(repository: R, options: ClassifyOptions) -> Self {
        Self {
            repository,
            options,
            state: SessionState::Loading,
            main_services: Vec::new(),
            sub_services: Vec::new(),
            warnings: Vec::new(),
            form: ServiceForm::default(),
            selected: BTreeSet::new(),
            last_error: None,
        }
    }

    /// Create and load a session. A catalog read failure is returned as is.
    pub fn start(repository: R, options: ClassifyOptions) -> Result<Self, OnboardingError> {
        let mut session = Self::new(repository, options);
        session.load()?;
        Ok(session)
    }

    /// Read and classify the catalog, then enter the first service.
    pub fn load(&mut self) -> Result<SessionState, OnboardingError> {
        if self.state != SessionState::Loading {
            return Err(self.invalid(Transition::Load));
        }

        let services = self
            .repository
            .load_services()
            .map_err(OnboardingError::Load)?;
        let classification = CatalogService::classify(services, &self.options);
        info!(
            "Loaded catalog: {} records, {} main services, {} sub-services",
            classification.catalog_size,
            classification.main_services.len(),
            classification.sub_services.len()
        );

        self.main_services = classification.main_services;
        self.sub_services = classification.sub_services;
        self.warnings = classification.warnings;

        if self.main_services.is_empty() {
            self.state = SessionState::Empty;
        } else {
            self.enter(0);
        }
        Ok(self.state)
    }

    pub fn apply(&mut self, transition: Transition) -> Result<SessionState, OnboardingError> {
        match transition {
            Transition::Load => self.load(),
            Transition::SaveAndNext => self.save_and_next(),
            Transition::Skip => self.skip(),
            Transition::Back => self.back(),
            Transition::JumpTo(index) => self.jump_to(index),
        }
    }

    /// Persist the current form and move on.
    ///
    /// On failure the session stays on the same service with the form intact
    /// and the error message kept in [`last_error`](Self::last_error).
    pub fn save_and_next(&mut self) -> Result<SessionState, OnboardingError> {
        let index = self.editing_index(Transition::SaveAndNext)?;
        let record = self.build_record(index);

        match self.repository.save_service(&record) {
            Ok(stored) => {
                info!("Saved onboarding for '{}' ({})", stored.title, stored.id);
                self.replace_in_memory(index, stored);
                self.advance(index);
                Ok(self.state)
            }
            Err(source) => {
                warn!("Failed to save service '{}': {}", record.id, source);
                self.last_error = Some(source.to_string());
                Err(OnboardingError::Persistence {
                    id: record.id,
                    source,
                })
            }
        }
    }

    /// Move on without saving.
    pub fn skip(&mut self) -> Result<SessionState, OnboardingError> {
        let index = self.editing_index(Transition::Skip)?;
        debug!("Skipped service #{}", index + 1);
        self.advance(index);
        Ok(self.state)
    }

    /// Go to the previous service, reloading its stored values. Does nothing
    /// on the first service.
    pub fn back(&mut self) -> Result<SessionState, OnboardingError> {
        let index = self.editing_index(Transition::Back)?;
        if index > 0 {
            self.enter(index - 1);
        }
        Ok(self.state)
    }

    pub fn jump_to(&mut self, target: usize) -> Result<SessionState, OnboardingError> {
        self.editing_index(Transition::JumpTo(target))?;
        if target >= self.main_services.len() {
            return Err(OnboardingError::IndexOutOfRange {
                index: target,
                count: self.main_services.len(),
            });
        }
        self.enter(target);
        Ok(self.state)
    }

    /// Apply raw input to a form field of the current service.
    pub fn set_field(&mut self, field: FormField, raw: &str) -> Result<(), OnboardingError> {
        self.editing_index(Transition::SaveAndNext)?;
        self.form.set(field, raw)?;
        Ok(())
    }

    /// Flip a checkbox field. Returns the new value.
    pub fn toggle_field(&mut self, field: FormField) -> Result<bool, OnboardingError> {
        self.editing_index(Transition::SaveAndNext)?;
        Ok(self.form.toggle(field)?)
    }

    /// Add or remove a sub-service from the current selection. Returns
    /// whether it is selected afterwards.
    pub fn toggle_sub_service(&mut self, id: &str) -> Result<bool, OnboardingError> {
        let index = self.editing_index(Transition::SaveAndNext)?;
        if self.selected.remove(id) {
            return Ok(false);
        }
        let selectable = id != self.main_services[index].id
            && self.sub_services.iter().any(|sub| sub.id == id);
        if !selectable {
            return Err(OnboardingError::UnknownSubService { id: id.to_string() });
        }
        self.selected.insert(id.to_string());
        Ok(true)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn main_services(&self) -> &[Service] {
        &self.main_services
    }

    pub fn sub_services(&self) -> &[Service] {
        &self.sub_services
    }

    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }

    /// The service being edited, if any.
    pub fn current_service(&self) -> Option<&Service> {
        match self.state {
            SessionState::Editing { index } => self.main_services.get(index),
            _ => None,
        }
    }

    pub fn form(&self) -> &ServiceForm {
        &self.form
    }

    pub fn selected_sub_services(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// The selection as it would be saved.
    pub fn ordered_selection(&self) -> Vec<String> {
        SubServiceResolver::ordered_selection(&self.selected, &self.sub_services)
    }

    /// Message of the last failed save, cleared when another service is entered.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn count(&self) -> usize {
        self.main_services.len()
    }

    /// Main services whose configuration onboarding is completed.
    pub fn configured_count(&self) -> usize {
        self.main_services
            .iter()
            .filter(|service| service.config_onboarding_completed)
            .count()
    }

    /// Fraction of the walk-through reached, from 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        match self.state {
            SessionState::Loading => 0.0,
            SessionState::Editing { index } => (index + 1) as f64 / self.count() as f64,
            SessionState::Empty | SessionState::Completed => 1.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Empty | SessionState::Completed)
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    fn editing_index(&self, transition: Transition) -> Result<usize, OnboardingError> {
        match self.state {
            SessionState::Editing { index } => Ok(index),
            _ => Err(self.invalid(transition)),
        }
    }

    fn invalid(&self, transition: Transition) -> OnboardingError {
        OnboardingError::InvalidTransition {
            transition,
            state: self.state,
        }
    }

    fn enter(&mut self, index: usize) {
        let service = &self.main_services[index];
        self.form = ServiceForm::from_config(&service.config);
        self.selected = SubServiceResolver::resolve_selected(service, &self.sub_services);
        self.last_error = None;
        self.state = SessionState::Editing { index };
        debug!("Editing '{}' ({}/{})", service.title, index + 1, self.main_services.len());
    }

    fn advance(&mut self, index: usize) {
        if index + 1 < self.main_services.len() {
            self.enter(index + 1);
        } else {
            self.state = SessionState::Completed;
            self.last_error = None;
            info!(
                "Onboarding completed: {}/{} services configured",
                self.configured_count(),
                self.count()
            );
        }
    }

    fn build_record(&self, index: usize) -> Service {
        let mut record = self.main_services[index].clone();
        record.config = self.form.to_config();
        record.included_sub_services = self.ordered_selection();
        record.config_onboarding_completed = true;
        record.material_onboarding_completed = true;
        if record.is_dual_role() {
            record.sub_service_config_onboarding_completed = true;
        }
        record.updated_at = Some(Utc::now());
        record
    }

    fn replace_in_memory(&mut self, index: usize, stored: Service) {
        if let Some(sub) = self.sub_services.iter_mut().find(|sub| sub.id == stored.id) {
            *sub = stored.clone();
        }
        self.main_services[index] = stored;
    }
}
