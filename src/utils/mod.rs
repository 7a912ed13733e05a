pub mod collation;
pub mod doctor;
pub mod form;
pub mod path;
pub mod versioned;

// Export utilities that are used
pub use collation::{collation_key, compare_titles};
pub use doctor::{CatalogDoctor, ValidationResult, ValidationStatus};
pub use form::{coerce_number, FieldKind, FormError, FormField, ServiceForm};
pub use path::{
    expand_path, format_path_for_display, get_config_dir, get_config_path,
    get_default_store_dir, get_home_dir, get_log_dir,
};
