//! Local document store.
//!
//! ```text
//! <store dir>/
//! ├── .lock                    OS lock held by an open Database, last owner pid
//! ├── services.json
//! ├── special_services.json
//! └── surcharge_factors.json
//! ```
//!
//! Each collection file is `{"version": 1, "savedAt": ..., "documents": [...]}`.

pub mod collection;
pub mod database;
pub mod error;
pub mod lock;
pub mod schema;

pub use collection::{Collection, Document, InsertReport, Query};
pub use database::{CatalogRepository, Database};
pub use error::StoreError;
pub use lock::StoreLock;
pub use schema::{FieldSpec, FieldType, Schema};
