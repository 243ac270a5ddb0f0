pub mod error;
pub mod ffi;
pub mod form;
pub mod memory;
pub mod metraj;
pub mod migrations;
pub mod models;
pub mod profile;
pub mod service;
pub mod settings;
pub mod sqlite;
pub mod storage;

uniffi::setup_scaffolding!();

pub use error::{MetrajError, StorageError};
pub use form::{MetrajForm, MetrajRequest};
pub use memory::MemoryStorage;
pub use metraj::{MetrajPlan, MetrajWarning, UdRequest};
pub use models::{DrillingInfo, FieldRecord, FieldRecordId, LandRegistry, Project, ProjectId};
pub use service::{commit, preview, regenerate, save_drilling_info, DrillingUpdate, MetrajOutcome};
pub use settings::MetrajSettings;
pub use sqlite::SqliteStorage;
pub use storage::Storage;
