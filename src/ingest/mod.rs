// src/ingest/mod.rs

//! Import of template graphs from structured documents.
//!
//! - [`model`] holds the TOML/JSON document shape and the validated plan.
//! - [`loader`] reads a document from disk.
//! - [`validate`] turns a document into an [`ImportPlan`], rejecting it as a
//!   whole before anything is written.
//! - [`commit`] re-checks the plan against the store and writes it.

pub mod commit;
pub mod loader;
pub mod model;
pub mod validate;

pub use commit::{check_against_store, commit_tx};
pub use loader::{load_import, load_import_from_path};
pub use model::{
    ImportPlan, ImportReport, PlannedDependency, PlannedTask, RawDependencySpec, RawImport,
    RawTaskSpec,
};
