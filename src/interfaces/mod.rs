//! Abstract interfaces for salesdb components.
//!
//! These traits define the contract every storage backend fulfils for the
//! sales schema variants and their exercise queries.

pub mod sales_store;

pub use sales_store::{ConstraintKind, Result, SalesStore, StorageError};
