//! Read-model and CRUD access for the core entities. Free functions over a
//! borrowed `Connection`, one file per entity. All list/get reads exclude
//! soft-deleted rows.

pub mod annotation;
pub mod consent;
pub mod patient;
pub mod photo;
pub mod portfolio;
pub mod settings;
pub mod treatment;
pub mod visit;

pub use annotation::*;
pub use consent::*;
pub use patient::*;
pub use photo::*;
pub use portfolio::*;
pub use settings::*;
pub use treatment::*;
pub use visit::*;
