pub mod database;
pub mod error;
pub mod schema;

pub use database::{OrganizationRow, OwnershipDatabase};
pub use error::StorageError;
