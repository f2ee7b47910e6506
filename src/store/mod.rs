//! Visit persistence.
//!
//! Persistence is an optional collaborator: the relay skips it entirely when
//! no store is configured or in debug mode, and a store failure never blocks
//! beacon delivery.

mod postgres;
mod sqlite;
mod trait_def;

pub use postgres::PostgresVisitStore;
pub use sqlite::SqliteVisitStore;
pub use trait_def::{StoreError, StoreResult, VisitRecord, VisitStore};
