//! docshape stores: an in-memory snapshot store and a SQLite-backed
//! hierarchical document store, both implementing `DocumentStore`.

pub mod memory;
pub mod schema;
pub mod snapshot;
pub mod sqlite;

pub use memory::{MemoryStore, StoreCall};
pub use snapshot::{CollectionNode, DocumentNode, Snapshot};
pub use sqlite::SqliteStore;
