//! docshape core: errors, configuration, the decoded value model and the
//! document-store capability.

pub mod config;
pub mod error;
pub mod path;
pub mod store;
pub mod value;

pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use path::{CollectionPath, DocumentPath};
pub use store::{DocumentStore, StoredDocument};
pub use value::{fields_from_json, DocValue, Fields};
