//! Read-only capability the analyzer needs from a document store.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::{CollectionPath, DocumentPath};
use crate::value::Fields;

/// A document as yielded by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub path: DocumentPath,
    pub fields: Fields,
}

/// Blocking, read-only access to a hierarchical document store.
///
/// Every call may fail independently; callers decide how far a failure
/// propagates.
pub trait DocumentStore {
    /// Fetch one document. `Ok(None)` means it does not exist.
    fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>>;

    /// Names of the sub-collections directly under a document.
    fn list_subcollections(&self, path: &DocumentPath) -> Result<Vec<String>>;

    /// Up to `limit` documents of a collection, in store order.
    fn stream_documents(&self, path: &CollectionPath, limit: usize) -> Result<Vec<StoredDocument>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>> {
        (**self).get_document(path)
    }

    fn list_subcollections(&self, path: &DocumentPath) -> Result<Vec<String>> {
        (**self).list_subcollections(path)
    }

    fn stream_documents(&self, path: &CollectionPath, limit: usize) -> Result<Vec<StoredDocument>> {
        (**self).stream_documents(path, limit)
    }
}
