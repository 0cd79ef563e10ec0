//! In-memory document store backed by a [`Snapshot`].
//!
//! Besides serving snapshot files, it doubles as a deterministic test
//! double: failures can be injected per collection or document, and every
//! call is recorded.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;

use docshape_core::{
    CollectionPath, DocumentPath, DocumentStore, Error, Result, StoredDocument,
};

use crate::snapshot::Snapshot;

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetDocument(String),
    ListSubcollections(String),
    StreamDocuments(String, usize),
}

/// Read-only store over an owned document tree.
pub struct MemoryStore {
    snapshot: Snapshot,
    failing_gets: HashSet<String>,
    failing_streams: HashSet<String>,
    failing_listings: HashSet<String>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            failing_gets: HashSet::new(),
            failing_streams: HashSet::new(),
            failing_listings: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::new(Snapshot::from_json_str(json)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::new(Snapshot::from_file(path)?);
        debug!("MemoryStore loaded from {}", path.display());
        Ok(store)
    }

    /// Make `get_document` fail for this document path.
    pub fn fail_get(mut self, document_path: &str) -> Self {
        self.failing_gets.insert(document_path.to_string());
        self
    }

    /// Make `stream_documents` fail for this collection path.
    pub fn fail_stream(mut self, collection_path: &str) -> Self {
        self.failing_streams.insert(collection_path.to_string());
        self
    }

    /// Make `list_subcollections` fail for this document path.
    pub fn fail_listing(mut self, document_path: &str) -> Self {
        self.failing_listings.insert(document_path.to_string());
        self
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Number of `list_subcollections` calls made so far.
    pub fn listing_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, StoreCall::ListSubcollections(_)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

impl DocumentStore for MemoryStore {
    fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>> {
        let key = path.to_string();
        self.record(StoreCall::GetDocument(key.clone()));
        if self.failing_gets.contains(&key) {
            return Err(Error::PermissionDenied(format!("reading {}", key)));
        }
        Ok(self.snapshot.document(path).map(|node| StoredDocument {
            id: path.id().to_string(),
            path: path.clone(),
            fields: node.fields.clone(),
        }))
    }

    fn list_subcollections(&self, path: &DocumentPath) -> Result<Vec<String>> {
        let key = path.to_string();
        self.record(StoreCall::ListSubcollections(key.clone()));
        if self.failing_listings.contains(&key) {
            return Err(Error::PermissionDenied(format!("listing collections of {}", key)));
        }
        Ok(self
            .snapshot
            .document(path)
            .map(|node| node.collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn stream_documents(&self, path: &CollectionPath, limit: usize) -> Result<Vec<StoredDocument>> {
        let key = path.to_string();
        self.record(StoreCall::StreamDocuments(key.clone(), limit));
        if self.failing_streams.contains(&key) {
            return Err(Error::PermissionDenied(format!("reading {}", key)));
        }
        let Some(node) = self.snapshot.collection(path) else {
            return Ok(Vec::new());
        };
        node.documents
            .iter()
            .take(limit)
            .map(|(id, doc)| {
                Ok(StoredDocument {
                    id: id.clone(),
                    path: path.doc(id)?,
                    fields: doc.fields.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshape_core::DocValue;

    fn test_store() -> MemoryStore {
        MemoryStore::from_json_str(
            r#"{"collections": {"orders": {"documents": {
                "o1": {"fields": {"total": {"integerValue": "10"}},
                       "collections": {"items": {"documents": {}}, "notes": {}}},
                "o2": {"fields": {"total": {"integerValue": "20"}}},
                "o3": {"fields": {}}
            }}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_document() {
        let store = test_store();
        let path = DocumentPath::parse("orders/o1").unwrap();
        let doc = store.get_document(&path).unwrap().unwrap();
        assert_eq!(doc.id, "o1");
        assert_eq!(doc.fields["total"], DocValue::Integer(10));

        let missing = DocumentPath::parse("orders/nope").unwrap();
        assert!(store.get_document(&missing).unwrap().is_none());
    }

    #[test]
    fn test_stream_respects_limit_and_order() {
        let store = test_store();
        let orders = CollectionPath::root("orders").unwrap();
        let docs = store.stream_documents(&orders, 2).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
        assert_eq!(docs[1].path.to_string(), "orders/o2");
    }

    #[test]
    fn test_stream_unknown_collection_is_empty() {
        let store = test_store();
        let path = CollectionPath::root("missing").unwrap();
        assert!(store.stream_documents(&path, 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_subcollections() {
        let store = test_store();
        let o1 = DocumentPath::parse("orders/o1").unwrap();
        let o2 = DocumentPath::parse("orders/o2").unwrap();
        assert_eq!(store.list_subcollections(&o1).unwrap(), vec!["items", "notes"]);
        assert!(store.list_subcollections(&o2).unwrap().is_empty());
        assert_eq!(store.listing_calls(), 2);
    }

    #[test]
    fn test_injected_failures_and_call_log() {
        let store = test_store()
            .fail_get("orders/o2")
            .fail_stream("orders")
            .fail_listing("orders/o1");
        let orders = CollectionPath::root("orders").unwrap();
        let o1 = DocumentPath::parse("orders/o1").unwrap();
        let o2 = DocumentPath::parse("orders/o2").unwrap();

        assert!(matches!(
            store.get_document(&o2),
            Err(Error::PermissionDenied(_))
        ));
        assert!(store.get_document(&o1).unwrap().is_some());

        assert!(matches!(
            store.stream_documents(&orders, 5),
            Err(Error::PermissionDenied(_))
        ));
        assert!(store.list_subcollections(&o1).is_err());
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::GetDocument("orders/o2".into()),
                StoreCall::GetDocument("orders/o1".into()),
                StoreCall::StreamDocuments("orders".into(), 5),
                StoreCall::ListSubcollections("orders/o1".into()),
            ]
        );
    }
}
