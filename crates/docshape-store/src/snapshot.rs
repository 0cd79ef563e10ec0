//! Serializable snapshot of a document tree.
//!
//! ```json
//! {"collections": {"vendor_store": {"documents": {"v1": {
//!     "fields": {"name": {"stringValue": "Acme"}},
//!     "collections": {"products": {"documents": {}}}
//! }}}}}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use docshape_core::{CollectionPath, DocumentPath, Fields, Result};

/// Root of a document tree: top-level collections by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionNode>,
}

/// Documents of one collection by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionNode {
    #[serde(default)]
    pub documents: BTreeMap<String, DocumentNode>,
}

/// One document and the sub-collections beneath it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, CollectionNode>,
}

impl Snapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn collection(&self, path: &CollectionPath) -> Option<&CollectionNode> {
        let mut segments = path.segments().iter();
        let mut node = self.collections.get(segments.next()?)?;
        while let Some(doc_id) = segments.next() {
            let coll_name = segments.next()?;
            node = node.documents.get(doc_id)?.collections.get(coll_name)?;
        }
        Some(node)
    }

    pub fn document(&self, path: &DocumentPath) -> Option<&DocumentNode> {
        self.collection(&path.parent())?.documents.get(path.id())
    }

    /// Every document in the tree, parents before their sub-collections.
    pub fn documents(&self) -> Result<Vec<(DocumentPath, &Fields)>> {
        let mut out = Vec::new();
        for (name, node) in &self.collections {
            collect_documents(&CollectionPath::root(name)?, node, &mut out)?;
        }
        Ok(out)
    }
}

fn collect_documents<'a>(
    path: &CollectionPath,
    node: &'a CollectionNode,
    out: &mut Vec<(DocumentPath, &'a Fields)>,
) -> Result<()> {
    for (id, doc) in &node.documents {
        let doc_path = path.doc(id)?;
        out.push((doc_path.clone(), &doc.fields));
        for (name, child) in &doc.collections {
            collect_documents(&doc_path.collection(name)?, child, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshape_core::DocValue;

    const TREE: &str = r#"{"collections": {"stores": {"documents": {
        "s1": {
            "fields": {"name": {"stringValue": "Acme"}},
            "collections": {"products": {"documents": {
                "p1": {"fields": {"price": {"doubleValue": 9.5}}}
            }}}
        }
    }}}}"#;

    #[test]
    fn test_navigate_nested_paths() {
        let snapshot = Snapshot::from_json_str(TREE).unwrap();

        let products = CollectionPath::parse("stores/s1/products").unwrap();
        let node = snapshot.collection(&products).unwrap();
        assert_eq!(node.documents.len(), 1);

        let doc = snapshot
            .document(&DocumentPath::parse("stores/s1/products/p1").unwrap())
            .unwrap();
        assert_eq!(doc.fields["price"], DocValue::Double(9.5));

        assert!(snapshot
            .collection(&CollectionPath::parse("stores/s2/products").unwrap())
            .is_none());
    }

    #[test]
    fn test_documents_flattened_in_tree_order() {
        let snapshot = Snapshot::from_json_str(TREE).unwrap();
        let paths: Vec<String> = snapshot
            .documents()
            .unwrap()
            .into_iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(paths, vec!["stores/s1", "stores/s1/products/p1"]);
    }

    #[test]
    fn test_malformed_snapshot() {
        let err = Snapshot::from_json_str(r#"{"collections": {"a": {"documents": 3}}}"#);
        assert!(err.is_err());
    }
}
