//! Collection sampling, sub-collection traversal and the root report.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use docshape_core::{AnalyzerConfig, CollectionPath, DocumentPath, DocumentStore, Result};

use crate::fields::FieldAnalyzer;
use crate::merge::merge_field_maps;
use crate::types::{
    AnalysisSummary, CollectionAnalysis, CollectionStructure, DocumentReport, FieldMap,
    FieldSummary, MainDocument, SampleDocument, StructureReport,
};

/// Walks a document store and builds structure reports.
///
/// Runs sequentially; every store call blocks until it returns.
pub struct StructureAnalyzer<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    config: AnalyzerConfig,
}

impl<'a, S: DocumentStore + ?Sized> StructureAnalyzer<'a, S> {
    pub fn new(store: &'a S, config: AnalyzerConfig) -> Self {
        Self { store, config }
    }

    /// Report for one root document and every sub-collection beneath it.
    ///
    /// Never fails: a missing or unreadable root becomes an error report.
    pub fn analyze_document(&self, collection: &str, document_id: &str) -> StructureReport {
        let path = match CollectionPath::root(collection).and_then(|c| c.doc(document_id)) {
            Ok(path) => path,
            Err(e) => return StructureReport::error(e.to_string(), collection, document_id),
        };

        info!(document = %path, "Analyzing document structure");
        let document = match self.store.get_document(&path) {
            Ok(Some(document)) => document,
            Ok(None) => {
                warn!(document = %path, "Document not found");
                return StructureReport::not_found(collection, document_id);
            }
            Err(e) => {
                warn!(document = %path, error = %e, "Failed to read document");
                return StructureReport::error(e.to_string(), collection, document_id);
            }
        };

        let structure = FieldAnalyzer::new(&self.config).analyze_fields(&document.fields);

        let names = self.subcollection_names(&path);
        info!(document = %path, count = names.len(), "Found sub-collections");

        let subcollections = self.analyze_subcollections(&path, &names, self.config.max_docs);

        StructureReport::Found(Box::new(DocumentReport {
            collection_name: collection.to_string(),
            document_id: document_id.to_string(),
            document_exists: true,
            main_document: MainDocument {
                field_count: structure.len(),
                structure,
            },
            subcollections_count: names.len(),
            subcollections,
            analysis_summary: AnalysisSummary {
                total_subcollections: names.len(),
                main_document_fields: document.fields.len(),
                subcollection_names: names,
            },
        }))
    }

    /// One structure per named sub-collection of `parent`.
    ///
    /// Branches are independent: a failing one becomes a failure marker
    /// and its siblings are still analyzed.
    pub fn analyze_subcollections(
        &self,
        parent: &DocumentPath,
        names: &[String],
        max_docs: usize,
    ) -> BTreeMap<String, CollectionStructure> {
        names
            .iter()
            .map(|name| {
                let structure = match parent.collection(name) {
                    Ok(path) => self.analyze_collection(&path, max_docs),
                    Err(e) => {
                        warn!(document = %parent, name = %name, error = %e, "Skipping sub-collection");
                        CollectionStructure::failed(e.to_string())
                    }
                };
                (name.clone(), structure)
            })
            .collect()
    }

    /// Sub-collection names under a document. A listing fault is logged and
    /// treated as no sub-collections.
    fn subcollection_names(&self, path: &DocumentPath) -> Vec<String> {
        self.store.list_subcollections(path).unwrap_or_else(|e| {
            warn!(document = %path, error = %e, "Failed to list sub-collections");
            Vec::new()
        })
    }

    /// Merged shape of up to `max_docs` documents of a collection.
    ///
    /// A store fault while sampling this collection is returned as
    /// [`CollectionStructure::Failed`].
    pub fn analyze_collection(&self, path: &CollectionPath, max_docs: usize) -> CollectionStructure {
        info!(collection = %path, max_docs, "Analyzing collection");
        match self.try_analyze_collection(path, max_docs) {
            Ok(structure) => structure,
            Err(e) => {
                warn!(collection = %path, error = %e, "Collection analysis failed");
                CollectionStructure::failed(e.to_string())
            }
        }
    }

    fn try_analyze_collection(
        &self,
        path: &CollectionPath,
        max_docs: usize,
    ) -> Result<CollectionStructure> {
        let documents = self.store.stream_documents(path, max_docs)?;
        let Some(first) = documents.first() else {
            debug!(collection = %path, "Collection is empty");
            return Ok(CollectionStructure::empty());
        };

        let analyzer = FieldAnalyzer::new(&self.config);
        let mut sample_documents = Vec::new();
        let document_structure = documents.iter().fold(FieldMap::new(), |acc, document| {
            let fields = analyzer.analyze_fields(&document.fields);
            if sample_documents.len() < self.config.max_sample_documents {
                sample_documents.push(SampleDocument::from_fields(&document.id, &fields));
            }
            debug!(collection = %path, document = %document.id, fields = fields.len(), "Merging document");
            merge_field_maps(acc, fields)
        });

        // Only the first sampled document is probed for sub-collections.
        let names = self.subcollection_names(&first.path);
        let subcollections = if names.is_empty() {
            None
        } else {
            info!(collection = %path, document = %first.id, count = names.len(), "Found nested sub-collections");
            Some(self.analyze_subcollections(
                &first.path,
                &names,
                self.config.child_max_docs(max_docs),
            ))
        };

        Ok(CollectionStructure::Analyzed(CollectionAnalysis {
            total_documents_analyzed: documents.len(),
            field_summary: FieldSummary::of(&document_structure),
            document_structure,
            sample_documents,
            subcollections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use docshape_core::fields_from_json;
    use docshape_store::{CollectionNode, DocumentNode, MemoryStore, Snapshot, StoreCall};
    use serde_json::json;

    fn node(fields: serde_json::Value) -> DocumentNode {
        DocumentNode {
            fields: fields_from_json(fields),
            collections: BTreeMap::new(),
        }
    }

    fn with_child(mut doc: DocumentNode, name: &str, child: CollectionNode) -> DocumentNode {
        doc.collections.insert(name.to_string(), child);
        doc
    }

    fn coll<T: Into<String>>(docs: Vec<(T, DocumentNode)>) -> CollectionNode {
        CollectionNode {
            documents: docs.into_iter().map(|(id, d)| (id.into(), d)).collect(),
        }
    }

    fn store_with(root: DocumentNode) -> MemoryStore {
        let mut snapshot = Snapshot::default();
        snapshot
            .collections
            .insert("vendor_store".into(), coll(vec![("v1", root)]));
        MemoryStore::new(snapshot)
    }

    fn numbered(count: usize) -> CollectionNode {
        coll(
            (0..count)
                .map(|i| (format!("d{:02}", i), node(json!({"n": i}))))
                .collect(),
        )
    }

    fn analyzer(store: &MemoryStore) -> StructureAnalyzer<'_, MemoryStore> {
        StructureAnalyzer::new(store, AnalyzerConfig::default())
    }

    fn analyzed<'r>(report: &'r StructureReport, name: &str) -> &'r CollectionAnalysis {
        report.as_found().unwrap().subcollections[name]
            .as_analyzed()
            .unwrap()
    }

    #[test]
    fn test_full_report() {
        let root = with_child(
            node(json!({"name": "Acme", "tags": ["a", "b"], "address": {"city": "Oslo"}})),
            "products",
            coll(vec![
                ("p1", node(json!({"sku": "A", "price": 10}))),
                ("p2", node(json!({"sku": "B", "price": "n/a", "stock": 3}))),
                ("p3", node(json!({"sku": "C", "price": 12}))),
            ]),
        );
        let store = store_with(root);
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let found = report.as_found().unwrap();
        assert!(found.document_exists);
        assert_eq!(found.main_document.field_count, 3);
        assert_eq!(found.subcollections_count, 1);
        assert_eq!(found.analysis_summary.subcollection_names, vec!["products"]);
        assert_eq!(found.analysis_summary.main_document_fields, 3);

        let products = analyzed(&report, "products");
        assert_eq!(products.total_documents_analyzed, 3);
        assert_eq!(products.field_summary.total_unique_fields, 3);
        assert_eq!(
            products.field_summary.field_names,
            vec!["price", "sku", "stock"]
        );
        assert_eq!(
            products.document_structure["price"].type_variations,
            Some(vec![FieldType::Integer, FieldType::String])
        );
        assert!(products.document_structure["sku"].type_variations.is_none());
        assert!(products.subcollections.is_none());
    }

    #[test]
    fn test_empty_collection_skips_probing() {
        let store = store_with(node(json!({})));
        let path = CollectionPath::parse("vendor_store/v1/empty").unwrap();
        let structure = analyzer(&store).analyze_collection(&path, 10);

        assert_eq!(structure, CollectionStructure::empty());
        assert_eq!(store.listing_calls(), 0);
    }

    #[test]
    fn test_sample_documents_bounded() {
        let root = with_child(
            with_child(node(json!({})), "many", numbered(10)),
            "few",
            numbered(2),
        );
        let store = store_with(root);
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let many = analyzed(&report, "many");
        assert_eq!(many.total_documents_analyzed, 10);
        assert_eq!(many.sample_documents.len(), 3);
        let ids: Vec<&str> = many
            .sample_documents
            .iter()
            .map(|s| s.document_id.as_str())
            .collect();
        assert_eq!(ids, vec!["d00", "d01", "d02"]);
        assert_eq!(many.sample_documents[1].sample_values["n"], json!(1));

        assert_eq!(analyzed(&report, "few").sample_documents.len(), 2);
    }

    #[test]
    fn test_only_first_document_probed() {
        let second = with_child(
            node(json!({"k": 2})),
            "hidden",
            coll(vec![("h1", node(json!({})))]),
        );
        let root = with_child(
            node(json!({})),
            "items",
            coll(vec![("a", node(json!({"k": 1}))), ("b", second)]),
        );
        let store = store_with(root);
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let items = analyzed(&report, "items");
        assert_eq!(items.total_documents_analyzed, 2);
        assert!(items.subcollections.is_none());
        assert!(!store
            .calls()
            .contains(&StoreCall::ListSubcollections("vendor_store/v1/items/b".into())));
    }

    #[test]
    fn test_nested_collections_use_smaller_sample() {
        let first = with_child(node(json!({"k": 1})), "variants", numbered(8));
        let root = with_child(
            node(json!({})),
            "products",
            coll(vec![("p1", first), ("p2", node(json!({"k": 2})))]),
        );
        let store = store_with(root);
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let products = analyzed(&report, "products");
        let variants = products.subcollections.as_ref().unwrap()["variants"]
            .as_analyzed()
            .unwrap();
        assert_eq!(variants.total_documents_analyzed, 5);

        let calls = store.calls();
        assert!(calls.contains(&StoreCall::StreamDocuments(
            "vendor_store/v1/products".into(),
            10
        )));
        assert!(calls.contains(&StoreCall::StreamDocuments(
            "vendor_store/v1/products/p1/variants".into(),
            5
        )));
    }

    #[test]
    fn test_missing_root_is_error_sentinel() {
        let store = store_with(node(json!({})));
        let report = analyzer(&store).analyze_document("vendor_store", "missing");

        assert!(report.is_error());
        assert_eq!(report.document_id(), "missing");
        let v = serde_json::to_value(&report).unwrap();
        assert!(v.get("document_exists").is_none());
        assert!(v.get("main_document").is_none());
        assert!(v.get("subcollections").is_none());
        assert_eq!(store.listing_calls(), 0);
    }

    #[test]
    fn test_invalid_document_id_is_error_sentinel() {
        let store = store_with(node(json!({})));
        let report = analyzer(&store).analyze_document("vendor_store", "a/b");
        assert!(report.is_error());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_failing_branch_is_isolated() {
        let root = with_child(
            with_child(
                node(json!({})),
                "broken",
                coll(vec![("x", node(json!({"a": 1})))]),
            ),
            "orders",
            coll(vec![("o1", node(json!({"total": 5})))]),
        );
        let store = store_with(root).fail_stream("vendor_store/v1/broken");
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let found = report.as_found().unwrap();
        let broken = &found.subcollections["broken"];
        assert_eq!(broken.document_count(), 0);
        assert!(broken.error().unwrap().contains("Permission denied"));
        assert_eq!(analyzed(&report, "orders").total_documents_analyzed, 1);
        assert_eq!(
            serde_json::to_value(broken).unwrap()["document_count"],
            json!(0)
        );
    }

    #[test]
    fn test_nested_listing_failure_keeps_collection_shape() {
        let root = with_child(
            node(json!({})),
            "products",
            coll(
                (0..4)
                    .map(|i| (format!("p{}", i), node(json!({"sku": i, "title": "x"}))))
                    .collect(),
            ),
        );
        let store = store_with(root).fail_listing("vendor_store/v1/products/p0");
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let products = analyzed(&report, "products");
        assert_eq!(products.total_documents_analyzed, 4);
        assert_eq!(products.field_summary.field_names, vec!["sku", "title"]);
        assert!(products.subcollections.is_none());
        assert_eq!(store.listing_calls(), 2);
    }

    #[test]
    fn test_root_read_failure_is_error_sentinel() {
        let store = store_with(node(json!({"name": "Acme"}))).fail_get("vendor_store/v1");
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        assert!(report.is_error());
        let v = serde_json::to_value(&report).unwrap();
        let error = v["error"].as_str().unwrap();
        assert!(error.contains("Permission denied"));
        assert!(error.contains("vendor_store/v1"));
        assert_eq!(v["collection"], json!("vendor_store"));
        assert_eq!(
            store.calls(),
            vec![StoreCall::GetDocument("vendor_store/v1".into())]
        );
    }


    #[test]
    fn test_root_listing_failure_yields_no_subcollections() {
        let root = with_child(
            node(json!({"name": "Acme"})),
            "products",
            coll(vec![("p1", node(json!({})))]),
        );
        let store = store_with(root).fail_listing("vendor_store/v1");
        let report = analyzer(&store).analyze_document("vendor_store", "v1");

        let found = report.as_found().unwrap();
        assert_eq!(found.main_document.field_count, 1);
        assert_eq!(found.subcollections_count, 0);
        assert!(found.subcollections.is_empty());
    }
}
