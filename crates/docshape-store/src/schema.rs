//! Database schema SQL.

/// One row per document, keyed by its full slash-separated path.
///
/// `parent_path` is the owning document for sub-collection documents and
/// NULL for top-level collections. `fields_json` holds the typed-JSON
/// encoding of the document's fields.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    path TEXT PRIMARY KEY,
    collection_path TEXT NOT NULL,
    parent_path TEXT,
    doc_id TEXT NOT NULL,
    fields_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection_path, doc_id);
CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(parent_path);
"#;
