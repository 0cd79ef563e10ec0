//! SQLite-backed hierarchical document store.
//!
//! Documents are rows keyed by full path; sub-collections are discovered
//! from the `parent_path` column, so a sub-collection exists exactly when at
//! least one document lives in it.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use docshape_core::{
    CollectionPath, DocumentPath, DocumentStore, Error, Fields, Result, StoredDocument,
};

use crate::schema::SCHEMA_SQL;
use crate::snapshot::Snapshot;

/// SQLite document store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

impl SqliteStore {
    /// Open or create the database file, creating the schema if needed.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "SqliteStore initialized: {} documents, path={}",
            store.count_documents()?,
            store.db_path.display()
        );
        Ok(store)
    }

    /// Open an existing database without write access.
    pub fn open_read_only(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if !db_path.exists() {
            return Err(Error::NotFound(format!("Database not found: {}", db_path.display())));
        }
        let conn =
            Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(db_err)?;
        debug!("SqliteStore opened read-only: {}", db_path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Seeding
    // ---------------------------------------------------------------

    /// Insert or replace one document.
    pub fn put_document(&self, path: &DocumentPath, fields: &Fields) -> Result<()> {
        let fields_json = serde_json::to_string(fields)?;
        let conn = self.conn.lock();
        insert_document(&conn, path, &fields_json)
    }

    /// Load every document of a snapshot in one transaction. Returns the count written.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<usize> {
        let documents = snapshot.documents()?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        for (path, fields) in &documents {
            insert_document(&tx, path, &serde_json::to_string(fields)?)?;
        }
        tx.commit().map_err(db_err)?;
        info!("Imported {} documents into {}", documents.len(), self.db_path.display());
        Ok(documents.len())
    }

    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn decode_fields(path: &str, raw: &str) -> Result<Fields> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Decode(format!("malformed document {}: {}", path, e)))
    }
}

fn insert_document(conn: &Connection, path: &DocumentPath, fields_json: &str) -> Result<()> {
    let collection = path.parent();
    let parent = collection.parent().map(|p| p.to_string());
    let now = chrono::Utc::now().timestamp_millis();
    conn.prepare_cached(
        "INSERT OR REPLACE INTO documents (path, collection_path, parent_path, doc_id, fields_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .map_err(db_err)?
    .execute(params![
        path.to_string(),
        collection.to_string(),
        parent,
        path.id(),
        fields_json,
        now
    ])
    .map_err(db_err)?;
    Ok(())
}

impl DocumentStore for SqliteStore {
    fn get_document(&self, path: &DocumentPath) -> Result<Option<StoredDocument>> {
        let key = path.to_string();
        let conn = self.conn.lock();
        let raw: Option<String> = conn
            .prepare_cached("SELECT fields_json FROM documents WHERE path = ?1")
            .map_err(db_err)?
            .query_row(params![key], |row| row.get(0))
            .optional()
            .map_err(db_err)?;

        match raw {
            None => Ok(None),
            Some(raw) => Ok(Some(StoredDocument {
                id: path.id().to_string(),
                path: path.clone(),
                fields: Self::decode_fields(&key, &raw)?,
            })),
        }
    }

    fn list_subcollections(&self, path: &DocumentPath) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT DISTINCT collection_path FROM documents WHERE parent_path = ?1 ORDER BY collection_path",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![path.to_string()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;

        let mut names = Vec::new();
        for row in rows {
            let collection = CollectionPath::parse(&row.map_err(db_err)?)?;
            names.push(collection.name().to_string());
        }
        Ok(names)
    }

    fn stream_documents(&self, path: &CollectionPath, limit: usize) -> Result<Vec<StoredDocument>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT path, fields_json FROM documents WHERE collection_path = ?1 ORDER BY doc_id LIMIT ?2",
            )
            .map_err(db_err)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![path.to_string(), limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_err)?;

        let mut docs = Vec::new();
        for row in rows {
            let (doc_path, raw) = row.map_err(db_err)?;
            let doc_path = DocumentPath::parse(&doc_path)?;
            let fields = Self::decode_fields(&doc_path.to_string(), &raw)?;
            docs.push(StoredDocument {
                id: doc_path.id().to_string(),
                path: doc_path,
                fields,
            });
        }
        debug!(collection = %path, count = docs.len(), "streamed documents");
        Ok(docs)
    }
}
