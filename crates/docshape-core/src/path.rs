//! Collection and document paths in the hierarchical store.
//!
//! A collection path has an odd number of segments (`vendor_store`,
//! `vendor_store/v1/products`), a document path an even number
//! (`vendor_store/v1`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path of a collection or sub-collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentPath {
    segments: Vec<String>,
}

fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(Error::InvalidPath(format!("invalid path segment: {:?}", segment)));
    }
    Ok(())
}

fn split(path: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = path.trim_matches('/').split('/').map(str::to_string).collect();
    for segment in &segments {
        check_segment(segment)?;
    }
    Ok(segments)
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> Result<Self> {
        check_segment(name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Parse a slash-separated collection path.
    pub fn parse(path: &str) -> Result<Self> {
        let segments = split(path)?;
        if segments.len() % 2 == 0 {
            return Err(Error::InvalidPath(format!("not a collection path: {}", path)));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Name of the collection (last segment).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Document that owns this sub-collection, `None` for top-level collections.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn doc(&self, id: &str) -> Result<DocumentPath> {
        check_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocumentPath { segments })
    }
}

impl DocumentPath {
    /// Parse a slash-separated document path.
    pub fn parse(path: &str) -> Result<Self> {
        let segments = split(path)?;
        if segments.len() % 2 != 0 {
            return Err(Error::InvalidPath(format!("not a document path: {}", path)));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Document id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection that contains this document.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    pub fn collection(&self, name: &str) -> Result<CollectionPath> {
        check_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
