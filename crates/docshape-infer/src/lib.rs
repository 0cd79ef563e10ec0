//! docshape inference: type classification, per-document field analysis,
//! cross-document merging and the recursive structure report.

pub mod analyzer;
pub mod classify;
pub mod fields;
pub mod merge;
pub mod types;

pub use analyzer::StructureAnalyzer;
pub use classify::{classify, classify_with_limit};
pub use fields::FieldAnalyzer;
pub use merge::{merge_all, merge_field_maps};
pub use types::{
    AnalysisSummary, CollectionAnalysis, CollectionStructure, DocumentReport, FieldDescriptor,
    FieldMap, FieldSummary, FieldType, MainDocument, ReportError, SampleDocument,
    StructureReport,
};
