//! JSON export of structure reports.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use docshape_infer::StructureReport;

/// File name used when no output path is given.
pub fn default_filename(report: &StructureReport) -> String {
    let id = report.document_id();
    if id.is_empty() {
        "document_structure_unknown.json".to_string()
    } else {
        format!("document_structure_{}.json", id)
    }
}

/// Write the report as pretty-printed JSON.
///
/// Returns the written path, or `None` after logging the failure.
pub fn export_report(report: &StructureReport, output: Option<&Path>) -> Option<PathBuf> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_filename(report)));

    match write_json(report, &path) {
        Ok(()) => {
            info!("Structure exported to {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!("Error exporting structure to {}: {}", path.display(), e);
            None
        }
    }
}

fn write_json(report: &StructureReport, path: &Path) -> docshape_core::Result<()> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}
