//! Human-readable summary of a structure report.
//!
//! Nested field and sub-collection listings go one level deep; the exported
//! JSON carries the full tree.

use std::fmt::Write;

use serde_json::Value;

use docshape_infer::{CollectionStructure, FieldMap, StructureReport};

const MAIN_SAMPLE_WIDTH: usize = 50;
const COLLECTION_SAMPLE_WIDTH: usize = 60;

/// Print the summary to stdout.
pub fn print_summary(report: &StructureReport) {
    print!("{}", render_summary(report));
}

/// Render the summary as text.
pub fn render_summary(report: &StructureReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    write_summary(&mut out, report).ok();
    out
}

/// Print field details for sub-collections whose name contains `pattern`.
pub fn print_details(report: &StructureReport, pattern: &str) {
    print!("{}", render_details(report, pattern));
}

/// Field details, with full samples, for every top-level sub-collection whose
/// name contains `pattern` (case-insensitive).
pub fn render_details(report: &StructureReport, pattern: &str) -> String {
    let mut out = String::new();
    write_details(&mut out, report, pattern).ok();
    out
}

fn write_details(out: &mut String, report: &StructureReport, pattern: &str) -> std::fmt::Result {
    let Some(report) = report.as_found() else {
        return Ok(());
    };
    let pattern = pattern.to_lowercase();
    for (name, structure) in &report.subcollections {
        if !name.to_lowercase().contains(&pattern) {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{} COLLECTION DETAILS:", name.to_uppercase())?;
        let Some(analysis) = structure.as_analyzed() else {
            continue;
        };
        writeln!(
            out,
            "   Total {} fields found: {}",
            name,
            analysis.document_structure.len()
        )?;
        for (field_name, field) in &analysis.document_structure {
            writeln!(out, "   • {}: {}", field_name, field.field_type)?;
            if let Some(example) = sample_text(&field.sample_value, usize::MAX) {
                writeln!(out, "     Example: {}", example)?;
            }
        }
    }
    Ok(())
}

fn write_summary(out: &mut String, report: &StructureReport) -> std::fmt::Result {
    let report = match report {
        StructureReport::Error(e) => return writeln!(out, "Error: {}", e.error),
        StructureReport::Found(report) => report,
    };

    writeln!(out)?;
    writeln!(
        out,
        "Structure Summary for: {}/{}",
        report.collection_name, report.document_id
    )?;
    writeln!(out, "{}", "=".repeat(80))?;

    writeln!(out, "Main Document Fields: {}", report.main_document.field_count)?;
    writeln!(out, "{}", "-".repeat(40))?;
    for (name, field) in &report.main_document.structure {
        writeln!(out, "  • {}: {}", name, field.field_type)?;
        if let Some(sample) = sample_text(&field.sample_value, MAIN_SAMPLE_WIDTH) {
            writeln!(out, "    Sample: {}", sample)?;
        }
        if let Some(nested) = &field.nested_fields {
            write_nested_fields(out, nested, "    ", "       ")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Subcollections: {}", report.subcollections.len())?;
    writeln!(out, "{}", "=".repeat(40))?;
    for (name, structure) in &report.subcollections {
        write_collection(out, name, structure)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(80))
}

fn write_collection(out: &mut String, name: &str, structure: &CollectionStructure) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "[{}] {} documents analyzed",
        name,
        structure.document_count()
    )?;
    if let Some(error) = structure.error() {
        writeln!(out, "   Error: {}", error)?;
    }
    let Some(analysis) = structure.as_analyzed() else {
        return Ok(());
    };

    writeln!(out, "   Fields found: {}", analysis.document_structure.len())?;
    for (field_name, field) in &analysis.document_structure {
        let mut type_info = field.field_type.to_string();
        if let Some(variations) = &field.type_variations {
            let labels: Vec<String> = variations.iter().map(ToString::to_string).collect();
            type_info.push_str(&format!(" (variations: {})", labels.join(", ")));
        }
        writeln!(out, "   • {}: {}", field_name, type_info)?;
        if let Some(sample) = sample_text(&field.sample_value, COLLECTION_SAMPLE_WIDTH) {
            writeln!(out, "     Sample: {}", sample)?;
        }
        if let Some(nested) = &field.nested_fields {
            write_nested_fields(out, nested, "     ", "        ")?;
        }
    }

    let ids: Vec<&str> = analysis
        .sample_documents
        .iter()
        .map(|d| d.document_id.as_str())
        .collect();
    writeln!(out, "   Sample document IDs: {:?}", ids)?;

    if let Some(children) = &analysis.subcollections {
        let names: Vec<&str> = children.keys().map(String::as_str).collect();
        writeln!(out, "   └─ Nested subcollections: {:?}", names)?;
        for (child_name, child) in children {
            writeln!(out, "      [{}] {} documents", child_name, child.document_count())?;
            if let Some(child) = child.as_analyzed() {
                let fields: Vec<&str> = child.document_structure.keys().map(String::as_str).collect();
                writeln!(out, "         Fields: {:?}", fields)?;
            }
        }
    }
    Ok(())
}

fn write_nested_fields(
    out: &mut String,
    nested: &FieldMap,
    header_indent: &str,
    item_indent: &str,
) -> std::fmt::Result {
    writeln!(out, "{}└─ Nested fields ({}):", header_indent, nested.len())?;
    for (name, field) in nested {
        writeln!(out, "{}• {}: {}", item_indent, name, field.field_type)?;
    }
    Ok(())
}

/// Display text for a sample, cut to `width` characters. Empty-ish samples are skipped.
fn sample_text(sample: &Value, width: usize) -> Option<String> {
    let text = match sample {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::Array(items) if items.is_empty() => return None,
        Value::Object(map) if map.is_empty() => return None,
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > width {
        let mut cut: String = text.chars().take(width).collect();
        cut.push_str("...");
        Some(cut)
    } else {
        Some(text)
    }
}
