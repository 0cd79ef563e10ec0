//! docshape command-line support: report export and the text summary.

pub mod export;
pub mod summary;

pub use export::{default_filename, export_report};
pub use summary::{print_details, print_summary, render_details, render_summary};
