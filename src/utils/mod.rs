//! Shared utility functions.
//!
//! - `format`: Human-readable formatting (sizes, etc.)
//! - `filename`: Local file names for downloaded reports

mod filename;
mod format;

pub use filename::{document_filename, sanitize_filename};
pub use format::{format_figure, format_size};
