//! Human-readable formatting utilities.

/// Format a byte count as a human-readable size.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format an optional figure with its unit, or a dash when missing.
pub fn format_figure(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.3} {}", v, unit),
        None => "-".to_string(),
    }
}
