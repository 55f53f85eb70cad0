//! File names for downloaded reports.

use url::Url;

/// Sanitize a string for use as a filename.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim_matches(|c| c == '_' || c == '.');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.chars().take(100).collect()
    }
}

/// Local file name for a report: ticker, an optional priority tag, then the
/// original file name from the URL.
///
/// `https://x.com/files/Q4%20Report.pdf` for `ABC` from a priority page
/// becomes `ABC_priority_Q4_Report.pdf`.
pub fn document_filename(ticker: &str, url: &str, priority: bool) -> String {
    let original = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .map(|segment| {
            urlencoding::decode(&segment)
                .map(|s| s.into_owned())
                .unwrap_or(segment)
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document.pdf".to_string());

    let mut name = sanitize_filename(&original);
    if !name.to_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }

    let ticker = sanitize_filename(&ticker.to_uppercase());
    if priority {
        format!("{}_priority_{}", ticker, name)
    } else {
        format!("{}_{}", ticker, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b:c"), "a_b_c");
        assert_eq!(sanitize_filename("  "), "document");
        assert_eq!(sanitize_filename(&"x".repeat(150)).len(), 100);
    }

    #[test]
    fn test_document_filename() {
        assert_eq!(
            document_filename("abc", "https://x.com/files/Q4%20Report.pdf", true),
            "ABC_priority_Q4_Report.pdf"
        );
        assert_eq!(
            document_filename("ABC", "https://x.com/download?id=7", false),
            "ABC_download.pdf"
        );
        assert_eq!(
            document_filename("ABC", "https://x.com/", false),
            "ABC_document.pdf"
        );
    }
}
