//! Page classification from title and URL keywords.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize_for_matching;
use crate::models::{PageContext, PageKind};

/// Keyword patterns per page kind. A page's score for a kind is the number of
/// patterns that match its title and URL.
static PAGE_PATTERNS: LazyLock<Vec<(PageKind, Vec<Regex>)>> = LazyLock::new(|| {
    let build = |patterns: &[&str]| -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    };
    vec![
        (
            PageKind::ResourceEstimate,
            build(&[
                r"reserves?[\s/&-]*(and|&)?[\s-]*resources?",
                r"mineral[\s-]+(reserves?|resources?)",
                r"resource[\s-]+estimates?",
                r"\breserves?\b",
            ]),
        ),
        (
            PageKind::TechnicalReport,
            build(&[
                r"technical[\s-]+reports?",
                r"ni[\s-]*43[\s-]*101",
                r"\bjorc\b",
                r"s[\s-]*k[\s-]*1300",
                r"feasibility",
            ]),
        ),
        (
            PageKind::Projects,
            build(&[
                r"\bprojects?\b",
                r"\boperations?\b",
                r"\bproperties\b|\bproperty\b",
                r"\bmines?\b",
                r"\bassets?\b",
            ]),
        ),
        (
            PageKind::AnnualReport,
            build(&[
                r"annual[\s-]+reports?",
                r"annual[\s-]+information[\s-]+form|\baif\b",
                r"\b(10|20|40)[\s-]*[kf]\b",
            ]),
        ),
        (
            PageKind::InvestorReports,
            build(&[
                r"\binvestors?\b",
                r"financial[\s-]+(reports?|statements?|results?)",
                r"quarterly|\bq[1-4]\b",
                r"\bmd&?a\b|management.?s[\s-]+discussion",
                r"\bagm\b",
            ]),
        ),
        (
            PageKind::GeneralReports,
            build(&[
                r"\breports?\b",
                r"\bpublications?\b",
                r"\bdocuments?\b",
                r"\bdownloads?\b",
                r"\bfilings?\b",
            ]),
        ),
    ]
});

/// Classify a visited HTML page from its title and URL.
///
/// The kind with the most matching keyword patterns wins; ties go to the kind
/// with the higher weight. Pages matching nothing are `Unknown` with weight 0.
pub fn classify_page(title: &str, url: &str) -> PageContext {
    let haystack = format!(
        "{} {}",
        normalize_for_matching(title),
        normalize_for_matching(url)
    );

    let mut best: Option<(PageKind, usize)> = None;
    for (kind, patterns) in PAGE_PATTERNS.iter() {
        let hits = patterns.iter().filter(|p| p.is_match(&haystack)).count();
        if hits == 0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_kind, best_hits)) => {
                hits > best_hits || (hits == best_hits && kind.weight() > best_kind.weight())
            }
        };
        if better {
            best = Some((*kind, hits));
        }
    }

    best.map(|(kind, _)| PageContext::new(kind))
        .unwrap_or_else(PageContext::unknown)
}
