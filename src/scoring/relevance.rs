//! Relevance scoring for PDF links found during a crawl.
//!
//! A link's score is additive: the number of distinct positive signals its URL
//! and anchor text match, the weight of the page it was found on, and a bonus
//! for priority keywords. Any negative (ESG, policy, boilerplate) signal vetoes
//! the link regardless of score.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize_for_matching;
use crate::models::PageContext;

/// Minimum total score for a link to be downloaded.
pub const ELIGIBILITY_THRESHOLD: u32 = 3;

/// Keywords marking high-yield pages and links.
pub const PRIORITY_KEYWORDS: &[&str] = &["investors", "financial", "agm", "reports", "statements"];

// Whole words only, so `agm` does not hit "diagram"
static PRIORITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})s?\b", PRIORITY_KEYWORDS.join("|"))).unwrap()
});

static POSITIVE_SIGNALS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("ni_43_101", r"ni[\s-]*43[\s-]*101"),
        ("technical_report", r"technical[\s-]+report"),
        ("jorc", r"\bjorc\b|s[\s-]*k[\s-]*1300"),
        ("reserves", r"\b(proven|probable)?[\s-]*reserves?\b"),
        ("resources", r"\bresources?\b"),
        ("measured_indicated", r"\bmeasured\b|\bindicated\b|\binferred\b"),
        ("ounce_units", r"\d\s*(k|m)?oz\b|\b(moz|koz)\b|ounces"),
        ("mass_units", r"\btonnes\b|\d\s*(k|m)?t\b"),
        ("grade", r"g/t|grams?\s+per\s+tonne|\bgpt\b"),
        ("metals", r"\bgold\b|\bsilver\b|\bau\b|\bag\b|\bcopper\b"),
        (
            "mining_methods",
            r"open[\s-]*pit|underground|heap[\s-]*leach|\bmill(ing)?\b|\bore\b",
        ),
        (
            "filing_types",
            r"annual[\s-]+(report|information)|\baif\b|feasibility|\bpea\b|preliminary[\s-]+economic|\bmd&?a\b|\b(40|20)[\s-]*f\b|\b10[\s-]*k\b",
        ),
        ("production", r"\bproduction\b|\bguidance\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

static NEGATIVE_SIGNALS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("sustainability", r"sustainab"),
        ("esg", r"\besg\b|environmental[\s,-]+social|\bclimate\b|\btcfd\b"),
        ("governance", r"governance|\bcharter\b|code[\s-]+of[\s-]+(business[\s-]+)?conduct"),
        ("policy", r"\bpolic(y|ies)\b|whistle[\s-]*blow"),
        ("social", r"human[\s-]+rights|modern[\s-]+slavery|diversity|\bcommunity\b"),
        ("boilerplate", r"privacy|terms[\s-]+of[\s-]+use|cookie|\bproxy\b|circular"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// Breakdown of a link's relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceScore {
    /// Number of distinct positive signals matched.
    pub positive_count: u32,
    /// Number of distinct negative signals matched.
    pub negative_count: u32,
    /// Weight of the originating page's context.
    pub context_weight: u32,
    /// 1 if the link itself carries a priority keyword.
    pub structural_bonus: u32,
    /// Whether the originating page is a priority page.
    pub from_priority_page: bool,
}

impl RelevanceScore {
    /// Additive score, ignoring the negative veto.
    pub fn total(&self) -> u32 {
        self.positive_count + self.context_weight + self.structural_bonus
    }

    pub fn is_eligible(&self) -> bool {
        self.negative_count == 0 && self.total() >= ELIGIBILITY_THRESHOLD
    }
}

/// Whether `text` contains one of the priority keywords as a word or path segment.
pub fn has_priority_keyword(text: &str) -> bool {
    PRIORITY_PATTERN.is_match(&normalize_for_matching(text))
}

/// Score a PDF link.
///
/// Signals are matched against the link URL and anchor text. `originating_path`
/// is the URL of the page the link was found on.
pub fn score(
    candidate_url: &str,
    anchor_text: &str,
    context: &PageContext,
    originating_path: &str,
) -> RelevanceScore {
    let haystack = format!(
        "{} {}",
        normalize_for_matching(candidate_url),
        normalize_for_matching(anchor_text)
    );

    let positive_count = POSITIVE_SIGNALS
        .iter()
        .filter(|(_, re)| re.is_match(&haystack))
        .count() as u32;
    let negative_count = NEGATIVE_SIGNALS
        .iter()
        .filter(|(_, re)| re.is_match(&haystack))
        .count() as u32;
    let structural_bonus = PRIORITY_PATTERN.is_match(&haystack) as u32;

    RelevanceScore {
        positive_count,
        negative_count,
        context_weight: context.weight,
        structural_bonus,
        from_priority_page: has_priority_keyword(originating_path),
    }
}
