//! Page classification models.

use serde::{Deserialize, Serialize};

/// Classification of a visited HTML page, derived from its title and URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    ResourceEstimate,
    TechnicalReport,
    Projects,
    AnnualReport,
    InvestorReports,
    GeneralReports,
    Unknown,
}

impl PageKind {
    pub const ALL: [PageKind; 7] = [
        Self::ResourceEstimate,
        Self::TechnicalReport,
        Self::Projects,
        Self::AnnualReport,
        Self::InvestorReports,
        Self::GeneralReports,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceEstimate => "resource_estimate",
            Self::TechnicalReport => "technical_report",
            Self::Projects => "projects",
            Self::AnnualReport => "annual_report",
            Self::InvestorReports => "investor_reports",
            Self::GeneralReports => "general_reports",
            Self::Unknown => "unknown",
        }
    }

    /// Context weight used by relevance scoring.
    pub fn weight(&self) -> u32 {
        match self {
            Self::ResourceEstimate | Self::TechnicalReport => 3,
            Self::Projects | Self::AnnualReport => 2,
            Self::InvestorReports | Self::GeneralReports => 1,
            Self::Unknown => 0,
        }
    }
}

/// Classification tag plus its numeric weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub kind: PageKind,
    pub weight: u32,
}

impl PageContext {
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            weight: kind.weight(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(PageKind::Unknown)
    }
}

impl Default for PageContext {
    fn default() -> Self {
        Self::unknown()
    }
}
