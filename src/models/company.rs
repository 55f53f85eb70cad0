//! Company models: the registry row and the immutable crawl input derived from it.

use serde::{Deserialize, Serialize};

/// Market capitalisation at or above which a company is crawled as `Large`.
pub const LARGE_MARKET_CAP: f64 = 500_000_000.0;

/// Crawl size class, derived from market capitalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Small,
    Large,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Large => "large",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "small" => Some(Self::Small),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    /// Classify a market cap (in source currency units) against `threshold`.
    /// Companies without a known market cap are treated as small.
    pub fn from_market_cap(market_cap: Option<f64>, threshold: f64) -> Self {
        match market_cap {
            Some(value) if value >= threshold => Self::Large,
            _ => Self::Small,
        }
    }
}

/// A company row as provided by the company data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub company_id: i32,
    pub ticker: String,
    pub website: Option<String>,
    pub market_cap_value: Option<f64>,
    pub market_cap_currency: Option<String>,
    pub description: Option<String>,
}

impl Company {
    /// Build the crawl input for this company.
    ///
    /// Returns `None` when the company has no website to seed the crawl from.
    pub fn to_target(&self, large_market_cap: f64) -> Option<CrawlTarget> {
        let seed_url = self.website.as_deref()?.trim();
        if seed_url.is_empty() {
            return None;
        }
        let seed_url = if seed_url.starts_with("http://") || seed_url.starts_with("https://") {
            seed_url.to_string()
        } else {
            format!("https://{}", seed_url)
        };

        Some(CrawlTarget {
            company_id: self.company_id,
            ticker: self.ticker.clone(),
            seed_url,
            size_class: SizeClass::from_market_cap(self.market_cap_value, large_market_cap),
            description: self.description.clone().unwrap_or_default(),
        })
    }
}

/// Immutable input for one company crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub company_id: i32,
    pub ticker: String,
    pub seed_url: String,
    pub size_class: SizeClass,
    /// Free-text description, used to cross-check mined figures.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(website: Option<&str>, cap: Option<f64>) -> Company {
        Company {
            company_id: 7,
            ticker: "ABC".to_string(),
            website: website.map(|s| s.to_string()),
            market_cap_value: cap,
            market_cap_currency: Some("CAD".to_string()),
            description: Some("Gold and silver explorer".to_string()),
        }
    }

    #[test]
    fn test_size_class_threshold() {
        assert_eq!(
            SizeClass::from_market_cap(Some(500_000_000.0), LARGE_MARKET_CAP),
            SizeClass::Large
        );
        assert_eq!(
            SizeClass::from_market_cap(Some(499_999_999.0), LARGE_MARKET_CAP),
            SizeClass::Small
        );
        assert_eq!(
            SizeClass::from_market_cap(None, LARGE_MARKET_CAP),
            SizeClass::Small
        );
    }

    #[test]
    fn test_to_target_adds_scheme() {
        let target = company(Some("example.com"), Some(1e9))
            .to_target(LARGE_MARKET_CAP)
            .unwrap();
        assert_eq!(target.seed_url, "https://example.com");
        assert_eq!(target.size_class, SizeClass::Large);
        assert_eq!(target.description, "Gold and silver explorer");
    }

    #[test]
    fn test_to_target_requires_website() {
        assert!(company(None, None).to_target(LARGE_MARKET_CAP).is_none());
        assert!(company(Some("  "), None).to_target(LARGE_MARKET_CAP).is_none());
    }
}
