//! Link extraction from HTML pages.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// An anchor resolved against its page.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub url: Url,
    /// Anchor text with whitespace collapsed.
    pub text: String,
}

/// The title and partitioned links of one page.
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub title: String,
    /// Links to PDF documents, on any host.
    pub pdf_links: Vec<Link>,
    /// Links to other pages on the same site.
    pub page_links: Vec<Link>,
}

/// The host a crawl stays on: the seed's host without a leading `www.`.
pub fn site_domain(seed: &Url) -> String {
    let host = seed.host_str().unwrap_or_default().to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => host,
    }
}

/// Whether `host` is `domain` or one of its subdomains.
pub fn is_on_site(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Whether `url` points at a PDF document.
pub fn is_pdf_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    path.ends_with(".pdf") || url.query().is_some_and(|q| q.to_lowercase().contains(".pdf"))
}

/// Resolve an href against the page URL, dropping fragments and non-HTTP schemes.
fn resolve_href(page_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let mut url = page_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Extract the title and links of an HTML page.
///
/// PDF links are kept regardless of host, since companies often serve filings
/// from a CDN. Page links are kept only on `site` (see [`site_domain`]).
pub fn extract_links(html: &str, page_url: &Url, site: &str) -> PageLinks {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut links = PageLinks {
        title,
        ..Default::default()
    };

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_href(page_url, href))
        else {
            continue;
        };
        if !seen.insert(url.as_str().to_string()) {
            continue;
        }

        let text = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let link = Link { url, text };

        if is_pdf_url(&link.url) {
            links.pdf_links.push(link);
        } else if link
            .url
            .host_str()
            .is_some_and(|host| is_on_site(host, site))
        {
            links.page_links.push(link);
        }
    }

    links
}
