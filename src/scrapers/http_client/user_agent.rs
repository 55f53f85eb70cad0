//! User agent selection.

/// Sent unless the config says otherwise.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; assayer/0.3; +resource-estimates)";

/// Config value that swaps in a desktop browser agent.
const BROWSER_MODE: &str = "browser";

// Some hosted investor-relations platforms serve an empty shell to non-browsers.
const BROWSER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

fn browser_agent() -> &'static str {
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as usize)
        .unwrap_or_default();
    BROWSER_AGENTS[seed % BROWSER_AGENTS.len()]
}

/// Turn the configured value into the header actually sent.
pub fn resolve_user_agent(configured: Option<&str>) -> String {
    match configured.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(mode) if mode.eq_ignore_ascii_case(BROWSER_MODE) => browser_agent().to_string(),
        Some(custom) => custom.to_string(),
    }
}
