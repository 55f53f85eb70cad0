//! HTTP client for company websites and report downloads.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::crawler::PageFetcher;
use super::FetchError;
use crate::config::Settings;

/// HTTP client with a politeness delay between requests.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration, request_delay: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, request_delay, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default assayer user agent
    /// - Some("impersonate"): Use random real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        request_delay: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            request_delay,
        })
    }

    /// Create a client from runtime settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        Self::with_user_agent(
            Duration::from_secs(settings.request_timeout),
            Duration::from_millis(settings.request_delay_ms),
            Some(&settings.user_agent),
        )
    }

    /// Make a GET request. Non-success statuses are returned, not raised.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await?;

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }
        debug!(url, status = response.status().as_u16(), "GET");

        // Apply base delay between requests to the same site
        tokio::time::sleep(self.request_delay).await;

        Ok(HttpResponse {
            status: response.status(),
            headers,
            response,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status.as_u16(),
            });
        }
        if !response.is_markup() {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type: response.content_type().unwrap_or_default().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
