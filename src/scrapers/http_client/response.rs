//! A fetched response with its headers already read.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};

pub struct HttpResponse {
    pub status: StatusCode,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub(crate) response: Response,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Whether the body is a page worth parsing for links. A missing
    /// content type is given the benefit of the doubt.
    pub fn is_markup(&self) -> bool {
        self.content_type()
            .map(is_markup_type)
            .unwrap_or(true)
    }

    /// Length announced by the server, if any. Not trusted for size limits
    /// on its own, the body is still counted while streaming.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|len| len.trim().parse().ok())
    }

    /// Hand over the body for chunked reading.
    pub fn into_response(self) -> Response {
        self.response
    }

    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.response.text().await
    }
}

fn is_markup_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.contains("html") || essence.ends_with("xml")
}
