//! Outbound request value that credentials are applied to
//!
//! Only the URL is read and only `Authorization` / `Content-Length` are
//! written by this crate. Sending the request is left to `reqwest` (see
//! [`crate::exchange`]).

use std::collections::BTreeMap;

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderValue};
use url::Url;

use crate::error::{Error, Result};

/// A pending HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_owned(),
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Build a request from a URL string.
    pub fn parse(method: &str, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::new(method, url))
    }

    /// Decoded query parameters. Repeated keys keep the last value.
    pub fn query_params(&self) -> BTreeMap<String, String> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Replace the `Authorization` header.
    pub fn set_authorization(&mut self, value: &str) -> Result<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidHeader(format!("authorization: {e}")))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Current `Authorization` header, if set and valid UTF-8.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_content_length(&mut self, len: usize) {
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }

    /// Convert into a `reqwest` builder carrying the same method, URL,
    /// headers, and body.
    pub fn to_reqwest(&self, client: &reqwest::Client) -> Result<reqwest::RequestBuilder> {
        let method = reqwest::Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::Http(format!("invalid method {}: {e}", self.method)))?;
        let mut builder = client
            .request(method, self.url.clone())
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}
