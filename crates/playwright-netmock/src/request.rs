// Neutral request/response values
//
// The values exchanged with the mock engine. The fixture builds a
// FetchRequest from the framework's route object and turns the
// engine's FetchResponse back into a fulfillment call; neither side
// ever sees the other's types.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::collections::HashMap;
use url::Url;

/// An intercepted request in engine-neutral form.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Absolute request URL
    pub url: Url,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body bytes, if any
    pub body: Option<Bytes>,
}

impl FetchRequest {
    /// Looks up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Resolves the origin of the `referer` header, used as the base
    /// URL when matching relative handler paths.
    ///
    /// Returns `None` when the header is absent or carries an opaque
    /// origin. A malformed header value fails the request.
    pub fn referer_origin(&self) -> Result<Option<String>> {
        let Some(referer) = self.header("referer") else {
            return Ok(None);
        };

        let url = Url::parse(referer)
            .map_err(|error| Error::TranslationError(format!("invalid referer header: {error}")))?;

        let origin = url.origin();
        Ok(origin.is_tuple().then(|| origin.ascii_serialization()))
    }
}

/// A mocked response in engine-neutral form.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as bytes
    pub body: Option<Bytes>,
}

impl FetchResponse {
    /// Creates a new FetchResponse builder
    pub fn builder() -> FetchResponseBuilder {
        FetchResponseBuilder::default()
    }

    /// Creates a 200 response with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().body_string(body).build()
    }

    /// Creates a 200 response with a JSON body.
    pub fn json(value: &impl serde::Serialize) -> Result<Self> {
        Ok(Self::builder().json(value)?.build())
    }
}

/// Builder for FetchResponse
#[derive(Debug, Clone, Default)]
pub struct FetchResponseBuilder {
    status: Option<u16>,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    content_type: Option<String>,
}

impl FetchResponseBuilder {
    /// Sets the HTTP status code (default: 200)
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a response header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the response body from bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the response body from a string (content-type: text/plain)
    pub fn body_string(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Bytes::from(body.into().into_bytes()));
        self.content_type
            .get_or_insert_with(|| "text/plain".to_string());
        self
    }

    /// Sets the response body from JSON (content-type: application/json)
    pub fn json(mut self, value: &impl serde::Serialize) -> Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(value)?));
        self.content_type = Some("application/json".to_string());
        Ok(self)
    }

    /// Sets the Content-Type header
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Builds the FetchResponse
    pub fn build(self) -> FetchResponse {
        let mut headers = self.headers;
        if let Some(content_type) = self.content_type {
            headers.insert("content-type".to_string(), content_type);
        }

        FetchResponse {
            status: self.status.unwrap_or(200),
            headers,
            body: self.body,
        }
    }
}

/// Outcome of asking the mock engine to resolve a request.
#[derive(Debug, Clone)]
pub enum RequestResolution {
    /// No handler produced a response; the real request proceeds.
    Unhandled,
    /// A handler asked to simulate a connection failure; the real
    /// request is aborted. Distinct from a mocked 4xx/5xx response.
    NetworkError,
    /// A handler produced a mocked response; the real request is
    /// fulfilled with it.
    Response(FetchResponse),
}
