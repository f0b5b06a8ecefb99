//! Incoming request context and the preprocessing stage that builds it.
//!
//! Before any route is matched, the raw request is turned into a
//! [`Request`]: the query string and `Cookie` header are parsed and the body
//! is buffered in full and decoded according to its content type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;

use crate::cookie;
use crate::error::{BoxError, Error};
use crate::method::accepts_body;

// ── Body ──────────────────────────────────────────────────────────────────────

/// A decoded request body, or data handed to
/// [`Response::send`](crate::Response::send).
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

impl Body {
    /// The text, if this is a plain-text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    /// The parsed value, if this body was decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Text(_) => None,
            Self::Json(v) => Some(v),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// An incoming request, enriched with its query, cookies and decoded body.
///
/// Cloning is cheap: every link of the handler chain receives a handle to
/// the same per-request data.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Inner>,
}

struct Inner {
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Body,
}

impl Request {
    pub fn method(&self) -> &http::Method { &self.inner.method }
    pub fn uri(&self) -> &Uri { &self.inner.uri }
    pub fn headers(&self) -> &HeaderMap { &self.inner.headers }
    pub fn body(&self) -> &Body { &self.inner.body }

    /// The request path as received, without the query string.
    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name)?.to_str().ok()
    }

    /// Returns a query parameter. For repeated keys the last one wins.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.inner.query.get(key).map(String::as_str)
    }

    pub fn query_map(&self) -> &HashMap<String, String> {
        &self.inner.query
    }

    /// Returns a cookie sent by the client.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.inner.cookies.get(name).map(String::as_str)
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.inner.cookies
    }

    /// Runs the preprocessing stage on a raw request.
    ///
    /// The whole body is read before this returns; `limit` caps how many
    /// bytes are accepted.
    pub(crate) async fn from_http<B>(req: http::Request<B>, limit: usize) -> Result<Self, Error>
    where
        B: hyper::body::Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();

        if parts.uri.path().is_empty() {
            return Err(Error::MissingTarget);
        }

        let query = parse_query(parts.uri.query());
        let cookies = cookie::parse(cookie_header(&parts.headers).as_deref());

        let raw = read_body(body, limit).await?;
        let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let body = decode_body(&parts.method, content_type, &raw)?;

        Ok(Self {
            inner: Arc::new(Inner {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                query,
                cookies,
                body,
            }),
        })
    }
}

// ── Preprocessing steps ───────────────────────────────────────────────────────

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// HTTP/2 clients may split cookies across several headers; join them back.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, Error>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(Error::BodyTooLarge { limit }),
        Err(e) => Err(Error::BodyRead(e)),
    }
}

fn decode_body(method: &http::Method, content_type: Option<&str>, raw: &[u8]) -> Result<Body, Error> {
    if raw.is_empty() {
        return Ok(Body::default());
    }
    if !accepts_body(method) {
        return Err(Error::BodyNotAllowed(method.clone()));
    }
    if content_type.is_some_and(|ct| ct.contains("application/json")) {
        return Ok(Body::Json(serde_json::from_slice(raw)?));
    }
    Ok(Body::Text(String::from_utf8_lossy(raw).into_owned()))
}
