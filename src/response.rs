//! The outgoing response handle.
//!
//! Handlers never build and return a response value. They receive a
//! [`Response`] handle and call [`send`](Response::send) on it, after any
//! number of [`set`](Response::set) and [`set_cookie`](Response::set_cookie)
//! calls. Every link of the chain shares the same handle, so headers a
//! middleware sets are still there when the route handler sends.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::UNIX_EPOCH;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::cookie::{self, CookieOptions};
use crate::error::Error;
use crate::request::Body;

/// The response type handed to hyper.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// A handle to the response of one request.
///
/// Cloning is cheap and every clone writes to the same response. The first
/// [`send`](Self::send) delivers it; later calls are ignored.
#[derive(Clone)]
pub struct Response {
    inner: Arc<Mutex<State>>,
}

struct State {
    headers: HeaderMap,
    tx: Option<oneshot::Sender<HttpResponse>>,
}

impl Response {
    /// Creates a handle plus the receiver that resolves once it is sent.
    ///
    /// The receiver errors if every handle is dropped without a `send`.
    pub(crate) fn channel() -> (Self, oneshot::Receiver<HttpResponse>) {
        let (tx, rx) = oneshot::channel();
        let state = State { headers: HeaderMap::new(), tx: Some(tx) };
        (Self { inner: Arc::new(Mutex::new(state)) }, rx)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `data` with `200 OK`.
    ///
    /// Text goes out as `text/plain`. JSON objects, arrays and `null` go out
    /// serialised as `application/json`; other JSON values as plain text.
    pub fn send(&self, data: impl Into<Body>) {
        self.send_status(data, StatusCode::OK);
    }

    /// Sends `data` with the given status.
    pub fn send_status(&self, data: impl Into<Body>, status: StatusCode) {
        let (content_type, body) = encode(data.into());

        let mut state = self.state();
        let Some(tx) = state.tx.take() else {
            warn!(%status, "response already sent, ignoring");
            return;
        };

        let mut headers = std::mem::take(&mut state.headers);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        let mut response = http::Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        // The receiver is gone only if dispatch was dropped; nothing to do then.
        let _ = tx.send(response);
    }

    /// Sets one header, replacing any earlier value under that name.
    pub fn set(&self, name: &str, value: &str) -> Result<(), Error> {
        let (name, value) = header_pair(name, value)?;
        self.state().headers.insert(name, value);
        Ok(())
    }

    /// Sets several headers at once.
    ///
    /// Every pair is validated before any is applied.
    ///
    /// ```rust,no_run
    /// # fn demo(res: sprig::Response) -> Result<(), sprig::Error> {
    /// res.set_all([("x-some-header", "a"), ("x-another-header", "b")])?;
    /// # Ok(()) }
    /// ```
    pub fn set_all<I, K, V>(&self, headers: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs = headers
            .into_iter()
            .map(|(k, v)| header_pair(k.as_ref(), v.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.state();
        for (name, value) in pairs {
            state.headers.insert(name, value);
        }
        Ok(())
    }

    /// Adds a `Set-Cookie` directive with no attributes.
    pub fn set_cookie(&self, name: &str, value: &str) -> Result<(), Error> {
        self.set_cookie_with(name, value, &CookieOptions::default())
    }

    /// Adds a `Set-Cookie` directive. Directives accumulate in call order.
    pub fn set_cookie_with(&self, name: &str, value: &str, options: &CookieOptions) -> Result<(), Error> {
        let directive = cookie::serialize(name, value, options)?;
        let value = HeaderValue::try_from(directive.as_str())
            .map_err(|_| Error::InvalidHeader(directive.clone()))?;
        self.state().headers.append(SET_COOKIE, value);
        Ok(())
    }

    /// Expires a cookie on the client.
    pub fn clear_cookie(&self, name: &str) -> Result<(), Error> {
        self.clear_cookie_with(name, &CookieOptions::default())
    }

    /// Expires a cookie, keeping attributes such as `Path` or `Domain` so the
    /// client matches the cookie it stored.
    pub fn clear_cookie_with(&self, name: &str, options: &CookieOptions) -> Result<(), Error> {
        let options = options.clone().expires(UNIX_EPOCH);
        self.set_cookie_with(name, "", &options)
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let header_name =
        HeaderName::try_from(name).map_err(|_| Error::InvalidHeader(format!("{name}: invalid name")))?;
    let header_value =
        HeaderValue::try_from(value).map_err(|_| Error::InvalidHeader(format!("{name}: invalid value")))?;
    Ok((header_name, header_value))
}

fn encode(data: Body) -> (&'static str, Bytes) {
    match data {
        Body::Json(value @ (Value::Object(_) | Value::Array(_) | Value::Null)) => {
            ("application/json", Bytes::from(value.to_string()))
        }
        Body::Json(Value::String(s)) | Body::Text(s) => ("text/plain", Bytes::from(s)),
        Body::Json(scalar) => ("text/plain", Bytes::from(scalar.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;
    use crate::cookie::SameSite;

    async fn body_of(res: HttpResponse) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn send_text() {
        let (res, rx) = Response::channel();
        res.send("Hello, World!");

        let out = rx.await.unwrap();
        assert_eq!(out.status(), StatusCode::OK);
        assert_eq!(out.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_of(out).await, "Hello, World!");
    }

    #[tokio::test]
    async fn send_structured_value_as_json() {
        let (res, rx) = Response::channel();
        res.send_status(json!({ "message": "Hello" }), StatusCode::CREATED);

        let out = rx.await.unwrap();
        assert_eq!(out.status(), StatusCode::CREATED);
        assert_eq!(out.headers()[CONTENT_TYPE], "application/json");
        let parsed: Value = serde_json::from_str(&body_of(out).await).unwrap();
        assert_eq!(parsed, json!({ "message": "Hello" }));
    }

    #[test]
    fn json_scalars_are_text() {
        assert_eq!(encode(json!("hi").into()), ("text/plain", Bytes::from("hi")));
        assert_eq!(encode(json!(42).into()), ("text/plain", Bytes::from("42")));
        assert_eq!(encode(json!([1, 2]).into()), ("application/json", Bytes::from("[1,2]")));
        assert_eq!(encode(Value::Null.into()), ("application/json", Bytes::from("null")));
    }

    #[tokio::test]
    async fn second_send_is_ignored() {
        let (res, rx) = Response::channel();
        res.send_status("Forbidden", StatusCode::FORBIDDEN);
        res.send("late");

        let out = rx.await.unwrap();
        assert_eq!(out.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(out).await, "Forbidden");
    }

    #[tokio::test]
    async fn headers_set_on_any_clone_are_sent() {
        let (res, rx) = Response::channel();
        let other = res.clone();
        other.set("X-Powered-By", "sprig").unwrap();
        res.set_all([("X-Some-Header", "test-value"), ("X-Another-Header", "another-value")])
            .unwrap();
        res.send("ok");

        let out = rx.await.unwrap();
        assert_eq!(out.headers()["x-powered-by"], "sprig");
        assert_eq!(out.headers()["x-some-header"], "test-value");
        assert_eq!(out.headers()["x-another-header"], "another-value");
    }

    #[test]
    fn invalid_headers_are_rejected() {
        let (res, _rx) = Response::channel();
        assert!(matches!(
            res.set("bad header", "v"),
            Err(Error::InvalidHeader(ref m)) if m == "bad header: invalid name"
        ));
        assert!(matches!(
            res.set("x-ok", "line\nbreak"),
            Err(Error::InvalidHeader(ref m)) if m == "x-ok: invalid value"
        ));
        assert!(res.set_all([("x-good", "1"), ("bad header", "2")]).is_err());
        assert!(res.state().headers.get("x-good").is_none());
    }

    #[tokio::test]
    async fn cookies_accumulate_in_call_order() {
        let (res, rx) = Response::channel();
        res.set_cookie_with("token", "abc", &CookieOptions::new().domain("example.com")).unwrap();
        res.set_cookie("another_token", "def").unwrap();
        res.send("Cookie set!");

        let out = rx.await.unwrap();
        let cookies: Vec<_> = out.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["token=abc; Domain=example.com", "another_token=def"]);
    }

    #[tokio::test]
    async fn clear_cookie_expires_at_epoch() {
        let (res, rx) = Response::channel();
        res.clear_cookie("token").unwrap();
        res.clear_cookie_with("sid", &CookieOptions::new().path("/").same_site(SameSite::Strict))
            .unwrap();
        res.send("Cookie removed!");

        let out = rx.await.unwrap();
        let cookies: Vec<_> = out.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(
            cookies,
            [
                "token=; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
                "sid=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Strict",
            ]
        );
    }

    #[tokio::test]
    async fn out_of_range_expiry_is_an_error() {
        let (res, rx) = Response::channel();
        let opts = CookieOptions::new().expires(UNIX_EPOCH - std::time::Duration::from_secs(1));
        assert!(matches!(res.set_cookie_with("token", "abc", &opts), Err(Error::InvalidExpires)));
        res.send("still answering");

        let out = rx.await.unwrap();
        assert!(out.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_of(out).await, "still answering");
    }

    #[tokio::test]
    async fn dropping_every_handle_closes_the_channel() {
        let (res, rx) = Response::channel();
        drop(res);
        assert!(rx.await.is_err());
    }
}
