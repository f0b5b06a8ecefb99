//! Cookie header parsing and `Set-Cookie` serialization.

use std::collections::HashMap;
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::Error;

/// First second of year 10000; HTTP dates only go up to 9999.
const MAX_HTTP_DATE_SECS: u64 = 253_402_300_800;

/// Characters left unescaped in cookie names and values: the URI component
/// unreserved set (`A-Z a-z 0-9 - _ . ! ~ * ' ( )`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `SameSite` attribute values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax    => "Lax",
            Self::None   => "None",
        }
    }
}

/// Attributes appended to a `Set-Cookie` directive.
///
/// Every field is optional. Build one fluently:
///
/// ```rust
/// use sprig::cookie::{CookieOptions, SameSite};
///
/// let opts = CookieOptions::new()
///     .domain("example.com")
///     .path("/")
///     .http_only()
///     .same_site(SameSite::Lax);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CookieOptions {
    pub max_age: Option<u64>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<SystemTime>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Max-Age`, in seconds.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Parses a `Cookie` request header into a name → value map.
///
/// Pairs are split on `;`, trimmed, split on the first `=`, and both halves
/// are percent-decoded. Pairs without an `=` are skipped. A repeated name
/// keeps its last value.
pub fn parse(header: Option<&str>) -> HashMap<String, String> {
    let Some(header) = header else {
        return HashMap::new();
    };

    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((decode(name), decode(value)))
        })
        .collect()
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Builds the value of one `Set-Cookie` header.
///
/// Attributes always appear in this order, each only when set:
/// `Max-Age`, `Domain`, `Path`, `Expires`, `HttpOnly`, `Secure`, `SameSite`.
///
/// Fails with [`Error::InvalidExpires`] when `expires` falls before 1970 or
/// after 9999.
pub fn serialize(name: &str, value: &str, options: &CookieOptions) -> Result<String, Error> {
    let mut out = format!(
        "{}={}",
        utf8_percent_encode(name, COMPONENT),
        utf8_percent_encode(value, COMPONENT)
    );

    // Writing into a String cannot fail.
    if let Some(max_age) = options.max_age {
        let _ = write!(out, "; Max-Age={max_age}");
    }
    if let Some(domain) = &options.domain {
        let _ = write!(out, "; Domain={domain}");
    }
    if let Some(path) = &options.path {
        let _ = write!(out, "; Path={path}");
    }
    if let Some(expires) = options.expires {
        let secs = expires
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::InvalidExpires)?
            .as_secs();
        if secs >= MAX_HTTP_DATE_SECS {
            return Err(Error::InvalidExpires);
        }
        let _ = write!(out, "; Expires={}", httpdate::fmt_http_date(expires));
    }
    if options.http_only {
        out.push_str("; HttpOnly");
    }
    if options.secure {
        out.push_str("; Secure");
    }
    if let Some(same_site) = options.same_site {
        let _ = write!(out, "; SameSite={}", same_site.as_str());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parse_absent_or_empty() {
        assert!(parse(None).is_empty());
        assert!(parse(Some("")).is_empty());
    }

    #[test]
    fn parse_pairs() {
        let cookies = parse(Some("sessionId=abc123; otherCookie=value"));
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["sessionId"], "abc123");
        assert_eq!(cookies["otherCookie"], "value");
    }

    #[test]
    fn parse_decodes_and_splits_on_first_equals() {
        let cookies = parse(Some("na%20me=a%3Db; token=x=y"));
        assert_eq!(cookies["na me"], "a=b");
        assert_eq!(cookies["token"], "x=y");
    }

    #[test]
    fn parse_skips_malformed_pairs() {
        let cookies = parse(Some("flag; a=1;;  "));
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies["a"], "1");
    }

    #[test]
    fn serialize_plain() {
        assert_eq!(
            serialize("token", "f9a3e039-d605-4aea-a670-f1ab6b54b459", &CookieOptions::default())
                .unwrap(),
            "token=f9a3e039-d605-4aea-a670-f1ab6b54b459"
        );
    }

    #[test]
    fn serialize_escapes_like_a_uri_component() {
        assert_eq!(
            serialize("a b", "x;y=z!*()", &CookieOptions::default()).unwrap(),
            "a%20b=x%3By%3Dz!*()"
        );
    }

    #[test]
    fn serialize_all_attributes_in_order() {
        let opts = CookieOptions::new()
            .same_site(SameSite::Lax)
            .secure()
            .http_only()
            .expires(UNIX_EPOCH + Duration::from_secs(3_376_674_000))
            .path("/")
            .domain("example.com")
            .max_age(60 * 60 * 60);

        assert_eq!(
            serialize("token", "f9a3e039-d605-4aea-a670-f1ab6b54b459", &opts).unwrap(),
            "token=f9a3e039-d605-4aea-a670-f1ab6b54b459; Max-Age=216000; Domain=example.com; \
             Path=/; Expires=Thu, 31 Dec 2076 21:00:00 GMT; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn serialize_epoch_expiry() {
        let opts = CookieOptions::new().expires(UNIX_EPOCH);
        assert_eq!(
            serialize("token", "", &opts).unwrap(),
            "token=; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn serialize_rejects_expiry_before_1970() {
        let opts = CookieOptions::new().expires(UNIX_EPOCH - Duration::from_secs(1));
        assert!(matches!(serialize("a", "b", &opts), Err(Error::InvalidExpires)));
    }

    #[test]
    fn serialize_rejects_expiry_after_9999() {
        let last = UNIX_EPOCH + Duration::from_secs(MAX_HTTP_DATE_SECS - 1);
        assert_eq!(
            serialize("a", "b", &CookieOptions::new().expires(last)).unwrap(),
            "a=b; Expires=Fri, 31 Dec 9999 23:59:59 GMT"
        );

        let opts = CookieOptions::new().expires(UNIX_EPOCH + Duration::from_secs(MAX_HTTP_DATE_SECS));
        assert!(matches!(serialize("a", "b", &opts), Err(Error::InvalidExpires)));
    }
}
