//! Path canonicalization.
//!
//! Every comparison the router and the middleware table make goes through
//! [`normalize`], so `/users` and `/users/` always mean the same thing.

/// Returns `path` without any trailing slashes, unless the whole path is `/`.
///
/// Every trailing slash goes, not just the last one: `/a//` becomes `/a`,
/// where a single-slash strip would leave `/a/`. That keeps the result free of
/// a trailing `/` and makes `normalize(normalize(p)) == normalize(p)`.
///
/// Nothing else is touched: no case folding, no percent-decoding, no
/// collapsing of inner `//`.
///
/// ```rust
/// use sprig::path::normalize;
///
/// assert_eq!(normalize("/admin/"), "/admin");
/// assert_eq!(normalize("/admin//"), "/admin");
/// assert_eq!(normalize("/"), "/");
/// assert_eq!(normalize("/a//b"), "/a//b");
/// ```
pub fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && !path.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(normalize("/test/"), "/test");
        assert_eq!(normalize("/admin/dashboard/users/user/"), "/admin/dashboard/users/user");
        assert_eq!(normalize("/test"), "/test");
    }

    #[test]
    fn strips_every_trailing_slash() {
        assert_eq!(normalize("/a//"), "/a");
        assert_eq!(normalize("/a///"), "/a");
        assert_eq!(normalize("a///"), "a");
    }

    #[test]
    fn root_is_kept() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn leaves_everything_else_alone() {
        assert_eq!(normalize("/Admin"), "/Admin");
        assert_eq!(normalize("/a%2Fb/"), "/a%2Fb");
        assert_eq!(normalize("/a//b"), "/a//b");
        assert_eq!(normalize("*"), "*");
    }

    #[test]
    fn is_idempotent_and_never_ends_in_slash() {
        for p in ["", "/", "//", "/a", "/a/", "/a//", "a///", "/x/y/", "*"] {
            let once = normalize(p);
            assert_eq!(normalize(once), once, "not idempotent for {p:?}");
            assert!(once == "/" || !once.ends_with('/'), "trailing slash left for {p:?}");
        }
    }
}
