use chrono::{TimeDelta, Utc};
use http::header::{COOKIE, HeaderMap, HeaderValue};

use super::types::SessionOptions;
use crate::errors::SessionError;

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

/// cookie-octet of RFC 6265
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// token of RFC 7230
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Find the value of cookie `name` in the request headers.
///
/// `Ok(None)` when no such cookie was sent. A header that is not valid UTF-8 or
/// a value outside the cookie-octet set is an error, not an absent cookie.
pub(crate) fn session_id_from_headers(
    headers: &HeaderMap,
    name: &str,
) -> Result<Option<String>, SessionError> {
    for cookie_header in headers.get_all(COOKIE) {
        let cookie_str = cookie_header
            .to_str()
            .map_err(|_| SessionError::Cookie("Invalid cookie header".to_string()))?;

        let found = cookie_str.split(';').map(|s| s.trim()).find_map(|s| {
            let mut parts = s.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(k), Some(v)) if k.trim() == name => Some(v.trim()),
                _ => None,
            }
        });

        if let Some(value) = found {
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            if !value.bytes().all(is_cookie_octet) {
                return Err(SessionError::Cookie(format!(
                    "Malformed value for cookie '{name}'"
                )));
            }
            return Ok(Some(value.to_string()));
        }
    }

    tracing::trace!("No cookie '{}' in request", name);
    Ok(None)
}

/// Render a `Set-Cookie` header value from the session options.
pub(crate) fn set_cookie_value(
    name: &str,
    value: &str,
    options: &SessionOptions,
) -> Result<HeaderValue, SessionError> {
    if name.is_empty() || !name.bytes().all(is_token_char) {
        return Err(SessionError::Cookie(format!("Invalid cookie name '{name}'")));
    }
    if !value.bytes().all(is_cookie_octet) {
        return Err(SessionError::Cookie(format!(
            "Invalid value for cookie '{name}'"
        )));
    }

    let mut cookie = format!("{name}={value}");
    if !options.path.is_empty() {
        cookie.push_str(&format!("; Path={}", options.path));
    }
    if let Some(domain) = &options.domain {
        cookie.push_str(&format!("; Domain={domain}"));
    }
    if options.max_age > 0 {
        let expires = TimeDelta::try_seconds(options.max_age)
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        if let Some(expires) = expires {
            cookie.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        cookie.push_str(&format!("; Max-Age={}", options.max_age));
    } else if options.max_age < 0 {
        cookie.push_str(&format!("; Expires={EXPIRED}; Max-Age=0"));
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str(&format!("; SameSite={}", same_site.as_str()));
    }

    cookie
        .parse()
        .map_err(|_| SessionError::Cookie("Failed to build Set-Cookie header".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::SameSite;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for v in values {
            headers.append(COOKIE, v.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_no_cookie_header() {
        assert_eq!(session_id_from_headers(&HeaderMap::new(), "sid").unwrap(), None);
    }

    #[test]
    fn test_other_cookie_only() {
        let headers = headers(&["theme=dark; lang=en"]);
        assert_eq!(session_id_from_headers(&headers, "sid").unwrap(), None);
    }

    #[test]
    fn test_finds_cookie_among_others() {
        let headers = headers(&["theme=dark; sid=abc-123; lang=en"]);
        assert_eq!(
            session_id_from_headers(&headers, "sid").unwrap(),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_finds_cookie_in_second_header() {
        let headers = headers(&["theme=dark", "sid=abc"]);
        assert_eq!(
            session_id_from_headers(&headers, "sid").unwrap(),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_quoted_value_is_unwrapped() {
        let headers = headers(&["sid=\"abc\""]);
        assert_eq!(
            session_id_from_headers(&headers, "sid").unwrap(),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let headers = headers(&["sid=a\\b"]);
        assert!(matches!(
            session_id_from_headers(&headers, "sid"),
            Err(SessionError::Cookie(_))
        ));
    }

    #[test]
    fn test_non_utf8_header_is_an_error() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_bytes(b"sid=\xff").unwrap());
        assert!(matches!(
            session_id_from_headers(&headers, "sid"),
            Err(SessionError::Cookie(_))
        ));
    }

    #[test]
    fn test_set_cookie_with_all_attributes() {
        let options = SessionOptions {
            path: "/app".to_string(),
            domain: Some("example.com".to_string()),
            max_age: 3600,
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Lax),
        };

        let value = set_cookie_value("sid", "abc", &options).unwrap();
        let value = value.to_str().unwrap();

        assert!(value.starts_with("sid=abc; Path=/app; Domain=example.com; Expires="));
        assert!(value.ends_with("GMT; Max-Age=3600; HttpOnly; Secure; SameSite=Lax"));
    }

    #[test]
    fn test_set_cookie_session_lifetime() {
        let options = SessionOptions {
            max_age: 0,
            ..SessionOptions::default()
        };
        let value = set_cookie_value("sid", "abc", &options).unwrap();
        assert_eq!(value.to_str().unwrap(), "sid=abc; Path=/");
    }

    #[test]
    fn test_set_cookie_deletion() {
        let options = SessionOptions {
            max_age: -1,
            ..SessionOptions::default()
        };
        let value = set_cookie_value("sid", "", &options).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "sid=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT; Max-Age=0"
        );
    }

    #[test]
    fn test_set_cookie_rejects_bad_name_and_value() {
        let options = SessionOptions::default();
        assert!(set_cookie_value("s id", "abc", &options).is_err());
        assert!(set_cookie_value("", "abc", &options).is_err());
        assert!(set_cookie_value("sid", "a;b", &options).is_err());
    }
}
