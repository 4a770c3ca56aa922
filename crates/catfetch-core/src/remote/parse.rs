//! Parse HTTP response header lines into ChangeIdentifiers.

use super::ChangeIdentifiers;

/// Parse collected header lines into ChangeIdentifiers.
///
/// With redirects followed, lines from several responses arrive in order;
/// each status line starts a new block so only the final response counts.
pub(crate) fn parse_headers(lines: &[String]) -> ChangeIdentifiers {
    let mut ids = ChangeIdentifiers::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            ids = ChangeIdentifiers::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if name.eq_ignore_ascii_case("etag") {
                ids.etag = opaque_tag(value);
            } else if name.eq_ignore_ascii_case("last-modified") {
                ids.last_modified = Some(value.to_string());
            }
        }
    }

    ids
}

/// Opaque part of an entity tag: `W/"abc"` and `"abc"` both give `abc`.
/// Change detection uses weak comparison, so the weakness flag is dropped.
fn opaque_tag(value: &str) -> Option<String> {
    let value = value
        .strip_prefix("W/")
        .or_else(|| value.strip_prefix("w/"))
        .unwrap_or(value);
    let tag = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    (!tag.is_empty()).then(|| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_etag_and_last_modified() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "ETag: \"abc-123\"",
            "Last-Modified: Wed, 21 Oct 2015 07:28:00 GMT",
        ]));
        assert_eq!(r.etag.as_deref(), Some("abc-123"));
        assert_eq!(
            r.last_modified.as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn parse_headers_case_insensitive_and_missing() {
        let r = parse_headers(&lines(&["etag: v7", "Content-Length: 10"]));
        assert_eq!(r.etag.as_deref(), Some("v7"));
        assert!(r.last_modified.is_none());
    }

    #[test]
    fn parse_headers_keeps_only_final_response() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "ETag: \"redirect-tag\"",
            "Location: /real.csv",
            "",
            "HTTP/1.1 200 OK",
            "Last-Modified: Thu, 01 Jan 2026 00:00:00 GMT",
        ]));
        assert!(r.etag.is_none());
        assert_eq!(
            r.last_modified.as_deref(),
            Some("Thu, 01 Jan 2026 00:00:00 GMT")
        );
    }

    #[test]
    fn weak_etag_keeps_its_opaque_part() {
        let weak = parse_headers(&lines(&["HTTP/1.1 200 OK", "ETag: W/\"abc\""]));
        assert_eq!(weak.etag.as_deref(), Some("abc"));
        let strong = parse_headers(&lines(&["HTTP/1.1 200 OK", "ETag: \"abc\""]));
        assert_eq!(weak, strong);
        let empty = parse_headers(&lines(&["ETag: \"\""]));
        assert!(empty.etag.is_none());
    }
}
