//! Object key generation and URL/key normalization.
//!
//! Key format: `{folder}/{name}` when a folder is given, otherwise `{name}`.
//! The name is either the original filename or a random UUID followed by the
//! original extension.

use uuid::Uuid;

use crate::config::ResolvedConfig;

/// Separator used to recover a key from a canonical S3 URL.
const AWS_DOMAIN_SEPARATOR: &str = "amazonaws.com/";

/// Extension of `filename`, including the leading dot.
///
/// A filename without a dot yields `"." + filename`, which is not a real
/// extension. Existing callers rely on the exact output, so it is kept and
/// logged instead of changed.
pub fn get_extension(filename: &str) -> String {
    if !filename.contains('.') {
        tracing::warn!(filename = %filename, "Filename has no extension");
    }
    let extension = filename.rsplit('.').next().unwrap_or(filename);
    format!(".{}", extension)
}

/// Recover the object key from a stored URL, or return the input if it is
/// already a bare key.
///
/// The display URL is tried first, then the canonical `amazonaws.com/` host.
/// A separator only counts when it occurs exactly once.
pub fn get_file_key<'a>(url_or_key: &'a str, display_url: Option<&str>) -> &'a str {
    if let Some(url) = display_url.filter(|url| !url.is_empty()) {
        let separator = format!("{}/", url);
        if let Some(key) = after_single_separator(url_or_key, &separator) {
            return key;
        }
    }

    after_single_separator(url_or_key, AWS_DOMAIN_SEPARATOR).unwrap_or(url_or_key)
}

/// Recover the object key for a delete under the effective configuration.
///
/// Same as [`get_file_key`], with one extra form: when a custom endpoint is
/// configured, the path-style `{endpoint}/{bucket}/` prefix that
/// [`canonical_location`] produces is stripped as well.
pub fn storage_key<'a>(url_or_key: &'a str, config: &ResolvedConfig) -> &'a str {
    let display_url = config.url.as_deref().filter(|url| !url.is_empty());
    if let Some(url) = display_url {
        if let Some(key) = after_single_separator(url_or_key, &format!("{}/", url)) {
            return key;
        }
    }

    if let Some(endpoint) = config.endpoint.as_deref() {
        let prefix = format!("{}/{}/", endpoint.trim_end_matches('/'), config.bucket);
        if let Some(key) = after_single_separator(url_or_key, &prefix) {
            return key;
        }
    }

    get_file_key(url_or_key, None)
}

fn after_single_separator<'a>(haystack: &'a str, separator: &str) -> Option<&'a str> {
    let mut parts = haystack.split(separator);
    parts.next()?;
    let rest = parts.next()?;
    match parts.next() {
        Some(_) => None,
        None => Some(rest),
    }
}

/// Generate the storage key for an upload.
pub fn object_key(folder: Option<&str>, filename: &str, keep_original_filename: bool) -> String {
    let name = if keep_original_filename {
        filename.to_string()
    } else {
        format!("{}{}", Uuid::new_v4(), get_extension(filename))
    };

    match folder.filter(|folder| !folder.is_empty()) {
        Some(folder) => format!("{}/{}", folder, name),
        None => name,
    }
}

/// Canonical host segment of a bucket's virtual-hosted URL.
pub fn canonical_host(bucket: &str, region: &str) -> String {
    format!("{}.s3.{}.amazonaws.com", bucket, region)
}

/// Canonical location of an object as the storage service reports it.
///
/// For AWS S3 this is `https://{bucket}.s3.{region}.amazonaws.com/{key}`. For
/// S3-compatible providers the path-style form `{endpoint}/{bucket}/{key}` is used.
pub fn canonical_location(bucket: &str, region: &str, endpoint: Option<&str>, key: &str) -> String {
    match endpoint {
        Some(endpoint) => {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        }
        None => format!("https://{}/{}", canonical_host(bucket, region), key),
    }
}

/// Map a canonical location to the URL handed back to callers.
///
/// With a display URL configured (and `keep_original_url` off) the canonical
/// host is replaced textually. If the host is not found the location is
/// returned unchanged.
pub fn display_location(location: &str, config: &ResolvedConfig) -> String {
    let url = match config.url.as_deref() {
        Some(url) if !config.keep_original_url => url,
        _ => return location.to_string(),
    };

    let host = canonical_host(&config.bucket, &config.region);
    if location.contains(&host) {
        location.replacen(&host, url, 1)
    } else {
        tracing::warn!(
            location = %location,
            host = %host,
            display_url = %url,
            "Canonical host not found in location, display URL not applied"
        );
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(url: Option<&str>, keep_original_url: bool) -> ResolvedConfig {
        ResolvedConfig {
            region: "us-east-1".to_string(),
            bucket: "bkt".to_string(),
            url: url.map(String::from),
            endpoint: None,
            credentials: None,
            keep_original_filename: false,
            keep_original_url,
        }
    }

    #[test]
    fn extension_uses_last_segment() {
        assert_eq!(get_extension("cat.png"), ".png");
        assert_eq!(get_extension("archive.tar.gz"), ".gz");
        assert_eq!(get_extension(".env"), ".env");
    }

    #[test]
    fn extensionless_filename_keeps_quirk() {
        assert_eq!(get_extension("README"), ".README");
        assert_eq!(get_extension(""), ".");
    }

    #[test]
    fn file_key_from_canonical_url() {
        let url = "https://bkt.s3.us-east-1.amazonaws.com/photos/abc.png";
        assert_eq!(get_file_key(url, None), "photos/abc.png");
    }

    #[test]
    fn file_key_prefers_display_url() {
        let url = "https://cdn.example.com/photos/abc.png";
        assert_eq!(get_file_key(url, Some("cdn.example.com")), "photos/abc.png");
    }

    #[test]
    fn file_key_falls_back_to_aws_separator_when_display_url_absent_from_input() {
        let url = "https://bkt.s3.us-east-1.amazonaws.com/abc.png";
        assert_eq!(get_file_key(url, Some("cdn.example.com")), "abc.png");
    }

    #[test]
    fn file_key_returns_bare_key_unchanged() {
        assert_eq!(get_file_key("photos/abc.png", None), "photos/abc.png");
        assert_eq!(get_file_key("abc.png", Some("cdn.example.com")), "abc.png");
    }

    #[test]
    fn file_key_ignores_repeated_separator() {
        let weird = "https://a.amazonaws.com/b.amazonaws.com/c";
        assert_eq!(get_file_key(weird, None), weird);
    }

    #[test]
    fn file_key_is_idempotent() {
        let inputs = [
            "https://bkt.s3.us-east-1.amazonaws.com/photos/abc.png",
            "https://cdn.example.com/abc.png",
            "plain-key.txt",
        ];
        for input in inputs {
            let once = get_file_key(input, Some("cdn.example.com"));
            let twice = get_file_key(once, Some("cdn.example.com"));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn storage_key_strips_endpoint_and_bucket() {
        let mut config = resolved(None, false);
        config.endpoint = Some("http://localhost:9000/".to_string());

        let location = canonical_location("bkt", "us-east-1", Some("http://localhost:9000/"), "pets/cat.png");
        assert_eq!(storage_key(&location, &config), "pets/cat.png");
        assert_eq!(storage_key("pets/cat.png", &config), "pets/cat.png");
    }

    #[test]
    fn storage_key_without_endpoint_matches_file_key() {
        let config = resolved(Some("cdn.example.com"), false);
        let inputs = [
            "https://bkt.s3.us-east-1.amazonaws.com/a/b.png",
            "https://cdn.example.com/a/b.png",
            "a/b.png",
        ];
        for input in inputs {
            assert_eq!(storage_key(input, &config), get_file_key(input, Some("cdn.example.com")));
        }
    }

    #[test]
    fn object_key_keeps_original_filename() {
        assert_eq!(object_key(Some("docs"), "report.pdf", true), "docs/report.pdf");
        assert_eq!(object_key(None, "report.pdf", true), "report.pdf");
        assert_eq!(object_key(Some(""), "report.pdf", true), "report.pdf");
    }

    #[test]
    fn generated_object_keys_are_unique() {
        let first = object_key(Some("img"), "cat.png", false);
        let second = object_key(Some("img"), "cat.png", false);

        assert_ne!(first, second);
        assert!(first.starts_with("img/"));
        assert!(first.ends_with(".png"));
        let token = first.trim_start_matches("img/").trim_end_matches(".png");
        assert!(Uuid::parse_str(token).is_ok());
    }

    #[test]
    fn canonical_location_formats() {
        assert_eq!(
            canonical_location("bkt", "us-east-1", None, "a/b.png"),
            "https://bkt.s3.us-east-1.amazonaws.com/a/b.png"
        );
        assert_eq!(
            canonical_location("bkt", "us-east-1", Some("http://localhost:9000/"), "b.png"),
            "http://localhost:9000/bkt/b.png"
        );
    }

    #[test]
    fn display_location_rewrites_host() {
        let location = "https://bkt.s3.us-east-1.amazonaws.com/a.png";
        assert_eq!(
            display_location(location, &resolved(Some("cdn.example.com"), false)),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn display_location_verbatim_without_url_or_when_kept() {
        let location = "https://bkt.s3.us-east-1.amazonaws.com/a.png";
        assert_eq!(display_location(location, &resolved(None, false)), location);
        assert_eq!(
            display_location(location, &resolved(Some("cdn.example.com"), true)),
            location
        );
    }

    #[test]
    fn display_location_no_op_on_host_mismatch() {
        let location = "https://other.s3.eu-west-1.amazonaws.com/a.png";
        assert_eq!(
            display_location(location, &resolved(Some("cdn.example.com"), false)),
            location
        );
    }
}
