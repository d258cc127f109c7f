use crate::{UrlError, UrlResult};
use url::Url;

/// Parses an absolute http(s) URL to resolve catalog links against
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::parse_base_url;
///
/// let base = parse_base_url("https://catalog.example.com/imppat/").unwrap();
/// assert_eq!(base.path(), "/imppat/");
/// ```
pub fn parse_base_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - hrefs that do not resolve to an http(s) URL
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Composes the conventional URL of an entity page from its display name
///
/// The name is percent-encoded and appended to `entity_path`, which is itself
/// resolved against `base_url`. A `/` inside the name is kept as a path
/// separator.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::{compose_entity_url, parse_base_url};
///
/// let base = parse_base_url("https://catalog.example.com/imppat/").unwrap();
/// let url = compose_entity_url(&base, "imppat/phytochemical/", "Aloe vera").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://catalog.example.com/imppat/imppat/phytochemical/Aloe%20vera"
/// );
/// ```
pub fn compose_entity_url(base_url: &Url, entity_path: &str, name: &str) -> UrlResult<Url> {
    let encoded = name
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    let mut path = entity_path.to_string();
    if !path.is_empty() && !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(&encoded);
    Ok(base_url.join(&path)?)
}
