// src/utils/url.rs

//! URL manipulation utilities.

use url::{Host, Url};

/// Append a candidate feed path to a blog base URL.
///
/// # Examples
/// ```
/// use friend_circle::utils::url::join_feed_path;
///
/// assert_eq!(
///     join_feed_path("https://example.com/", "/atom.xml"),
///     "https://example.com/atom.xml"
/// );
/// ```
pub fn join_feed_path(blog_url: &str, path: &str) -> String {
    format!("{}{}", blog_url.trim_end_matches('/'), path)
}

/// Rewrite an entry link that points at a non-public host onto the blog's
/// own address.
///
/// Links whose host is `localhost`, a loopback address or a bare IPv4
/// address keep their path and query but move under `blog_url`. Links with a
/// real hostname are returned untouched, whatever their scheme. Relative
/// links are resolved against `blog_url`.
pub fn sanitize_link(link: &str, blog_url: &str) -> String {
    let parsed = match Url::parse(link) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Url::parse(blog_url)
                .and_then(|base| base.join(link))
                .map(String::from)
                .unwrap_or_else(|_| link.to_string());
        }
        Err(e) => {
            log::warn!("Keeping unparseable link {link}: {e}");
            return link.to_string();
        }
    };

    if !is_private_host(&parsed) {
        return link.to_string();
    }

    let mut path = parsed.path().trim_start_matches('/').to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }

    let base = format!("{}/", blog_url.trim_end_matches('/'));
    match Url::parse(&base).and_then(|b| b.join(&path)) {
        Ok(rebuilt) => rebuilt.to_string(),
        Err(e) => {
            log::warn!("Cannot rebase link {link} onto {blog_url}: {e}");
            link.to_string()
        }
    }
}

fn is_private_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(_)) => true,
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        None => false,
    }
}
