//! URL normalization against the site's base origin

use url::Url;

use crate::utils::error::FetchError;

/// Resolves payload URLs into absolute links
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    base: Url,
}

impl UrlNormalizer {
    /// Create a normalizer for the given base origin
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if `base` is not an absolute URL
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self { base })
    }

    /// Leave URLs with a scheme untouched; resolve the rest against the base
    ///
    /// Returns `None` only when the value cannot be joined at all.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if has_scheme(raw) {
            return Some(raw.to_string());
        }
        self.base.join(raw).ok().map(String::from)
    }
}

/// True when `raw` starts with `scheme:` followed by `//`
///
/// Absolute links must pass through verbatim. `Url::parse` would
/// re-serialize them (trailing slash, lowercased host) or reject ones with
/// stray spaces.
fn has_scheme(raw: &str) -> bool {
    match raw.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Site root (`scheme://host[:port]/`) of an absolute URL
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` if `url` cannot be parsed
pub fn site_root(url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .join("/")
        .map(String::from)
        .map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> UrlNormalizer {
        UrlNormalizer::new("https://www.europeantour.com").unwrap()
    }

    #[test]
    fn test_relative_path_resolved() {
        assert_eq!(
            normalizer().normalize("/dpworld-tour/news/articles/detail/schneider-wins/"),
            Some("https://www.europeantour.com/dpworld-tour/news/articles/detail/schneider-wins/".to_string())
        );
    }

    #[test]
    fn test_bare_slug_resolved() {
        assert_eq!(
            normalizer().normalize("schneider-wins"),
            Some("https://www.europeantour.com/schneider-wins".to_string())
        );
    }

    #[test]
    fn test_absolute_unchanged() {
        let url = "https://video.example.com/Clip?id=5&x=%20";
        assert_eq!(normalizer().normalize(url), Some(url.to_string()));
    }

    #[test]
    fn test_absolute_not_reserialized() {
        let bare_host = "https://Video.Example.com";
        assert_eq!(normalizer().normalize(bare_host), Some(bare_host.to_string()));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(normalizer().normalize("   "), None);
    }

    #[test]
    fn test_invalid_base() {
        assert!(UrlNormalizer::new("not a url").is_err());
    }

    #[test]
    fn test_site_root() {
        assert_eq!(
            site_root("https://www.europeantour.com/players/x/news?tour=a").unwrap(),
            "https://www.europeantour.com/"
        );
        assert_eq!(
            site_root("http://127.0.0.1:8080/p").unwrap(),
            "http://127.0.0.1:8080/"
        );
    }
}
