//! Client identity profiles and browser-like request headers
//!
//! Each fetch strategy owns a fixed pool of [`Fingerprint`]s. One is drawn
//! at random per attempt and used for both the warm-up and the target
//! request, so the pair looks like a single browser session.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL,
    PRAGMA, REFERER, USER_AGENT,
};

/// Browser family a profile imitates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chromium,
    Firefox,
    Safari,
}

/// A client identity: user agent plus the headers that browser sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    /// Short profile name, recorded in the attempt ledger
    pub name: &'static str,
    pub family: BrowserFamily,
    pub user_agent: &'static str,
    /// `sec-ch-ua` brand list; Chromium only
    pub client_hints: Option<&'static str>,
    /// `sec-ch-ua-platform` value; Chromium only
    pub platform: Option<&'static str>,
    pub accept_language: &'static str,
}

/// Profiles for the primary client: full Chromium shapes with client hints
pub const PRIMARY_FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint {
        name: "chrome-124-windows",
        family: BrowserFamily::Chromium,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        client_hints: Some(r#""Chromium";v="124", "Google Chrome";v="124", "Not-A.Brand";v="99""#),
        platform: Some(r#""Windows""#),
        accept_language: "en-US,en;q=0.9",
    },
    Fingerprint {
        name: "chrome-123-macos",
        family: BrowserFamily::Chromium,
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        client_hints: Some(r#""Google Chrome";v="123", "Not:A-Brand";v="8", "Chromium";v="123""#),
        platform: Some(r#""macOS""#),
        accept_language: "en-GB,en;q=0.9",
    },
    Fingerprint {
        name: "edge-124-windows",
        family: BrowserFamily::Chromium,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
        client_hints: Some(r#""Chromium";v="124", "Microsoft Edge";v="124", "Not-A.Brand";v="99""#),
        platform: Some(r#""Windows""#),
        accept_language: "en-US,en;q=0.9,de;q=0.8",
    },
];

/// Profiles for the fallback client: desktop browsers without client hints
pub const FALLBACK_FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint {
        name: "firefox-125-windows",
        family: BrowserFamily::Firefox,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        client_hints: None,
        platform: None,
        accept_language: "en-US,en;q=0.5",
    },
    Fingerprint {
        name: "firefox-124-linux",
        family: BrowserFamily::Firefox,
        user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
        client_hints: None,
        platform: None,
        accept_language: "en-GB,en;q=0.5",
    },
    Fingerprint {
        name: "safari-17-macos",
        family: BrowserFamily::Safari,
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        client_hints: None,
        platform: None,
        accept_language: "en-GB,en;q=0.9",
    },
];

/// Build navigation headers for `fingerprint`
///
/// `referer` is set on the target request (pointing at the site root the
/// warm-up visited) and omitted on the warm-up itself.
pub fn build_browser_headers(fingerprint: &Fingerprint, referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, HeaderValue::from_static(fingerprint.user_agent));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(match fingerprint.family {
            BrowserFamily::Chromium => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
            }
            BrowserFamily::Firefox => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            }
            BrowserFamily::Safari => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        }),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(fingerprint.accept_language),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    if let (Some(hints), Some(platform)) = (fingerprint.client_hints, fingerprint.platform) {
        headers.insert(HeaderName::from_static("sec-ch-ua"), HeaderValue::from_static(hints));
        headers.insert(
            HeaderName::from_static("sec-ch-ua-mobile"),
            HeaderValue::from_static("?0"),
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua-platform"),
            HeaderValue::from_static(platform),
        );
    }

    // Sec-Fetch headers for a top-level navigation
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static(if referer.is_some() { "same-origin" } else { "none" }),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    if let Some(referer_value) = referer.and_then(|r| HeaderValue::from_str(r).ok()) {
        headers.insert(REFERER, referer_value);
    }

    headers
}
