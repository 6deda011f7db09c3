//! Known subscription-service domains
//!
//! Used by the browser extension to recognise when the user is on a
//! subscription service's site. Keys are either a bare host (`netflix.com`)
//! or a host plus path prefix (`amazon.com/prime`) for services that share a
//! domain with unrelated products.

use reqwest::Url;
use serde::Serialize;

/// What we know about a recognised service
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDomainInfo {
    pub name: &'static str,
    pub category: &'static str,
    /// Typical monthly price, used when adding from the extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_cost: Option<f64>,
}

/// A URL matched against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMatch {
    /// Catalog key that matched
    pub domain: &'static str,
    #[serde(flatten)]
    pub info: ServiceDomainInfo,
}

const fn info(name: &'static str, category: &'static str, cost: f64) -> ServiceDomainInfo {
    ServiceDomainInfo {
        name,
        category,
        default_cost: Some(cost),
    }
}

pub static SERVICE_DOMAINS: &[(&str, ServiceDomainInfo)] = &[
    ("netflix.com", info("Netflix", "streaming", 15.49)),
    ("spotify.com", info("Spotify", "music", 11.99)),
    ("disneyplus.com", info("Disney+", "streaming", 13.99)),
    ("hulu.com", info("Hulu", "streaming", 17.99)),
    ("max.com", info("HBO Max", "streaming", 15.99)),
    ("apple.com/apple-music", info("Apple Music", "music", 10.99)),
    ("music.youtube.com", info("YouTube Premium", "music", 13.99)),
    ("amazon.com/prime", info("Amazon Prime", "shopping", 14.99)),
    ("adobe.com", info("Adobe Creative Cloud", "productivity", 59.99)),
    ("microsoft365.com", info("Microsoft 365", "productivity", 9.99)),
    ("dropbox.com", info("Dropbox", "cloud-storage", 11.99)),
    ("one.google.com", info("Google One", "cloud-storage", 2.99)),
    ("notion.so", info("Notion", "productivity", 10.00)),
    ("slack.com", info("Slack", "productivity", 8.75)),
    ("zoom.us", info("Zoom", "productivity", 13.33)),
    ("openai.com", info("ChatGPT Plus", "ai", 20.00)),
    ("github.com", info("GitHub Pro", "development", 4.00)),
    ("figma.com", info("Figma", "design", 15.00)),
    ("canva.com", info("Canva Pro", "design", 12.99)),
    ("crunchyroll.com", info("Crunchyroll", "streaming", 7.99)),
    ("twitch.tv", info("Twitch", "streaming", 8.99)),
    ("linkedin.com/premium", info("LinkedIn Premium", "professional", 29.99)),
    ("grammarly.com", info("Grammarly", "productivity", 12.00)),
    ("nordvpn.com", info("NordVPN", "security", 12.99)),
    ("1password.com", info("1Password", "security", 2.99)),
];

/// Whether `host` is `key` or a subdomain of it
fn host_matches(host: &str, key: &str) -> bool {
    host == key
        || host
            .strip_suffix(key)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Match a page URL against the service catalog
///
/// Path-qualified keys are tried before bare hosts so that
/// `amazon.com/prime` wins over any future `amazon.com` entry. Returns `None`
/// for unparseable or host-less URLs.
pub fn match_domain(url: &str) -> Option<DomainMatch> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = parsed.path();

    let with_path = SERVICE_DOMAINS.iter().find(|(key, _)| {
        key.split_once('/').is_some_and(|(key_host, key_path)| {
            host_matches(host, key_host)
                && path
                    .strip_prefix('/')
                    .is_some_and(|p| p.starts_with(key_path))
        })
    });

    let found = with_path.or_else(|| {
        SERVICE_DOMAINS
            .iter()
            .find(|(key, _)| !key.contains('/') && host_matches(host, key))
    });

    found.map(|&(domain, info)| DomainMatch {
        domain,
        info,
    })
}

/// Note attached to subscriptions added from the extension
pub fn extension_note(domain: &str) -> String {
    format!("Added via browser extension (detected on {})", domain)
}
