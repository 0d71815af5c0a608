use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RoutingConfig;

/// Delimiter in preview deployment hosts: `tenant---branch.<preview domain>`
pub const PREVIEW_DELIMITER: &str = "---";

static LOCAL_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"http://([^.]+)\.localhost").expect("local subdomain pattern is valid")
});

/// Extract the tenant token from a request.
///
/// `url` is the full request URL and `host` the raw Host header (possibly with
/// a port). Returns `None` for the root domain, `www`, bare localhost and
/// anything that is not a subdomain of the configured root.
pub fn resolve_subdomain(url: &str, host: Option<&str>, config: &RoutingConfig) -> Option<String> {
    let url = url.to_ascii_lowercase();
    let hostname = host.map(|h| strip_port(h).to_ascii_lowercase()).unwrap_or_default();

    // Local development
    if url.contains("localhost") || url.contains("127.0.0.1") {
        if let Some(captures) = LOCAL_SUBDOMAIN.captures(&url) {
            return captures.get(1).map(|m| m.as_str().to_string());
        }

        if hostname.contains(".localhost") {
            return hostname.split('.').next().map(|label| label.to_string());
        }

        return None;
    }

    if hostname.is_empty() {
        return None;
    }

    // Preview deployments take precedence over plain subdomains
    let preview_suffix = format!(".{}", strip_port(config.preview_domain()).to_ascii_lowercase());
    if hostname.contains(PREVIEW_DELIMITER) && hostname.ends_with(&preview_suffix) {
        return hostname
            .split(PREVIEW_DELIMITER)
            .next()
            .map(|token| token.to_string());
    }

    let root = strip_port(&config.root_domain).to_ascii_lowercase();
    let root_suffix = format!(".{}", root);
    let is_subdomain = hostname != root
        && hostname != format!("www.{}", root)
        && hostname.ends_with(&root_suffix);

    if is_subdomain {
        hostname.strip_suffix(&root_suffix).map(|token| token.to_string())
    } else {
        None
    }
}

/// Drop a trailing `:port`, keeping bracketed IPv6 literals intact
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
