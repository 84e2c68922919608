//! Validators for inputs crossing from the management surface into the
//! pipeline's data model, including the SSRF guard for webhook URLs.

use std::net::{IpAddr, ToSocketAddrs};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CoreError, Result};

pub const MAX_PHRASE_LENGTH: usize = 200;
pub const MAX_EXCLUSION_LENGTH: usize = 100;
pub const MAX_RULE_PHRASES: usize = 20;
pub const MAX_RULE_EXCLUSIONS: usize = 20;

static COMMUNITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,50}$").expect("community regex"));

/// Validate and clean a community name.
///
/// Strips whitespace and an optional `r/` prefix, lowercases, and
/// requires `[A-Za-z0-9_]{1,50}`.
pub fn validate_community_name(name: &str) -> Result<String> {
    let mut name = name.trim().to_lowercase();
    if let Some(stripped) = name.strip_prefix("r/") {
        name = stripped.to_string();
    }

    if name.is_empty() {
        return Err(CoreError::InvalidCommunity("name cannot be empty".into()));
    }
    if !COMMUNITY_RE.is_match(&name) {
        return Err(CoreError::InvalidCommunity(
            "name must contain only letters, numbers, and underscores (max 50 chars)".into(),
        ));
    }
    Ok(name)
}

/// Validate a webhook URL against the configured allow pattern.
///
/// Checks scheme and pattern only; callers that accept URLs from the
/// outside must also pass the hostname through [`check_host_addresses`].
pub fn validate_webhook_url(url: &str, allow_pattern: &Regex) -> Result<String> {
    let url = url.trim().to_string();

    if !url.starts_with("https://") {
        return Err(CoreError::InvalidWebhookUrl("must use HTTPS".into()));
    }
    if !allow_pattern.is_match(&url) {
        return Err(CoreError::InvalidWebhookUrl(
            "does not match the accepted provider pattern".into(),
        ));
    }
    Ok(url)
}

/// Resolve the URL's hostname and reject private or internal addresses.
pub fn check_host_addresses(raw_url: &str) -> Result<()> {
    let parsed = url::Url::parse(raw_url)
        .map_err(|e| CoreError::InvalidWebhookUrl(format!("unparseable URL: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| CoreError::InvalidWebhookUrl("URL has no host".into()))?;
    let port = parsed.port().unwrap_or(443);

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|_| CoreError::InvalidWebhookUrl("could not resolve hostname".into()))?;

    for addr in addrs {
        if is_forbidden_addr(addr.ip()) {
            return Err(CoreError::InvalidWebhookUrl(
                "must not point to a private or internal address".into(),
            ));
        }
    }
    Ok(())
}

/// True for addresses a webhook must never target: loopback, RFC-1918
/// private, link-local, unspecified, broadcast, documentation ranges,
/// and IPv6 unique-local.
pub fn is_forbidden_addr(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
        }
        IpAddr::V6(v6) => {
            // fc00::/7 (unique-local) and fe80::/10 (link-local)
            let seg = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (seg & 0xfe00) == 0xfc00
                || (seg & 0xffc0) == 0xfe80
        }
    }
}

/// Validate and clean keyword phrases: at most [`MAX_RULE_PHRASES`]
/// entries, each non-empty after sanitizing and at most
/// [`MAX_PHRASE_LENGTH`] chars.
pub fn validate_phrases(phrases: &[String]) -> Result<Vec<String>> {
    if phrases.is_empty() {
        return Err(CoreError::InvalidRule("at least one phrase is required".into()));
    }
    if phrases.len() > MAX_RULE_PHRASES {
        return Err(CoreError::InvalidRule(format!(
            "maximum {MAX_RULE_PHRASES} phrases allowed"
        )));
    }

    let mut cleaned = Vec::with_capacity(phrases.len());
    for p in phrases {
        let p = sanitize(p);
        if p.is_empty() {
            continue;
        }
        if p.chars().count() > MAX_PHRASE_LENGTH {
            return Err(CoreError::InvalidRule(format!(
                "phrase exceeds maximum length of {MAX_PHRASE_LENGTH} characters"
            )));
        }
        cleaned.push(p);
    }

    if cleaned.is_empty() {
        return Err(CoreError::InvalidRule(
            "at least one non-empty phrase is required".into(),
        ));
    }
    Ok(cleaned)
}

/// Validate and clean exclusion terms.
pub fn validate_exclusions(exclusions: &[String]) -> Result<Vec<String>> {
    if exclusions.len() > MAX_RULE_EXCLUSIONS {
        return Err(CoreError::InvalidRule(format!(
            "maximum {MAX_RULE_EXCLUSIONS} exclusions allowed"
        )));
    }

    let mut cleaned = Vec::with_capacity(exclusions.len());
    for e in exclusions {
        let e = sanitize(e);
        if e.is_empty() {
            continue;
        }
        if e.chars().count() > MAX_EXCLUSION_LENGTH {
            return Err(CoreError::InvalidRule(format!(
                "exclusion term exceeds maximum length of {MAX_EXCLUSION_LENGTH} characters"
            )));
        }
        cleaned.push(e);
    }
    Ok(cleaned)
}

/// Strip whitespace and angle brackets.
fn sanitize(value: &str) -> String {
    value.trim().replace(['<', '>'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_name_strips_prefix_and_lowercases() {
        assert_eq!(validate_community_name("r/SportsBook").unwrap(), "sportsbook");
        assert_eq!(validate_community_name("  Wallstreetbets  ").unwrap(), "wallstreetbets");
    }

    #[test]
    fn community_name_rejects_bad_chars() {
        assert!(validate_community_name("").is_err());
        assert!(validate_community_name("r/").is_err());
        assert!(validate_community_name("has spaces").is_err());
        assert!(validate_community_name("semi;colon").is_err());
        assert!(validate_community_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn webhook_url_requires_https_and_pattern() {
        let pattern = Regex::new(r"^https://discord(?:app)?\.com/api/webhooks/\d+/[\w-]+$").unwrap();
        assert!(validate_webhook_url(
            "https://discord.com/api/webhooks/123456/abc_DEF-789",
            &pattern
        )
        .is_ok());
        assert!(validate_webhook_url("http://discord.com/api/webhooks/1/a", &pattern).is_err());
        assert!(validate_webhook_url("https://example.com/hook", &pattern).is_err());
    }

    #[test]
    fn forbidden_addresses() {
        assert!(is_forbidden_addr("127.0.0.1".parse().unwrap()));
        assert!(is_forbidden_addr("10.1.2.3".parse().unwrap()));
        assert!(is_forbidden_addr("192.168.0.10".parse().unwrap()));
        assert!(is_forbidden_addr("169.254.1.1".parse().unwrap()));
        assert!(is_forbidden_addr("0.0.0.0".parse().unwrap()));
        assert!(is_forbidden_addr("::1".parse().unwrap()));
        assert!(is_forbidden_addr("fc00::1".parse().unwrap()));
        assert!(is_forbidden_addr("fe80::1".parse().unwrap()));
        assert!(!is_forbidden_addr("162.159.128.233".parse().unwrap()));
        assert!(!is_forbidden_addr("2606:4700::1".parse().unwrap()));
    }

    #[test]
    fn phrases_sanitized_and_capped() {
        let ok = validate_phrases(&["  arbitrage betting ".into(), "<b>promo</b>".into()]).unwrap();
        assert_eq!(ok, vec!["arbitrage betting".to_string(), "bpromo/b".to_string()]);

        assert!(validate_phrases(&[]).is_err());
        assert!(validate_phrases(&vec!["x".to_string(); 21]).is_err());
        assert!(validate_phrases(&["y".repeat(201)]).is_err());
        assert!(validate_phrases(&["   ".into()]).is_err());
    }

    #[test]
    fn exclusions_capped() {
        assert!(validate_exclusions(&vec!["x".to_string(); 21]).is_err());
        assert!(validate_exclusions(&["z".repeat(101)]).is_err());
        let ok = validate_exclusions(&["scam".into(), "  ".into()]).unwrap();
        assert_eq!(ok, vec!["scam".to_string()]);
    }
}
