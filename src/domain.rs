/// Site grouping for conversion sources
use url::Url;

/// The site a conversion came from, so `docs.google.com` and `mail.google.com`
/// are counted together. Country second-level domains such as `co.uk` keep
/// one extra label; `localhost` and IP addresses pass through unchanged.
pub fn site_of(host_or_url: &str) -> Option<String> {
    let hostname = hostname_of(host_or_url)?;

    if hostname == "localhost" || is_ip_address(&hostname) {
        return Some(hostname);
    }

    let parts: Vec<&str> = hostname.split('.').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return Some(hostname);
    }

    let tld = parts[parts.len() - 1];
    let second_level = parts[parts.len() - 2];
    let keep = if parts.len() >= 3 && tld.len() == 2 && matches!(second_level, "co" | "com") {
        3
    } else {
        2
    };

    Some(parts[parts.len() - keep..].join("."))
}

fn hostname_of(host_or_url: &str) -> Option<String> {
    let trimmed = host_or_url.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains("://") {
        let parsed = Url::parse(trimmed).ok()?;
        return parsed.host_str().map(|h| h.to_lowercase());
    }

    // Bare host, possibly with a port
    let hostname = trimmed.split(':').next()?.to_lowercase();
    if hostname.is_empty() { None } else { Some(hostname) }
}

/// Check if a string looks like an IPv4 address
fn is_ip_address(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}
