/// Sites the content script runs on

/// Each entry also covers every subdomain
pub const SUPPORTED_SITES: &[&str] = &[
    "google.com",
    "wordpress.com",
    "wordpress.org",
    "facebook.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "medium.com",
    "substack.com",
    "notion.so",
];

pub fn is_supported_host(hostname: &str) -> bool {
    let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();
    SUPPORTED_SITES.iter().any(|site| {
        hostname == *site
            || hostname
                .strip_suffix(*site)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_hosts() {
        assert!(is_supported_host("docs.google.com"));
        assert!(is_supported_host("google.com"));
        assert!(is_supported_host("creator.substack.com"));
        assert!(is_supported_host("www.notion.so"));
        assert!(is_supported_host("X.com"));
    }

    #[test]
    fn test_unsupported_hosts() {
        assert!(!is_supported_host("github.com"));
        assert!(!is_supported_host("notgoogle.com"));
        assert!(!is_supported_host("google.com.evil.test"));
        assert!(!is_supported_host(""));
    }
}
