/// URL detection and in-place substitution within a text run
use regex::Regex;
use std::sync::LazyLock;

/// `http(s)://` followed by anything up to the next whitespace
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url pattern is valid"));

pub fn contains_url(text: &str) -> bool {
    URL_PATTERN.is_match(text)
}

/// Every URL-looking substring, in order of appearance
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Replace the first occurrence of `original` that is a whole URL token.
///
/// A token ends at whitespace or the end of the text, so a URL that is a
/// prefix of an already rewritten one is never matched inside it. Returns
/// `None` when no such occurrence remains.
pub fn replace_url(text: &str, original: &str, replacement: &str) -> Option<String> {
    if original.is_empty() {
        return None;
    }

    let (start, _) = text.match_indices(original).find(|(start, matched)| {
        text[start + matched.len()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
    })?;

    let mut updated = String::with_capacity(text.len() + replacement.len());
    updated.push_str(&text[..start]);
    updated.push_str(replacement);
    updated.push_str(&text[start + original.len()..]);
    Some(updated)
}
