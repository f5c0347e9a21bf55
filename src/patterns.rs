/// URL match patterns for the chat sites the dashboard broadcasts into
use url::Url;

/// Test a URL against a `scheme://host/path` match pattern.
///
/// Only the subset the extension needs is supported:
/// - scheme `*` matches any scheme, anything else must be equal
/// - host `*` matches any host, anything else must equal the URL's host (with port, if any)
/// - the path part is ignored
///
/// Unparseable URLs and malformed patterns never match.
///
/// Examples:
/// - `*://chatgpt.com/*` vs `https://chatgpt.com/c/123` → true
/// - `*://chatgpt.com/*` vs `https://notchatgpt.com/` → false
/// - `*://chatgpt.com/*` vs `ftp://chatgpt.com/` → true
pub fn match_pattern(pattern: &str, url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some((scheme_part, rest)) = pattern.split_once("://") else {
        return false;
    };
    let host_pattern = rest.split('/').next().unwrap_or_default();

    if scheme_part != "*" && scheme_part != parsed.scheme() {
        return false;
    }

    host_pattern == "*" || host_pattern == url_host(&parsed)
}

/// Host as `location.host` reports it: hostname plus an explicit port
fn url_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// True if the URL matches any of the patterns
pub fn matches_any<S: AsRef<str>>(patterns: &[S], url: &str) -> bool {
    patterns.iter().any(|p| match_pattern(p.as_ref(), url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CHAT_PATTERNS;

    #[test]
    fn test_match_pattern_basic() {
        assert!(match_pattern("*://chatgpt.com/*", "https://chatgpt.com/c/123"));
        assert!(match_pattern("*://chatgpt.com/*", "http://chatgpt.com/"));
    }

    #[test]
    fn test_match_pattern_rejects_other_hosts() {
        assert!(!match_pattern("*://chatgpt.com/*", "https://notchatgpt.com/"));
        assert!(!match_pattern("*://chatgpt.com/*", "https://www.chatgpt.com/"));
        assert!(!match_pattern("*://claude.ai/*", "https://chatgpt.com/"));
    }

    #[test]
    fn test_match_pattern_scheme_wildcard() {
        assert!(match_pattern("*://chatgpt.com/*", "ftp://chatgpt.com/"));
    }

    #[test]
    fn test_match_pattern_exact_scheme() {
        assert!(match_pattern("https://claude.ai/*", "https://claude.ai/new"));
        assert!(!match_pattern("https://claude.ai/*", "http://claude.ai/new"));
    }

    #[test]
    fn test_match_pattern_host_wildcard() {
        assert!(match_pattern("https://*/*", "https://example.org/anything"));
        assert!(!match_pattern("https://*/*", "http://example.org/"));
    }

    #[test]
    fn test_match_pattern_port_is_part_of_host() {
        assert!(!match_pattern("*://localhost/*", "http://localhost:3000/"));
        assert!(match_pattern("*://localhost:3000/*", "http://localhost:3000/chat"));
    }

    #[test]
    fn test_match_pattern_ignores_path() {
        assert!(match_pattern("*://grok.com/chat", "https://grok.com/other/page"));
    }

    #[test]
    fn test_match_pattern_invalid_inputs() {
        assert!(!match_pattern("*://chatgpt.com/*", "not a url"));
        assert!(!match_pattern("*://chatgpt.com/*", ""));
        assert!(!match_pattern("chatgpt.com", "https://chatgpt.com/"));
    }

    #[test]
    fn test_matches_any_default_patterns() {
        assert!(matches_any(&DEFAULT_CHAT_PATTERNS, "https://gemini.google.com/app"));
        assert!(matches_any(&DEFAULT_CHAT_PATTERNS, "https://chat.deepseek.com/"));
        assert!(!matches_any(&DEFAULT_CHAT_PATTERNS, "https://google.com/"));
        assert!(!matches_any(&DEFAULT_CHAT_PATTERNS, "chrome://extensions"));
    }
}
