use once_cell::sync::Lazy;
use regex::Regex;

static STATUS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:twitter\.com|x\.com)/\w+/status/(\d+)").expect("tweet status url pattern")
});

/// Extract the numeric status id from a twitter.com or x.com tweet URL.
pub fn parse(url: &str) -> Option<String> {
    STATUS_URL
        .captures(url)
        .map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::parse;

    #[test_case("https://twitter.com/someuser/status/1234567890", "1234567890"; "twitter host")]
    #[test_case("https://x.com/someuser/status/987", "987"; "x host")]
    #[test_case("https://www.twitter.com/a_b/status/55?s=20", "55"; "query string ignored")]
    fn parse_extracts_status_id(url: &str, expected: &str) {
        assert_eq!(parse(url).as_deref(), Some(expected));
    }

    #[test_case("https://twitter.com/someuser"; "no status segment")]
    #[test_case("https://x.com/someuser/status/"; "missing id")]
    #[test_case("https://example.com/u/status/123"; "foreign host")]
    #[test_case(""; "empty url")]
    fn parse_rejects_unrecognized_urls(url: &str) {
        assert!(parse(url).is_none());
    }
}
