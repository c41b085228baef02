/// Identifier of a tweet link: everything after the last `/`.
///
/// ```
/// use tweetmill_social::twitter::links::tweet_id;
///
/// assert_eq!(tweet_id("https://x.com/user/status/111"), "111");
/// assert_eq!(tweet_id("222"), "222");
/// ```
pub fn tweet_id(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

/// Identifiers for every non-blank line of a newline-delimited link list,
/// in input order. Lines are trimmed before use.
pub fn parse_tweet_ids(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| tweet_id(line).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_trims() {
        let text = "  https://x.com/user/status/111  \n\n\t\nhttps://twitter.com/other/status/222\r\n";
        assert_eq!(parse_tweet_ids(text), vec!["111", "222"]);
    }

    #[test]
    fn keeps_duplicates_and_order() {
        let text = "https://x.com/a/status/3\nhttps://x.com/b/status/1\nhttps://x.com/a/status/3";
        assert_eq!(parse_tweet_ids(text), vec!["3", "1", "3"]);
    }

    #[test]
    fn trailing_slash_yields_empty_id() {
        assert_eq!(tweet_id("https://x.com/user/status/111/"), "");
    }

    #[test]
    fn empty_input_has_no_ids() {
        assert!(parse_tweet_ids("").is_empty());
        assert!(parse_tweet_ids("\n   \n").is_empty());
    }
}
