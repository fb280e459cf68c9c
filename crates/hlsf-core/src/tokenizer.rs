use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+|[^\w\s]").unwrap());

/// Split text into word runs and single punctuation marks, in order.
/// Case is preserved; no stemming, no stop-word removal.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// True if the token carries at least one ASCII letter or digit.
/// Pure punctuation tokens are not worth asking a generator about.
pub fn is_wordlike(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_alphanumeric())
}
