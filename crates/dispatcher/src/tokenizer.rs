//! Quote-aware command tokenizer.

/// Split command text into tokens, the first being the command name.
///
/// Text is split on single spaces. A token starting with `"` opens a quoted
/// argument that runs up to the first token ending with `"`; the pieces are
/// rejoined with spaces and the outer quotes removed. Doubled quotes (`""`)
/// never open or close a quote. An opening quote that is never closed is
/// kept as plain tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split(' ').collect();
    let mut tokens = Vec::with_capacity(words.len());

    let mut i = 0;
    while i < words.len() {
        if opens_quote(words[i]) {
            if let Some(end) = (i..words.len()).find(|&j| closes_quote(words[j])) {
                tokens.push(unquote(&words[i..=end].join(" ")));
                i = end + 1;
                continue;
            }
        }

        tokens.push(words[i].to_string());
        i += 1;
    }

    tokens
}

fn opens_quote(word: &str) -> bool {
    word.starts_with('"') && !word.starts_with("\"\"")
}

fn closes_quote(word: &str) -> bool {
    word.ends_with('"') && !word.ends_with("\"\"")
}

fn unquote(joined: &str) -> String {
    let inner = joined.strip_prefix('"').unwrap_or(joined);
    inner.strip_suffix('"').unwrap_or(inner).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(tokenize("ping"), vec!["ping"]);
        assert_eq!(tokenize("roll 2 d6"), vec!["roll", "2", "d6"]);
    }

    #[test]
    fn test_quoted_argument() {
        assert_eq!(tokenize(r#"cmd "a b" c"#), vec!["cmd", "a b", "c"]);
        assert_eq!(
            tokenize(r#"yt search "dance gavin dance" "bloodsucker""#),
            vec!["yt", "search", "dance gavin dance", "bloodsucker"]
        );
    }

    #[test]
    fn test_quoted_whitespace_preserved() {
        assert_eq!(tokenize(r#"say "a  b""#), vec!["say", "a  b"]);
    }

    #[test]
    fn test_unterminated_quote_kept_literal() {
        assert_eq!(tokenize(r#"cmd "a b"#), vec!["cmd", "\"a", "b"]);
        assert_eq!(tokenize(r#"cmd x "y"#), vec!["cmd", "x", "\"y"]);
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        assert_eq!(tokenize(r#"say "" hi"#), vec!["say", "\"\"", "hi"]);
        assert_eq!(tokenize(r#"say ""a b"#), vec!["say", "\"\"a", "b"]);
    }

    #[test]
    fn test_doubled_quote_does_not_close() {
        assert_eq!(tokenize(r#"say "a b"" c""#), vec!["say", "a b\"\" c"]);
    }

    #[test]
    fn test_empty_and_repeated_spaces() {
        assert_eq!(tokenize(""), vec![""]);
        assert_eq!(tokenize("a  b"), vec!["a", "", "b"]);
    }
}
