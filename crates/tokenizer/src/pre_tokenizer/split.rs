//! Text splitting for pre-tokenization.
//!
//! Normalized text is split on spaces into words. Inside a word, every
//! punctuation or symbol character stands alone and any other maximal run
//! is one pre-token. The first pre-token of each word carries the word
//! marker, which is how decoding knows where spaces go.

use regex::Regex;
use shabd_core::WORD_MARKER;
use std::sync::OnceLock;

fn pre_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\p{P}\p{S}]|[^\p{P}\p{S}]+").expect("pre-token pattern is valid")
    })
}

/// Text splitter for pre-tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    /// Prefix the first pre-token of every word with the word marker
    word_marker: bool,
}

impl Splitter {
    /// Create a splitter that marks word starts.
    pub fn new() -> Self {
        Self { word_marker: true }
    }

    /// Create a splitter that leaves word starts unmarked.
    ///
    /// Boost seeds are split this way so they reinforce pairs wherever the
    /// seed occurs, not only at word starts.
    pub fn without_marker() -> Self {
        Self { word_marker: false }
    }

    /// Split normalized text into pre-tokens.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut pre_tokens = Vec::new();
        self.for_each_pre_token(text, |piece| pre_tokens.push(piece.to_string()));
        pre_tokens
    }

    /// Visit each pre-token without collecting them.
    ///
    /// The callback borrows a scratch buffer, so it must copy what it keeps.
    pub fn for_each_pre_token<F>(&self, text: &str, mut f: F)
    where
        F: FnMut(&str),
    {
        let mut buf = String::new();

        for word in text.split(' ').filter(|w| !w.is_empty()) {
            for (i, m) in pre_token_regex().find_iter(word).enumerate() {
                if i == 0 && self.word_marker {
                    buf.clear();
                    buf.push(WORD_MARKER);
                    buf.push_str(m.as_str());
                    f(&buf);
                } else {
                    f(m.as_str());
                }
            }
        }
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_marked() {
        let splitter = Splitter::new();
        let result = splitter.split("नमस्ते दुनिया");
        assert_eq!(result, vec!["\u{2581}नमस्ते", "\u{2581}दुनिया"]);
    }

    #[test]
    fn test_punctuation_stands_alone() {
        let splitter = Splitter::new();
        let result = splitter.split("नमस्ते, दुनिया!!");
        assert_eq!(
            result,
            vec!["\u{2581}नमस्ते", ",", "\u{2581}दुनिया", "!", "!"]
        );
    }

    #[test]
    fn test_leading_punctuation_gets_marker() {
        let splitter = Splitter::new();
        let result = splitter.split("\"हाँ\" ।");
        assert_eq!(result, vec!["\u{2581}\"", "हाँ", "\"", "\u{2581}।"]);
    }

    #[test]
    fn test_without_marker() {
        let splitter = Splitter::without_marker();
        let result = splitter.split("घर-घर");
        assert_eq!(result, vec!["घर", "-", "घर"]);
    }

    #[test]
    fn test_empty_string() {
        let splitter = Splitter::new();
        assert_eq!(splitter.split(""), Vec::<String>::new());
    }
}
