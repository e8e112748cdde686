//! Text normalization for pre-tokenization.
//!
//! Normalization runs, in order: NFKC, variant mapping, Devanagari
//! combining-mark canonicalization followed by NFKC again, then whitespace
//! collapse. The mark step repeats until the text stops changing, so
//! `normalize` is idempotent.

use unicode_normalization::UnicodeNormalization;

/// Result of mapping a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Keep,
    Replace(char),
    Drop,
}

/// Canonical form of punctuation, space and zero-width variants.
fn canonical_variant(ch: char) -> Variant {
    match ch {
        // Curly, low-9 and angled quotes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2039}' | '\u{203A}' => {
            Variant::Replace('\'')
        }
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => {
            Variant::Replace('"')
        }
        // Hyphens, dashes and minus
        '\u{2010}'..='\u{2015}' | '\u{2212}' => Variant::Replace('-'),
        // Zero-width space and the word marker itself
        '\u{200B}' | '\u{2581}' => Variant::Replace(' '),
        // ZWNJ, ZWJ and the byte-order mark
        '\u{200C}' | '\u{200D}' | '\u{FEFF}' => Variant::Drop,
        _ => Variant::Keep,
    }
}

/// Map variants to their canonical form and turn runs of two or more dots
/// into an ellipsis.
fn map_variants(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut dots = 0usize;

    for ch in text.chars() {
        let ch = match canonical_variant(ch) {
            Variant::Keep => ch,
            Variant::Replace(c) => c,
            // Dropped characters do not interrupt a run of dots
            Variant::Drop => continue,
        };

        if ch == '.' {
            dots += 1;
            continue;
        }
        push_dots(&mut out, dots);
        dots = 0;
        out.push(ch);
    }
    push_dots(&mut out, dots);

    out
}

fn push_dots(out: &mut String, dots: usize) {
    match dots {
        0 => {}
        1 => out.push('.'),
        _ => out.push_str("..."),
    }
}

/// Devanagari combining marks that take part in reordering.
#[inline]
fn is_devanagari_mark(ch: char) -> bool {
    matches!(ch,
        '\u{0900}'..='\u{0903}'
        | '\u{093A}'..='\u{093C}'
        | '\u{093E}'..='\u{094F}'
        | '\u{0951}'..='\u{0957}'
        | '\u{0962}'..='\u{0963}')
}

/// Position of a mark within its run: nukta, virama, vowel signs,
/// candrabindu/anusvara/visarga, stress marks.
#[inline]
fn mark_class(ch: char) -> u8 {
    match ch {
        '\u{093C}' => 0,
        '\u{094D}' => 1,
        '\u{0900}'..='\u{0903}' => 3,
        '\u{0951}'..='\u{0954}' => 4,
        _ => 2,
    }
}

/// Stable-sort every run of Devanagari combining marks by class.
fn reorder_marks(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let mut start = 0;

    while start < chars.len() {
        if !is_devanagari_mark(chars[start]) {
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < chars.len() && is_devanagari_mark(chars[end]) {
            end += 1;
        }
        if end - start > 1 {
            chars[start..end].sort_by_key(|&ch| mark_class(ch));
        }
        start = end;
    }

    chars.into_iter().collect()
}

/// Collapse whitespace runs to a single ASCII space and trim both ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

const MAX_REORDER_PASSES: usize = 8;

/// Text normalizer.
///
/// Deterministic and idempotent: `normalize(normalize(x)) == normalize(x)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize text.
    pub fn normalize(&self, text: &str) -> String {
        let nfkc: String = text.nfkc().collect();
        let mut text = map_variants(&nfkc);

        // Composition can move marks across run boundaries; settle both.
        for _ in 0..MAX_REORDER_PASSES {
            let next: String = reorder_marks(&text).nfkc().collect();
            if next == text {
                break;
            }
            text = next;
        }

        collapse_whitespace(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfkc_applied() {
        let normalizer = Normalizer::new();
        // Fullwidth digits and ligatures fold to their compatibility forms
        assert_eq!(normalizer.normalize("１２ ﬁ"), "12 fi");
        // Nukta letters decompose and stay decomposed
        assert_eq!(normalizer.normalize("\u{0958}"), "\u{0915}\u{093C}");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("  नमस्ते \t\n  दुनिया  "), "नमस्ते दुनिया");
        assert_eq!(normalizer.normalize("क\u{00A0}ख"), "क ख");
        assert_eq!(normalizer.normalize("क\u{200B}ख"), "क ख");
        assert_eq!(normalizer.normalize("   "), "");
    }

    #[test]
    fn test_punctuation_variants() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("\u{201C}हाँ\u{201D}"), "\"हाँ\"");
        assert_eq!(normalizer.normalize("\u{2018}क\u{2019}"), "'क'");
        assert_eq!(normalizer.normalize("१९४७\u{2013}४८"), "१९४७-४८");
        assert_eq!(normalizer.normalize("रुको.."), "रुको...");
        assert_eq!(normalizer.normalize("रुको....."), "रुको...");
        assert_eq!(normalizer.normalize("रुको\u{2026}"), "रुको...");
    }

    #[test]
    fn test_zero_width_removed() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("क्\u{200D}ष"), "क्ष");
        assert_eq!(normalizer.normalize("\u{FEFF}क\u{200C}ा"), "का");
        // Removal must not split a run of dots
        assert_eq!(normalizer.normalize(".\u{200D}.\u{200D}."), "...");
    }

    #[test]
    fn test_marker_becomes_space() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("क\u{2581}ख"), "क ख");
    }

    #[test]
    fn test_mark_reordering() {
        let normalizer = Normalizer::new();
        // anusvara before vowel sign -> vowel sign first
        assert_eq!(normalizer.normalize("ह\u{0902}\u{0948}"), "ह\u{0948}\u{0902}");
        // vowel sign before nukta -> nukta first
        assert_eq!(
            normalizer.normalize("ड\u{093F}\u{093C}"),
            normalizer.normalize("ड\u{093C}\u{093F}")
        );
    }

    #[test]
    fn test_idempotent_on_samples() {
        let normalizer = Normalizer::new();
        for sample in [
            "नमस्ते दुनिया",
            "न\u{093F}\u{093C} ..\u{200D}. \u{2581}",
            "क़ ख़ ग़ ऩ",
            "\u{0915}\u{0951}\u{0952}\u{094D}",
            "“quoted” — dash",
            "क\u{0951}\u{093E}\u{0334}\u{093C}\u{093F}",
        ] {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "sample {:?}", sample);
        }
    }
}
