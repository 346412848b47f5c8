//! Heuristic English grapheme-to-phoneme translation.
//!
//! This is a letter-pattern approximation, not a pronunciation dictionary. It
//! only has to be good enough to drive mouth shapes.

use super::phonemes::Phoneme;

const fn p(symbol: &'static str) -> Phoneme {
    Phoneme::new(symbol)
}

/// Letter patterns in match priority order.
///
/// Longer and more specific patterns must precede any pattern that is a prefix
/// of them (`tion` before `th`/`t`, `ough` before `ou`/`o`), since the scan takes
/// the first pattern that matches at the cursor.
const PATTERNS: &[(&str, &[Phoneme])] = &[
    ("tion", &[p("SH"), p("AH"), p("N")]),
    ("sion", &[p("ZH"), p("AH"), p("N")]),
    ("ough", &[p("AH"), p("F")]),
    ("ight", &[p("AY"), p("T")]),
    ("ould", &[p("UH"), p("D")]),
    ("th", &[p("TH")]),
    ("sh", &[p("SH")]),
    ("ch", &[p("CH")]),
    ("wh", &[p("W")]),
    ("ck", &[p("K")]),
    ("ng", &[p("NG")]),
    ("ph", &[p("F")]),
    ("gh", &[]),
    ("wr", &[p("R")]),
    ("kn", &[p("N")]),
    ("mb", &[p("M")]),
    ("qu", &[p("K"), p("W")]),
    ("ee", &[p("IY")]),
    ("ea", &[p("IY")]),
    ("oo", &[p("UW")]),
    ("ou", &[p("AW")]),
    ("ow", &[p("OW")]),
    ("ai", &[p("EY")]),
    ("ay", &[p("EY")]),
    ("oi", &[p("OY")]),
    ("oy", &[p("OY")]),
    ("au", &[p("AO")]),
    ("aw", &[p("AO")]),
    ("ie", &[p("IY")]),
    ("ue", &[p("UW")]),
    ("a", &[p("AE")]),
    ("e", &[p("EH")]),
    ("i", &[p("IH")]),
    ("o", &[p("AA")]),
    ("u", &[p("AH")]),
    ("y", &[p("IY")]),
    ("b", &[p("B")]),
    ("c", &[p("K")]),
    ("d", &[p("D")]),
    ("f", &[p("F")]),
    ("g", &[p("G")]),
    ("h", &[p("HH")]),
    ("j", &[p("JH")]),
    ("k", &[p("K")]),
    ("l", &[p("L")]),
    ("m", &[p("M")]),
    ("n", &[p("N")]),
    ("p", &[p("P")]),
    ("r", &[p("R")]),
    ("s", &[p("S")]),
    ("t", &[p("T")]),
    ("v", &[p("V")]),
    ("w", &[p("W")]),
    ("x", &[p("K"), p("S")]),
    ("z", &[p("Z")]),
];

/// Lower-case and trim text the way the translator expects it.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Translate normalized text into an ordered phoneme sequence.
///
/// Expects text already passed through [`normalize`]; upper-case letters match
/// no pattern and are dropped. Whitespace and sentence punctuation become
/// [`Phoneme::PAUSE`], every other unmatched character is skipped. Never fails.
pub fn text_to_phonemes(text: &str) -> Vec<Phoneme> {
    let mut phonemes = Vec::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if let Some((pattern, phones)) = PATTERNS.iter().find(|(pat, _)| rest.starts_with(pat)) {
            phonemes.extend_from_slice(phones);
            rest = &rest[pattern.len()..];
            continue;
        }

        if is_pause_char(ch) {
            phonemes.push(Phoneme::PAUSE);
        }
        rest = &rest[ch.len_utf8()..];
    }

    phonemes
}

fn is_pause_char(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '.' | ',' | '!' | '?' | ';' | ':')
}

#[cfg(test)]
mod tests {
    use super::{normalize, text_to_phonemes, PATTERNS};
    use crate::lipsync::phonemes::Phoneme;

    fn symbols(text: &str) -> Vec<&'static str> {
        text_to_phonemes(text).iter().map(|p| p.symbol()).collect()
    }

    #[test]
    fn hello_world_letters_and_pauses() {
        assert_eq!(
            symbols(&normalize("Hello World.")),
            vec!["HH", "EH", "L", "L", "AA", " ", "W", "AA", "R", "L", "D", " "]
        );
    }

    #[test]
    fn empty_and_blank_input_produce_nothing_or_pauses() {
        assert!(text_to_phonemes("").is_empty());
        assert_eq!(symbols("  "), vec![" ", " "]);
        assert!(text_to_phonemes(&normalize("   ")).is_empty());
    }

    #[test]
    fn longest_pattern_wins() {
        assert_eq!(symbols("nation"), vec!["N", "AE", "SH", "AH", "N"]);
        assert_eq!(symbols("night"), vec!["N", "AY", "T"]);
        assert_eq!(symbols("the"), vec!["TH", "EH"]);
        assert_eq!(symbols("queen"), vec!["K", "W", "IY", "N"]);
    }

    #[test]
    fn silent_digraph_emits_nothing() {
        assert_eq!(symbols("gh"), Vec::<&str>::new());
        assert_eq!(symbols("laugh"), vec!["L", "AO"]);
    }

    #[test]
    fn x_expands_to_two_phonemes() {
        assert_eq!(symbols("box"), vec!["B", "AA", "K", "S"]);
    }

    #[test]
    fn unrecognized_characters_are_dropped() {
        assert_eq!(symbols("a-1'b"), vec!["AE", "B"]);
        assert_eq!(symbols("café"), vec!["K", "AE", "F"]);
        assert_eq!(symbols("👋 hi"), vec![" ", "HH", "IH"]);
    }

    #[test]
    fn sentence_punctuation_is_a_pause() {
        for punct in [".", ",", "!", "?", ";", ":"] {
            assert_eq!(text_to_phonemes(punct), vec![Phoneme::PAUSE]);
        }
        assert!(text_to_phonemes("\"()").is_empty());
    }

    #[test]
    fn no_pattern_is_shadowed_by_an_earlier_prefix() {
        for (i, (later, _)) in PATTERNS.iter().enumerate() {
            for (earlier, _) in &PATTERNS[..i] {
                assert!(
                    !later.starts_with(earlier),
                    "{later:?} can never match because {earlier:?} comes first"
                );
            }
        }
    }

    #[test]
    fn translation_is_deterministic() {
        let text = normalize("Good evening, and welcome to tonight's broadcast!");
        assert_eq!(text_to_phonemes(&text), text_to_phonemes(&text));
    }
}
