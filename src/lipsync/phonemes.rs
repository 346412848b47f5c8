use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use super::viseme::Viseme;

/// A phoneme symbol in the ARPAbet-style alphabet produced by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phoneme(&'static str);

impl Phoneme {
    /// Inter-word and punctuation pause.
    pub const PAUSE: Phoneme = Phoneme(" ");

    pub const fn new(symbol: &'static str) -> Self {
        Phoneme(symbol)
    }

    pub fn symbol(&self) -> &'static str {
        self.0
    }

    pub fn is_pause(&self) -> bool {
        *self == Self::PAUSE
    }
}

impl AsRef<str> for Phoneme {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl fmt::Display for Phoneme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Phoneme to viseme classes, grouped by place of articulation.
const PHONEME_VISEMES: &[(&str, Viseme)] = &[
    // vowels
    ("AA", Viseme::Aa),
    ("AE", Viseme::Aa),
    ("AH", Viseme::Aa),
    ("AO", Viseme::O),
    ("AW", Viseme::O),
    ("AX", Viseme::Aa),
    ("AY", Viseme::Aa),
    ("EH", Viseme::E),
    ("ER", Viseme::E),
    ("EY", Viseme::E),
    ("IH", Viseme::I),
    ("IX", Viseme::I),
    ("IY", Viseme::I),
    ("OW", Viseme::O),
    ("OY", Viseme::O),
    ("UH", Viseme::U),
    ("UW", Viseme::U),
    ("UX", Viseme::U),
    // bilabial
    ("P", Viseme::Pp),
    ("B", Viseme::Pp),
    ("M", Viseme::Pp),
    // labiodental
    ("F", Viseme::Ff),
    ("V", Viseme::Ff),
    // dental / alveolar
    ("TH", Viseme::Th),
    ("DH", Viseme::Th),
    ("T", Viseme::Dd),
    ("D", Viseme::Dd),
    ("N", Viseme::Nn),
    ("S", Viseme::Ss),
    ("Z", Viseme::Ss),
    ("L", Viseme::Nn),
    // post-alveolar
    ("SH", Viseme::Ch),
    ("ZH", Viseme::Ch),
    ("CH", Viseme::Ch),
    ("JH", Viseme::Ch),
    ("R", Viseme::Rr),
    // velar / glottal / glides
    ("K", Viseme::Kk),
    ("G", Viseme::Kk),
    ("NG", Viseme::Kk),
    ("HH", Viseme::Kk),
    ("W", Viseme::U),
    ("Y", Viseme::I),
    // silence
    (" ", Viseme::Sil),
    ("", Viseme::Sil),
];

static PHONEME_TABLE: Lazy<HashMap<&'static str, Viseme>> =
    Lazy::new(|| PHONEME_VISEMES.iter().copied().collect());

/// Look up the viseme for a phoneme symbol, case-insensitively.
///
/// Returns `None` for symbols outside the table; callers decide the fallback.
pub fn phoneme_viseme(symbol: &str) -> Option<Viseme> {
    if let Some(&viseme) = PHONEME_TABLE.get(symbol) {
        return Some(viseme);
    }
    PHONEME_TABLE
        .get(symbol.to_ascii_uppercase().as_str())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::{phoneme_viseme, Phoneme};
    use crate::lipsync::viseme::Viseme;

    #[test]
    fn pause_maps_to_silence() {
        assert_eq!(phoneme_viseme(Phoneme::PAUSE.symbol()), Some(Viseme::Sil));
        assert_eq!(phoneme_viseme(""), Some(Viseme::Sil));
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(phoneme_viseme("th"), Some(Viseme::Th));
        assert_eq!(phoneme_viseme("Ng"), Some(Viseme::Kk));
        assert_eq!(phoneme_viseme("UW"), Some(Viseme::U));
    }

    #[test]
    fn unknown_symbols_are_absent() {
        assert_eq!(phoneme_viseme("QX"), None);
        assert_eq!(phoneme_viseme("?"), None);
    }

    #[test]
    fn bilabials_share_closed_lips() {
        for symbol in ["P", "B", "M"] {
            assert_eq!(phoneme_viseme(symbol), Some(Viseme::Pp));
        }
    }
}
