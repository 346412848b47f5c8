use super::phonemes::phoneme_viseme;
use super::viseme::Viseme;

/// Map phonemes to visemes; symbols outside the phoneme table become silence.
pub fn phonemes_to_visemes<P: AsRef<str>>(phonemes: &[P]) -> Vec<Viseme> {
    phonemes
        .iter()
        .map(|p| phoneme_viseme(p.as_ref()).unwrap_or(Viseme::Sil))
        .collect()
}

/// Collapse runs of identical visemes and frame the result with silence.
///
/// The output is never empty, never has two equal neighbours, and always
/// starts and ends with [`Viseme::Sil`].
pub fn compact(visemes: &[Viseme]) -> Vec<Viseme> {
    let mut merged: Vec<Viseme> = Vec::with_capacity(visemes.len() + 2);
    for &viseme in visemes {
        if merged.last() != Some(&viseme) {
            merged.push(viseme);
        }
    }

    if merged.first() != Some(&Viseme::Sil) {
        merged.insert(0, Viseme::Sil);
    }
    if merged.last() != Some(&Viseme::Sil) {
        merged.push(Viseme::Sil);
    }
    merged
}

/// Map then compact in one step.
pub fn phonemes_to_compact_visemes<P: AsRef<str>>(phonemes: &[P]) -> Vec<Viseme> {
    compact(&phonemes_to_visemes(phonemes))
}
