//! Text-driven viseme timing.
//!
//! The uniform pipeline turns a script and the measured length of its audio
//! into a renderer timing track:
//!
//! ```text
//! text ─normalize─▶ g2p ─▶ phonemes ─mapper─▶ visemes ─compact─▶ timing ─▶ TimingTrack
//! ```
//!
//! # Example
//!
//! ```rust
//! use lipsync_rs::lipsync::{lipsync_from_text, TimeUnit, Viseme};
//!
//! let track = lipsync_from_text("Hello World.", 2.0, TimeUnit::Milliseconds);
//! assert_eq!(track.visemes.first(), Some(&Viseme::Sil));
//! assert_eq!(track.visemes.last(), Some(&Viseme::Sil));
//! assert_eq!(track.vtimes.len(), track.vdurations.len());
//! ```

pub mod g2p;
pub mod mapper;
pub mod phonemes;
pub mod timing;
pub mod viseme;

pub use g2p::{normalize, text_to_phonemes};
pub use mapper::{compact, phonemes_to_compact_visemes, phonemes_to_visemes};
pub use phonemes::{phoneme_viseme, Phoneme};
pub use timing::{synthesize_uniform, TimeUnit, TimingTrack, DEFAULT_SAMPLE_RATE};
pub use viseme::Viseme;

/// Build a uniform timing track for `text` spoken over `duration_secs`.
///
/// `text` is normalized here, so raw script text is fine.
pub fn lipsync_from_text(text: &str, duration_secs: f64, unit: TimeUnit) -> TimingTrack {
    let phonemes = text_to_phonemes(&normalize(text));
    let visemes = phonemes_to_compact_visemes(&phonemes);
    log::debug!(
        "{} phonemes compacted to {} visemes",
        phonemes.len(),
        visemes.len()
    );
    synthesize_uniform(&visemes, duration_secs, unit)
}

#[cfg(test)]
mod tests {
    use super::{lipsync_from_text, TimeUnit, Viseme};

    #[test]
    fn empty_text_is_one_silence_over_the_whole_clip() {
        let track = lipsync_from_text("", 1.0, TimeUnit::Milliseconds);
        assert_eq!(track.visemes, vec![Viseme::Sil]);
        assert_eq!(track.vdurations, vec![1000]);
    }

    #[test]
    fn pipeline_is_byte_identical_across_runs() {
        let text = "In breaking news tonight, scientists announced a breakthrough.";
        let first = lipsync_from_text(text, 4.2, TimeUnit::default()).to_json().unwrap();
        let second = lipsync_from_text(text, 4.2, TimeUnit::default()).to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn case_and_padding_do_not_change_the_track() {
        let a = lipsync_from_text("  Hello World.  ", 2.0, TimeUnit::Milliseconds);
        let b = lipsync_from_text("hello world.", 2.0, TimeUnit::Milliseconds);
        assert_eq!(a, b);
    }
}
