//! # lipsync-rs
//!
//! Viseme timing for talking-head avatars: turns script text (and optionally
//! forced-aligned audio) into time-ordered mouth shapes synchronized to a
//! synthesized audio track.
//!
//! ## Features
//!
//! - **Text-driven lip-sync**: heuristic English grapheme-to-phoneme rules,
//!   phoneme-to-viseme classification and uniform timing, no external tools
//! - **Aligned lip-sync**: sub-phone timing from Rhubarb Lip Sync, normalized
//!   into the same track format
//! - **Broadcast pipeline**: multi-segment scripts to audio files, timing
//!   tracks and a manifest, with per-segment failure isolation
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use lipsync_rs::broadcast::{BroadcastConfig, Orchestrator};
//! use lipsync_rs::engines::espeak::EspeakEngine;
//!
//! let config = BroadcastConfig {
//!     output_dir: PathBuf::from("output"),
//!     ..Default::default()
//! };
//! let mut orchestrator = Orchestrator::new(EspeakEngine::new(), config);
//! let run = orchestrator.run_file(&PathBuf::from("segments.json"))?;
//! println!("{} segments, {:.1}s", run.manifest.total_segments, run.manifest.total_duration);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Or just the timing, when the audio length is already known:
//!
//! ```
//! use lipsync_rs::lipsync::{lipsync_from_text, TimeUnit};
//!
//! let track = lipsync_from_text("Good evening.", 1.2, TimeUnit::Samples(22050));
//! assert_eq!(track.sample_rate, Some(22050));
//! ```

pub mod alignment;
pub mod broadcast;
pub mod engines;
pub mod error;
pub mod lipsync;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::{AlignmentError, BroadcastError, EngineError, SegmentError};

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), EngineError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Voice selection and prosody overrides for one synthesis request.
///
/// `rate` is a signed percentage (`"+10%"`, `"-5%"`) and `pitch` a signed
/// offset in Hz (`"+20Hz"`). Unparseable values are treated as neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub voice: String,
    pub rate: String,
    pub pitch: String,
}

pub const DEFAULT_VOICE: &str = "en-us";
pub const NEUTRAL_RATE: &str = "+0%";
pub const NEUTRAL_PITCH: &str = "+0Hz";

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            rate: NEUTRAL_RATE.to_string(),
            pitch: NEUTRAL_PITCH.to_string(),
        }
    }
}

impl VoiceParams {
    /// Rate change in percent, 0 when unset or malformed.
    pub fn rate_percent(&self) -> f32 {
        parse_signed(&self.rate, "%")
    }

    /// Pitch change in Hz, 0 when unset or malformed.
    pub fn pitch_hz(&self) -> f32 {
        parse_signed(&self.pitch, "hz")
    }
}

fn parse_signed(raw: &str, suffix: &str) -> f32 {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let number = lower.strip_suffix(suffix).unwrap_or(&lower).trim();
    number
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Common interface for text-to-speech synthesis engines.
///
/// The broadcast pipeline treats engines as black boxes that turn text into
/// audio; the measured length of that audio drives viseme timing.
pub trait SynthesisEngine {
    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        voice: &VoiceParams,
    ) -> Result<SynthesisResult, EngineError>;

    /// Synthesize speech and write it to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`,
    /// and hands the result back so callers can measure it.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        voice: &VoiceParams,
        wav_path: &Path,
    ) -> Result<SynthesisResult, EngineError> {
        let result = self.synthesize(text, voice)?;
        result.write_wav(wav_path)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::{SynthesisResult, VoiceParams};

    #[test]
    fn duration_from_sample_count() {
        let result = SynthesisResult {
            samples: vec![0.0; 33075],
            sample_rate: 22050,
        };
        assert!((result.duration_secs() - 1.5).abs() < 1e-9);
        let broken = SynthesisResult {
            samples: vec![0.0; 10],
            sample_rate: 0,
        };
        assert_eq!(broken.duration_secs(), 0.0);
    }

    #[test]
    fn wav_round_trips_through_hound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let result = SynthesisResult {
            samples: vec![0.0, 0.5, -0.5, 0.25],
            sample_rate: 16000,
        };
        result.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, result.samples);
    }

    #[test]
    fn prosody_strings_parse_leniently() {
        let voice = VoiceParams {
            voice: "en-gb".into(),
            rate: "+15%".into(),
            pitch: "-20Hz".into(),
        };
        assert_eq!(voice.rate_percent(), 15.0);
        assert_eq!(voice.pitch_hz(), -20.0);

        let odd = VoiceParams {
            rate: "fast".into(),
            pitch: " 5 hz ".into(),
            ..VoiceParams::default()
        };
        assert_eq!(odd.rate_percent(), 0.0);
        assert_eq!(odd.pitch_hz(), 5.0);
        assert_eq!(VoiceParams::default().rate_percent(), 0.0);
    }
}
