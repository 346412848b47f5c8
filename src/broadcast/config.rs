use std::path::PathBuf;
use std::str::FromStr;

use derive_builder::Builder;

use crate::lipsync::{TimeUnit, DEFAULT_SAMPLE_RATE};

/// How per-segment viseme timing is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimingMode {
    /// Spread text-derived visemes evenly over the audio.
    #[default]
    Uniform,
    /// Ask the forced aligner for exact cue times.
    Aligned,
}

impl std::fmt::Display for TimingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimingMode::Uniform => "uniform",
            TimingMode::Aligned => "aligned",
        })
    }
}

impl FromStr for TimingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" | "text" => Ok(TimingMode::Uniform),
            "aligned" | "rhubarb" => Ok(TimingMode::Aligned),
            other => Err(format!("unknown timing mode '{other}' (expected uniform or aligned)")),
        }
    }
}

/// What to do with a segment when alignment fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignmentFallback {
    /// Keep the segment with uniform timing.
    #[default]
    Uniform,
    /// Drop the segment.
    Fail,
}

impl std::fmt::Display for AlignmentFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AlignmentFallback::Uniform => "uniform",
            AlignmentFallback::Fail => "fail",
        })
    }
}

impl FromStr for AlignmentFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(AlignmentFallback::Uniform),
            "fail" => Ok(AlignmentFallback::Fail),
            other => Err(format!(
                "unknown alignment fallback '{other}' (expected uniform or fail)"
            )),
        }
    }
}

/// Settings for one broadcast run.
///
/// ```
/// use lipsync_rs::broadcast::{BroadcastConfigBuilder, TimingMode};
///
/// let config = BroadcastConfigBuilder::default()
///     .output_dir("out")
///     .timing_mode(TimingMode::Aligned)
///     .build()
///     .unwrap();
/// assert_eq!(config.sample_rate, 22050);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(default, setter(into), build_fn(validate = "Self::validate"))]
pub struct BroadcastConfig {
    /// Directory receiving audio, timing tracks and the manifest.
    pub output_dir: PathBuf,
    /// Voice name handed to the synthesis engine.
    pub voice: String,
    /// Unit of the emitted timing tracks.
    pub sample_rate: u32,
    pub timing_mode: TimingMode,
    pub alignment_fallback: AlignmentFallback,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("broadcast_output"),
            voice: crate::DEFAULT_VOICE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            timing_mode: TimingMode::default(),
            alignment_fallback: AlignmentFallback::default(),
        }
    }
}

impl BroadcastConfig {
    /// Unit every track of this run is written in.
    pub fn time_unit(&self) -> TimeUnit {
        TimeUnit::Samples(self.sample_rate)
    }
}

impl BroadcastConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.sample_rate == Some(0) {
            return Err("sample rate must be positive".to_string());
        }
        if let Some(voice) = &self.voice {
            if voice.trim().is_empty() {
                return Err("voice must not be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AlignmentFallback, BroadcastConfig, BroadcastConfigBuilder, TimingMode};
    use crate::lipsync::TimeUnit;

    #[test]
    fn defaults() {
        let config = BroadcastConfig::default();
        assert_eq!(config.voice, "en-us");
        assert_eq!(config.timing_mode, TimingMode::Uniform);
        assert_eq!(config.alignment_fallback, AlignmentFallback::Uniform);
        assert_eq!(config.time_unit(), TimeUnit::Samples(22050));
    }

    #[test]
    fn builder_overrides_and_validates() {
        let config = BroadcastConfigBuilder::default()
            .voice("en-gb")
            .sample_rate(16000u32)
            .alignment_fallback(AlignmentFallback::Fail)
            .build()
            .unwrap();
        assert_eq!(config.voice, "en-gb");
        assert_eq!(config.time_unit(), TimeUnit::Samples(16000));
        assert_eq!(config.output_dir, BroadcastConfig::default().output_dir);

        assert!(BroadcastConfigBuilder::default().sample_rate(0u32).build().is_err());
        assert!(BroadcastConfigBuilder::default().voice(" ").build().is_err());
    }

    #[test]
    fn option_names_parse() {
        assert_eq!("Aligned".parse::<TimingMode>(), Ok(TimingMode::Aligned));
        assert_eq!("uniform".parse::<TimingMode>(), Ok(TimingMode::Uniform));
        assert!("fast".parse::<TimingMode>().is_err());
        assert_eq!("fail".parse::<AlignmentFallback>(), Ok(AlignmentFallback::Fail));
        assert_eq!(AlignmentFallback::Fail.to_string(), "fail");
        assert_eq!(TimingMode::Aligned.to_string(), "aligned");
    }
}
