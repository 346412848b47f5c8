//! espeak-ng speech synthesis.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system, or bundled and configured
//! through [`EspeakConfig`]:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::{EngineError, SynthesisEngine, SynthesisResult, VoiceParams};

/// espeak-ng's default speaking rate, words per minute.
const BASE_WPM: f32 = 175.0;
const MIN_WPM: f32 = 80.0;
const MAX_WPM: f32 = 450.0;
/// espeak-ng's pitch scale is 0..=99 with 50 as neutral.
const BASE_PITCH: f32 = 50.0;
/// Rough Hz per espeak pitch step around a neutral adult voice.
const HZ_PER_PITCH_STEP: f32 = 2.0;

/// Where to find espeak-ng.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    /// Binary path. `None` uses `espeak-ng` from PATH.
    pub bin_path: Option<PathBuf>,
    /// Directory containing `espeak-ng-data`. `None` uses the built-in location.
    pub data_path: Option<PathBuf>,
}

/// A voice reported by `espeak-ng --voices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EspeakVoice {
    pub language: String,
    pub gender: String,
    pub name: String,
}

/// Speech synthesis through the espeak-ng command-line tool.
///
/// ```rust,no_run
/// use lipsync_rs::{SynthesisEngine, VoiceParams, engines::espeak::EspeakEngine};
///
/// let mut engine = EspeakEngine::new();
/// let result = engine.synthesize("Good evening.", &VoiceParams::default())?;
/// println!("{:.2}s of audio", result.duration_secs());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EspeakEngine {
    config: EspeakConfig,
}

impl EspeakEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    ///
    /// Use this when bundling espeak-ng with your application. Either path
    /// can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            config: EspeakConfig {
                bin_path,
                data_path,
            },
        }
    }

    /// Whether the configured binary can be executed at all.
    pub fn is_available(&self) -> bool {
        self.command()
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// List voices espeak-ng knows for a language prefix (e.g. `"en"`).
    pub fn list_voices(&self, language: &str) -> Result<Vec<EspeakVoice>, EngineError> {
        let output = self
            .command()
            .arg(format!("--voices={language}"))
            .stdin(Stdio::null())
            .output()
            .map_err(not_found_or_io)?;
        if !output.status.success() {
            return Err(EngineError::Failed(format!(
                "espeak-ng --voices exited with code {:?}",
                output.status.code()
            )));
        }
        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn command(&self) -> Command {
        let bin = self
            .config
            .bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("espeak-ng"));
        let mut cmd = Command::new(bin);
        if let Some(data) = &self.config.data_path {
            cmd.arg(format!("--path={}", data.display()));
        }
        cmd
    }

    fn run_to_wav(
        &self,
        text: &str,
        voice: &VoiceParams,
        wav_path: &Path,
    ) -> Result<(), EngineError> {
        let mut child = self
            .command()
            .args(synthesis_args(voice))
            .arg("-w")
            .arg(wav_path)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(not_found_or_io)?;

        // espeak-ng reads stdin line by line; an unterminated last line can
        // lose its final word. The child is reaped before a write error is
        // reported.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(canonicalize_stdin_payload(text).as_bytes()),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "espeak-ng exited with code {:?}: {stderr}",
                output.status.code()
            )));
        }
        written?;
        Ok(())
    }
}

impl SynthesisEngine for EspeakEngine {
    fn synthesize(
        &mut self,
        text: &str,
        voice: &VoiceParams,
    ) -> Result<SynthesisResult, EngineError> {
        let scratch = tempfile::Builder::new()
            .prefix("lipsync-espeak-")
            .suffix(".wav")
            .tempfile()?;
        self.run_to_wav(text, voice, scratch.path())?;
        let result = read_wav(scratch.path())?;
        log::debug!(
            "espeak-ng produced {:.2}s at {}Hz",
            result.duration_secs(),
            result.sample_rate
        );
        Ok(result)
    }
}

fn not_found_or_io(e: std::io::Error) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::EspeakNotFound
    } else {
        EngineError::Io(e)
    }
}

/// espeak-ng voice name for a configured voice.
///
/// Cloud-style names such as `en-US-JennyNeural` reduce to their locale
/// (`en-us`); anything else is passed through.
pub fn espeak_voice(voice: &str) -> String {
    let parts: Vec<&str> = voice.split('-').collect();
    if parts.len() >= 3 && parts[2].ends_with("Neural") {
        return format!("{}-{}", parts[0], parts[1]).to_ascii_lowercase();
    }
    if voice.trim().is_empty() {
        return crate::DEFAULT_VOICE.to_string();
    }
    voice.to_string()
}

fn synthesis_args(voice: &VoiceParams) -> Vec<String> {
    let wpm = (BASE_WPM * (1.0 + voice.rate_percent() / 100.0)).clamp(MIN_WPM, MAX_WPM);
    let pitch = (BASE_PITCH + voice.pitch_hz() / HZ_PER_PITCH_STEP).clamp(0.0, 99.0);
    vec![
        "-v".to_string(),
        espeak_voice(&voice.voice),
        "-s".to_string(),
        format!("{}", wpm.round() as u32),
        "-p".to_string(),
        format!("{}", pitch.round() as u32),
    ]
}

fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Read a WAV file into mono f32 samples, averaging channels.
pub fn read_wav(path: &Path) -> Result<SynthesisResult, EngineError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(SynthesisResult {
        samples,
        sample_rate: spec.sample_rate,
    })
}

fn parse_voice_list(output: &str) -> Vec<EspeakVoice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            let gender = cols[2].rsplit('/').next().unwrap_or("-").to_string();
            Some(EspeakVoice {
                language: cols[1].to_string(),
                gender,
                name: cols[3].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        canonicalize_stdin_payload, espeak_voice, parse_voice_list, read_wav, synthesis_args,
        EspeakEngine,
    };
    use crate::{SynthesisEngine, SynthesisResult, VoiceParams};

    #[test]
    fn appends_trailing_newline_for_stdin() {
        assert_eq!(canonicalize_stdin_payload("America"), "America\n");
        assert_eq!(canonicalize_stdin_payload("America\n"), "America\n");
    }

    #[test]
    fn neural_voice_names_reduce_to_locale() {
        assert_eq!(espeak_voice("en-US-JennyNeural"), "en-us");
        assert_eq!(espeak_voice("en-GB-SoniaNeural"), "en-gb");
        assert_eq!(espeak_voice("en-us"), "en-us");
        assert_eq!(espeak_voice("mb-en1"), "mb-en1");
        assert_eq!(espeak_voice(""), "en-us");
    }

    #[test]
    fn prosody_maps_onto_espeak_scales() {
        let neutral = synthesis_args(&VoiceParams::default());
        assert_eq!(neutral, vec!["-v", "en-us", "-s", "175", "-p", "50"]);

        let brisk = synthesis_args(&VoiceParams {
            rate: "+20%".into(),
            pitch: "+10Hz".into(),
            ..VoiceParams::default()
        });
        assert_eq!(brisk, vec!["-v", "en-us", "-s", "210", "-p", "55"]);

        let extreme = synthesis_args(&VoiceParams {
            rate: "-90%".into(),
            pitch: "+500Hz".into(),
            ..VoiceParams::default()
        });
        assert_eq!(extreme[3], "80");
        assert_eq!(extreme[5], "99");
    }

    #[test]
    fn parses_voice_listing() {
        let listing = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                       5  en-gb           --/M      English_(Great_Britain) gmw/en            (en 2)\n \
                       5  en-us           --/M      English_(America)  gmw/en-US            (en 3)\n";
        let voices = parse_voice_list(listing);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].language, "en-us");
        assert_eq!(voices[1].gender, "M");
        assert_eq!(voices[1].name, "English_(America)");
    }

    #[test]
    fn reads_integer_pcm_as_unit_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcm.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for v in [16384i16, 0, -16384, -16384] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let result = read_wav(&path).unwrap();
        assert_eq!(result.sample_rate, 22050);
        assert_eq!(result.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn missing_binary_is_reported() {
        let mut engine = EspeakEngine::with_espeak(
            Some(std::path::PathBuf::from("/nonexistent/espeak-ng")),
            None,
        );
        assert!(!engine.is_available());
        let err = engine
            .synthesize("hello", &VoiceParams::default())
            .unwrap_err();
        assert!(matches!(err, crate::EngineError::EspeakNotFound), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_is_reported_after_the_child_is_reaped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("espeak-ng");
        std::fs::write(&script, "#!/bin/sh\necho 'no such voice' >&2\nexit 4\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Far larger than a pipe buffer, so the write fails once the child is gone.
        let text = "word ".repeat(200_000);
        let mut engine = EspeakEngine::with_espeak(Some(script), None);
        let err = engine
            .synthesize(&text, &VoiceParams::default())
            .unwrap_err();
        match err {
            crate::EngineError::Failed(message) => {
                assert!(message.contains("Some(4)"), "{message}");
                assert!(message.contains("no such voice"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn synthesizes_real_audio_when_espeak_is_installed() {
        let mut engine = EspeakEngine::new();
        // Skip when espeak-ng is unavailable in the execution environment.
        if !engine.is_available() {
            return;
        }
        let result: SynthesisResult = engine
            .synthesize("Hello world.", &VoiceParams::default())
            .expect("espeak should succeed");
        assert!(result.duration_secs() > 0.2);
        assert!(result.sample_rate > 0);
    }
}
