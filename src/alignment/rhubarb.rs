use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::str::FromStr;
use std::time::{Duration, Instant};

use super::{AlignmentReport, Aligner};
use crate::error::AlignmentError;

/// Environment variable that overrides the Rhubarb binary location.
pub const RHUBARB_PATH_ENV: &str = "RHUBARB_PATH";

/// Wall-clock budget for one alignment run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Speech recognizer Rhubarb uses to find phones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recognizer {
    /// Dictionary-based English recognition.
    #[default]
    PocketSphinx,
    /// Language-independent phonetic recognition.
    Phonetic,
}

impl Recognizer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recognizer::PocketSphinx => "pocketSphinx",
            Recognizer::Phonetic => "phonetic",
        }
    }
}

impl fmt::Display for Recognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recognizer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pocketsphinx" => Ok(Recognizer::PocketSphinx),
            "phonetic" => Ok(Recognizer::Phonetic),
            _ => Err(format!(
                "unknown recognizer {s:?} (expected pocketSphinx or phonetic)"
            )),
        }
    }
}

/// How to invoke Rhubarb Lip Sync.
#[derive(Debug, Clone)]
pub struct RhubarbConfig {
    /// Binary to run. Defaults to `$RHUBARB_PATH`, else `rhubarb` from PATH.
    pub bin_path: PathBuf,
    pub recognizer: Recognizer,
    /// Hard deadline; the process is killed when it is exceeded.
    pub timeout: Duration,
    /// Pass the script text as a dialog hint (`-d`).
    pub use_transcript: bool,
}

impl Default for RhubarbConfig {
    fn default() -> Self {
        let bin_path = std::env::var_os(RHUBARB_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("rhubarb"));
        Self {
            bin_path,
            recognizer: Recognizer::default(),
            timeout: DEFAULT_TIMEOUT,
            use_transcript: true,
        }
    }
}

/// Forced aligner backed by the Rhubarb Lip Sync command-line tool.
#[derive(Debug, Clone, Default)]
pub struct RhubarbAligner {
    config: RhubarbConfig,
}

impl RhubarbAligner {
    pub fn new(config: RhubarbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RhubarbConfig {
        &self.config
    }

    /// Command line for one run, audio path last.
    fn command(&self, audio_path: &Path, report_path: &Path, hint: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.config.bin_path);
        cmd.arg("-f")
            .arg("json")
            .arg("-o")
            .arg(report_path)
            .arg("--recognizer")
            .arg(self.config.recognizer.as_str());
        if let Some(hint) = hint {
            cmd.arg("-d").arg(hint);
        }
        cmd.arg(audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    fn write_transcript(report_path: &Path, transcript: &str) -> Result<PathBuf, AlignmentError> {
        let path = transcript_path(report_path);
        std::fs::write(&path, transcript)
            .map_err(|e| AlignmentError::io("writing transcript hint", e))?;
        Ok(path)
    }
}

impl Aligner for RhubarbAligner {
    fn align(
        &self,
        audio_path: &Path,
        transcript: Option<&str>,
        report_path: &Path,
    ) -> Result<AlignmentReport, AlignmentError> {
        let hint = match transcript {
            Some(text) if self.config.use_transcript && !text.trim().is_empty() => {
                Some(Self::write_transcript(report_path, text)?)
            }
            _ => None,
        };

        // A report left over from an earlier run must not pass for this one.
        match std::fs::remove_file(report_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AlignmentError::io("clearing stale report", e)),
        }

        log::info!(
            "Aligning {} with {} ({})",
            audio_path.display(),
            self.config.bin_path.display(),
            self.config.recognizer
        );

        let child = self
            .command(audio_path, report_path, hint.as_deref())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    AlignmentError::Unavailable {
                        binary: self.config.bin_path.display().to_string(),
                        source: e,
                    }
                }
                _ => AlignmentError::io("spawning aligner", e),
            })?;

        let (status, stderr) = wait_with_deadline(child, self.config.timeout)?;
        if !status.success() {
            return Err(AlignmentError::Failed {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        AlignmentReport::load(report_path)
    }
}

/// `<report stem>_transcript.txt` next to the report.
pub fn transcript_path(report_path: &Path) -> PathBuf {
    let stem = report_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "alignment".to_string());
    report_path.with_file_name(format!("{stem}_transcript.txt"))
}

/// Wait for `child`, killing it once `timeout` has elapsed.
///
/// stderr is drained on a helper thread so a chatty child cannot block on a
/// full pipe while we poll.
fn wait_with_deadline(
    mut child: Child,
    timeout: Duration,
) -> Result<(ExitStatus, String), AlignmentError> {
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });
    let collect_stderr = |reader: Option<std::thread::JoinHandle<String>>| {
        reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status, collect_stderr(stderr_reader))),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Not joined: a grandchild may still hold the pipe open.
                    drop(stderr_reader);
                    log::warn!("Aligner exceeded {timeout:?}, killed");
                    return Err(AlignmentError::Timeout { timeout });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                return Err(AlignmentError::io("waiting for aligner", e));
            }
        }
    }
}
