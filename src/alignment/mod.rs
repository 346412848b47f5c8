//! Forced-alignment timing.
//!
//! An external aligner listens to the synthesized audio (optionally with the
//! script as a hint) and reports mouth cues with exact start/end times. This
//! module converts those cues into the same [`TimingTrack`] the uniform
//! pipeline produces.
//!
//! The aligner speaks its own small shape alphabet (Rhubarb's `A`–`H` plus `X`
//! for rest), so it has its own lookup table rather than sharing the phoneme
//! table in [`crate::lipsync::phonemes`].

pub mod rhubarb;

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;
use crate::lipsync::{TimeUnit, TimingTrack, Viseme};

pub use rhubarb::{Recognizer, RhubarbAligner, RhubarbConfig};

/// One aligned phone with its time boundaries, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "value")]
    pub phone_label: String,
}

/// The aligner's JSON report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub mouth_cues: Vec<MouthCue>,
}

impl AlignmentReport {
    /// Read and validate a report written by the aligner.
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let content = std::fs::read_to_string(path).map_err(|e| AlignmentError::parse(path, e))?;
        serde_json::from_str(&content).map_err(|e| AlignmentError::parse(path, e))
    }
}

/// Aligner shape to viseme.
const ALIGNER_VISEMES: &[(&str, Viseme)] = &[
    ("A", Viseme::Aa),
    ("B", Viseme::Pp),
    ("C", Viseme::E),
    ("D", Viseme::Aa),
    ("E", Viseme::O),
    ("F", Viseme::U),
    ("G", Viseme::Ff),
    ("H", Viseme::Nn),
    ("X", Viseme::Sil),
];

static ALIGNER_TABLE: Lazy<HashMap<&'static str, Viseme>> =
    Lazy::new(|| ALIGNER_VISEMES.iter().copied().collect());

/// Look up the viseme for an aligner phone label; unknown labels are silence.
pub fn aligner_viseme(label: &str) -> Viseme {
    ALIGNER_TABLE.get(label).copied().unwrap_or(Viseme::Sil)
}

/// Convert mouth cues to a timing track, one entry per cue, in cue order.
///
/// No compaction or silence padding: the aligner already segments the
/// utterance. Cues whose end precedes their start get a zero duration.
pub fn cues_to_track(cues: &[MouthCue], unit: TimeUnit) -> TimingTrack {
    let mut track = TimingTrack::with_capacity(unit, cues.len());
    for cue in cues {
        let start = unit.units(cue.start);
        let duration = unit.units(cue.end - cue.start);
        track.push(aligner_viseme(&cue.phone_label), start, duration);
    }
    track
}

/// A forced aligner that reports mouth cues for an audio file.
///
/// `report_path` is where the aligner should leave its raw report; it is kept
/// as a per-segment artifact.
pub trait Aligner {
    fn align(
        &self,
        audio_path: &Path,
        transcript: Option<&str>,
        report_path: &Path,
    ) -> Result<AlignmentReport, AlignmentError>;
}

/// Align an existing recording and convert the result to a timing track.
///
/// A report without mouth cues is a [`AlignmentError::Parse`] error, since an
/// empty track cannot drive a mouth.
pub fn lipsync_from_audio<A: Aligner + ?Sized>(
    aligner: &A,
    audio_path: &Path,
    transcript: Option<&str>,
    report_path: &Path,
    unit: TimeUnit,
) -> Result<TimingTrack, AlignmentError> {
    let report = aligner.align(audio_path, transcript, report_path)?;
    log::debug!(
        "Aligner reported {} mouth cues for {}",
        report.mouth_cues.len(),
        audio_path.display()
    );
    if report.mouth_cues.is_empty() {
        return Err(AlignmentError::parse(report_path, "report has no mouth cues"));
    }
    Ok(cues_to_track(&report.mouth_cues, unit))
}
