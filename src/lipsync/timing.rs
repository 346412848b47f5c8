//! Viseme timing tracks and the uniform timing synthesizer.
//!
//! A [`TimingTrack`] is what the renderer plays: parallel arrays of visemes,
//! start offsets and durations in integer time units. Both the text-driven
//! uniform path and the aligner-driven path produce this same shape.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::viseme::{natural_duration, Viseme};

/// Default sample rate for uniform tracks.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Integer unit that track offsets and durations are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Audio samples at the given rate.
    Samples(u32),
    Milliseconds,
}

impl TimeUnit {
    /// Units per second.
    pub fn scale(&self) -> f64 {
        match self {
            TimeUnit::Samples(rate) => f64::from(*rate),
            TimeUnit::Milliseconds => 1000.0,
        }
    }

    /// Convert seconds to whole units, rounding to nearest. Negative input clamps to zero.
    pub fn units(&self, secs: f64) -> u64 {
        let units = (secs * self.scale()).round();
        if units.is_finite() && units > 0.0 {
            units as u64
        } else {
            0
        }
    }

    fn sample_rate(&self) -> Option<u32> {
        match self {
            TimeUnit::Samples(rate) => Some(*rate),
            TimeUnit::Milliseconds => None,
        }
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        TimeUnit::Samples(DEFAULT_SAMPLE_RATE)
    }
}

/// Renderer-facing viseme timing.
///
/// `vtimes`/`vdurations` are samples when `sampleRate` is present and
/// milliseconds otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingTrack {
    pub visemes: Vec<Viseme>,
    pub vtimes: Vec<u64>,
    pub vdurations: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
}

impl TimingTrack {
    pub(crate) fn with_capacity(unit: TimeUnit, capacity: usize) -> Self {
        Self {
            visemes: Vec::with_capacity(capacity),
            vtimes: Vec::with_capacity(capacity),
            vdurations: Vec::with_capacity(capacity),
            sample_rate: unit.sample_rate(),
        }
    }

    pub(crate) fn push(&mut self, viseme: Viseme, start: u64, duration: u64) {
        self.visemes.push(viseme);
        self.vtimes.push(start);
        self.vdurations.push(duration);
    }

    pub fn len(&self) -> usize {
        self.visemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visemes.is_empty()
    }

    /// Unit the offsets are expressed in.
    pub fn unit(&self) -> TimeUnit {
        match self.sample_rate {
            Some(rate) => TimeUnit::Samples(rate),
            None => TimeUnit::Milliseconds,
        }
    }

    /// Sum of all durations, in track units.
    pub fn total_units(&self) -> u64 {
        self.vdurations.iter().sum()
    }

    /// Pretty JSON document as written next to each segment's audio.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
    }
}

/// Spread `duration_secs` evenly across `visemes`.
///
/// Every viseme gets the same share regardless of class. The typical-duration
/// hints on [`Viseme`] are only reported as a pace diagnostic here; changing
/// the split would shift every existing track.
///
/// Never fails: an empty sequence or a non-positive duration yields a single
/// `sil` entry (one unit long when the duration is unusable).
pub fn synthesize_uniform(visemes: &[Viseme], duration_secs: f64, unit: TimeUnit) -> TimingTrack {
    if visemes.is_empty() || duration_secs.is_nan() || duration_secs <= 0.0 {
        log::warn!(
            "Degenerate timing input ({} visemes, {duration_secs}s), emitting single silence",
            visemes.len()
        );
        let mut track = TimingTrack::with_capacity(unit, 1);
        let span = unit.units(duration_secs).max(1);
        track.push(Viseme::Sil, 0, span);
        return track;
    }

    let per_viseme = duration_secs / visemes.len() as f64;
    let per_viseme_units = unit.units(per_viseme);

    log::debug!(
        "Uniform timing: {} visemes over {:.3}s ({:.3}s each, natural pace {:.3}s)",
        visemes.len(),
        duration_secs,
        per_viseme,
        natural_duration(visemes)
    );

    let mut track = TimingTrack::with_capacity(unit, visemes.len());
    let mut cursor = 0.0;
    for &viseme in visemes {
        track.push(viseme, unit.units(cursor), per_viseme_units);
        cursor += per_viseme;
    }
    track
}
