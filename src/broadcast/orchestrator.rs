use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::alignment::{lipsync_from_audio, Aligner, RhubarbAligner};
use crate::error::{BroadcastError, SegmentError};
use crate::lipsync::{lipsync_from_text, TimingTrack};
use crate::SynthesisEngine;

use super::config::{AlignmentFallback, BroadcastConfig, TimingMode};
use super::manifest::{BroadcastManifest, ProcessedSegment, TimingSource, MANIFEST_FILE};
use super::segment::{BroadcastInput, Segment};

/// Progress of one segment through the pipeline.
///
/// ```text
/// Pending → Synthesizing → Timing → Complete
///    ↘            ↘           ↘
///                Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStage {
    Pending,
    Synthesizing,
    Timing,
    Complete,
    Failed,
}

impl SegmentStage {
    /// Returns `true` if a transition from `self` to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Synthesizing)
                | (Self::Synthesizing, Self::Timing)
                | (Self::Timing, Self::Complete)
                | (Self::Pending, Self::Failed)
                | (Self::Synthesizing, Self::Failed)
                | (Self::Timing, Self::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for SegmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Synthesizing => "synthesizing",
            Self::Timing => "timing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Final state of one input segment.
#[derive(Debug)]
pub enum SegmentOutcome {
    Complete {
        index: usize,
        id: String,
    },
    Failed {
        index: usize,
        id: String,
        /// Stage the segment was in when it failed.
        stage: SegmentStage,
        error: SegmentError,
    },
}

impl SegmentOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Complete { index, .. } | Self::Failed { index, .. } => *index,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Complete { id, .. } | Self::Failed { id, .. } => id,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Everything a broadcast run produced.
#[derive(Debug)]
pub struct BroadcastRun {
    pub manifest: BroadcastManifest,
    pub manifest_path: PathBuf,
    /// One entry per input segment, in input order.
    pub outcomes: Vec<SegmentOutcome>,
}

impl BroadcastRun {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_complete()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SegmentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_complete())
    }
}

/// Bookkeeping for the segment currently being processed.
struct SegmentJob {
    index: usize,
    id: String,
    stage: SegmentStage,
}

impl SegmentJob {
    fn new(index: usize, id: String) -> Self {
        Self {
            index,
            id,
            stage: SegmentStage::Pending,
        }
    }

    fn advance(&mut self, next: SegmentStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid segment transition {} -> {}",
            self.stage,
            next
        );
        log::debug!("Segment {} ({}): {} -> {}", self.index, self.id, self.stage, next);
        self.stage = next;
    }

    fn complete(mut self) -> SegmentOutcome {
        self.advance(SegmentStage::Complete);
        SegmentOutcome::Complete {
            index: self.index,
            id: self.id,
        }
    }

    fn fail(self, error: SegmentError) -> SegmentOutcome {
        let stage = self.stage;
        log::debug!("Segment {} ({}): {} -> {}", self.index, self.id, stage, SegmentStage::Failed);
        SegmentOutcome::Failed {
            index: self.index,
            id: self.id,
            stage,
            error,
        }
    }
}

/// Drives a list of segments through synthesis and viseme timing.
///
/// Segments are processed one at a time in input order. A failing segment is
/// recorded in [`BroadcastRun::outcomes`] and left out of the manifest; it
/// never stops the rest of the batch.
pub struct Orchestrator<E: SynthesisEngine> {
    engine: E,
    aligner: Box<dyn Aligner>,
    config: BroadcastConfig,
}

impl<E: SynthesisEngine> Orchestrator<E> {
    /// Create an orchestrator that aligns with Rhubarb's default settings.
    pub fn new(engine: E, config: BroadcastConfig) -> Self {
        Self {
            engine,
            aligner: Box::new(RhubarbAligner::default()),
            config,
        }
    }

    /// Replace the aligner used in [`TimingMode::Aligned`].
    pub fn with_aligner<A: Aligner + 'static>(mut self, aligner: A) -> Self {
        self.aligner = Box::new(aligner);
        self
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Read a segment file and run it.
    pub fn run_file(&mut self, path: &Path) -> Result<BroadcastRun, BroadcastError> {
        let content = fs::read_to_string(path).map_err(|source| BroadcastError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        let input =
            BroadcastInput::from_json(&content).map_err(|source| BroadcastError::InvalidInput {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Loaded {} segments from {}", input.segments.len(), path.display());
        self.run(input)
    }

    /// Process every segment and write the manifest.
    ///
    /// The manifest is written even when no segment completes; callers decide
    /// whether an empty broadcast is an error.
    pub fn run(&mut self, input: BroadcastInput) -> Result<BroadcastRun, BroadcastError> {
        let total = input.segments.len();
        if input.usable_count() == 0 {
            return Err(BroadcastError::NoUsableSegments { total });
        }

        let output_dir = self.config.output_dir.clone();
        fs::create_dir_all(&output_dir).map_err(|source| BroadcastError::Output {
            path: output_dir.clone(),
            source,
        })?;

        log::info!(
            "Generating broadcast: {} segments, voice {}, {} timing, output {}",
            total,
            self.config.voice,
            self.config.timing_mode,
            output_dir.display()
        );

        let BroadcastInput { segments, metadata } = input;
        let mut manifest = BroadcastManifest::new(self.config.voice.clone(), metadata);
        let mut outcomes = Vec::with_capacity(total);
        let mut stems = HashSet::new();

        for (index, segment) in segments.iter().enumerate() {
            let mut job = SegmentJob::new(index, segment.resolved_id(index));
            match self.process_segment(&mut job, segment, &mut stems) {
                Ok(processed) => {
                    manifest.push(processed);
                    outcomes.push(job.complete());
                }
                Err(SegmentError::EmptyText) => {
                    log::info!("Skipping segment {} ({}): no text", index, job.id);
                    outcomes.push(job.fail(SegmentError::EmptyText));
                }
                Err(error) => {
                    log::warn!(
                        "Segment {} ({}) failed while {}: {}",
                        index,
                        job.id,
                        job.stage,
                        error
                    );
                    outcomes.push(job.fail(error));
                }
            }
        }

        let manifest_path = output_dir.join(MANIFEST_FILE);
        manifest
            .write(&manifest_path)
            .map_err(|source| BroadcastError::Output {
                path: manifest_path.clone(),
                source,
            })?;

        if manifest.total_segments == 0 {
            log::warn!("No segments completed; wrote empty manifest {}", manifest_path.display());
        } else {
            log::info!(
                "Broadcast complete: {} of {} segments, {:.1}s total, manifest {}",
                manifest.total_segments,
                total,
                manifest.total_duration,
                manifest_path.display()
            );
        }

        Ok(BroadcastRun {
            manifest,
            manifest_path,
            outcomes,
        })
    }

    fn process_segment(
        &mut self,
        job: &mut SegmentJob,
        segment: &Segment,
        stems: &mut HashSet<String>,
    ) -> Result<ProcessedSegment, SegmentError> {
        let text = segment.spoken_text();
        if text.is_empty() {
            return Err(SegmentError::EmptyText);
        }
        log::info!("Processing segment {} ({}): {}", job.index, job.id, preview(text));

        let stem = unique_stem(&job.id, stems);
        let audio_file = format!("{stem}.wav");
        let audio_path = self.config.output_dir.join(&audio_file);

        job.advance(SegmentStage::Synthesizing);
        let voice = segment.voice_params(&self.config.voice);
        let audio = self
            .engine
            .synthesize_to_file(text, &voice, &audio_path)
            .map_err(|e| SegmentError::Synthesis(e.to_string()))?;
        let duration = audio.duration_secs();
        if duration <= 0.0 {
            if let Err(e) = fs::remove_file(&audio_path) {
                log::debug!("Could not remove empty audio {}: {}", audio_path.display(), e);
            }
            return Err(SegmentError::Synthesis("engine produced no audio".to_string()));
        }
        log::debug!("Wrote {:.2}s of audio to {}", duration, audio_path.display());

        job.advance(SegmentStage::Timing);
        let (lipsync, timing_source) = self.time_segment(&stem, text, &audio_path, duration)?;
        let lipsync_file = format!("{stem}_lipsync.json");
        let lipsync_path = self.config.output_dir.join(&lipsync_file);
        lipsync
            .write_json(&lipsync_path)
            .map_err(|source| SegmentError::Artifact {
                path: lipsync_path.clone(),
                source,
            })?;
        log::debug!(
            "Wrote {} visemes ({} timing) to {}",
            lipsync.len(),
            timing_source,
            lipsync_path.display()
        );

        Ok(ProcessedSegment {
            id: job.id.clone(),
            index: job.index,
            text: text.to_string(),
            audio_file,
            lipsync_file,
            duration,
            mood: segment.mood.clone(),
            view: segment.view.clone(),
            gestures: segment.gestures.clone(),
            rate: segment.rate.clone(),
            pitch: segment.pitch.clone(),
            pause_before: segment.pause_before,
            pause_after: segment.pause_after,
            start_time: 0.0,
            timing_source,
            lipsync,
        })
    }

    fn time_segment(
        &self,
        stem: &str,
        text: &str,
        audio_path: &Path,
        duration: f64,
    ) -> Result<(TimingTrack, TimingSource), SegmentError> {
        let unit = self.config.time_unit();
        if self.config.timing_mode == TimingMode::Uniform {
            return Ok((lipsync_from_text(text, duration, unit), TimingSource::Uniform));
        }

        let report_path = self.config.output_dir.join(format!("{stem}_rhubarb.json"));
        let aligned =
            lipsync_from_audio(&*self.aligner, audio_path, Some(text), &report_path, unit);

        match (aligned, self.config.alignment_fallback) {
            (Ok(track), _) => Ok((track, TimingSource::Aligned)),
            (Err(err), AlignmentFallback::Uniform) => {
                log::warn!(
                    "Alignment failed for {}: {}; using uniform timing",
                    audio_path.display(),
                    err
                );
                Ok((lipsync_from_text(text, duration, unit), TimingSource::Uniform))
            }
            (Err(err), AlignmentFallback::Fail) => Err(err.into()),
        }
    }
}

/// File-name-safe form of a segment id.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File stem for `id` that no earlier segment of the run has claimed.
///
/// Distinct ids can sanitize to the same stem and ids may repeat; later
/// claimants get `_2`, `_3`, ... Compared case-insensitively.
fn unique_stem(id: &str, used: &mut HashSet<String>) -> String {
    let base = file_stem(id);
    let mut stem = base.clone();
    let mut n = 2;
    while !used.insert(stem.to_ascii_lowercase()) {
        stem = format!("{base}_{n}");
        n += 1;
    }
    if stem != base {
        log::warn!("Segment id {id:?} is already taken; writing its files as {stem}");
    }
    stem
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 60;
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}
