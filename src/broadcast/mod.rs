//! Multi-segment broadcast generation.
//!
//! A broadcast is an ordered list of [`Segment`]s. Each segment is synthesized
//! to its own WAV file, given a viseme timing track, and recorded in a
//! [`BroadcastManifest`] that a renderer plays back in order.
//!
//! Per segment the output directory receives:
//!
//! - `<id>.wav` - the synthesized audio (`<id>_2.wav` etc. when ids collide)
//! - `<id>_lipsync.json` - the [`TimingTrack`](crate::lipsync::TimingTrack)
//! - `<id>_rhubarb.json` - the raw aligner report (aligned mode only)
//!
//! plus one `broadcast.json` manifest for the run.

pub mod config;
pub mod manifest;
pub mod orchestrator;
pub mod segment;

pub use config::{AlignmentFallback, BroadcastConfig, BroadcastConfigBuilder, TimingMode};
pub use manifest::{BroadcastManifest, ProcessedSegment, TimingSource, MANIFEST_FILE};
pub use orchestrator::{BroadcastRun, Orchestrator, SegmentOutcome, SegmentStage};
pub use segment::{sample_segments, BroadcastInput, Segment};
