use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lipsync::TimingTrack;

pub const MANIFEST_VERSION: &str = "2.0";
pub const MANIFEST_FILE: &str = "broadcast.json";

/// Where a segment's viseme timing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingSource {
    Uniform,
    Aligned,
}

impl std::fmt::Display for TimingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimingSource::Uniform => "uniform",
            TimingSource::Aligned => "aligned",
        })
    }
}

/// A segment that made it through synthesis and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSegment {
    pub id: String,
    /// Position in the input file, not in the manifest.
    pub index: usize,
    pub text: String,
    /// Audio file name, relative to the manifest.
    pub audio_file: String,
    /// Timing track file name, relative to the manifest.
    pub lipsync_file: String,
    /// Measured audio length in seconds.
    pub duration: f64,
    pub mood: String,
    pub view: String,
    pub gestures: Vec<Value>,
    pub rate: String,
    pub pitch: String,
    pub pause_before: f64,
    pub pause_after: f64,
    /// Where this segment's audio starts in the whole broadcast, in seconds.
    /// Set by [`BroadcastManifest::push`].
    #[serde(default)]
    pub start_time: f64,
    pub timing_source: TimingSource,
    pub lipsync: TimingTrack,
}

impl ProcessedSegment {
    /// Time this segment occupies in the broadcast, pauses included.
    pub fn span(&self) -> f64 {
        self.pause_before + self.duration + self.pause_after
    }
}

/// Index of a broadcast run, consumed by the avatar renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastManifest {
    pub version: String,
    #[serde(rename = "generated")]
    pub generated_at: DateTime<Utc>,
    pub voice: String,
    pub total_segments: usize,
    /// Seconds, including every segment's pauses.
    pub total_duration: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub segments: Vec<ProcessedSegment>,
}

impl BroadcastManifest {
    pub fn new(voice: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            generated_at: Utc::now(),
            voice: voice.into(),
            total_segments: 0,
            total_duration: 0.0,
            metadata,
            segments: Vec::new(),
        }
    }

    /// Append a completed segment, placing it after everything already pushed.
    pub fn push(&mut self, mut segment: ProcessedSegment) {
        segment.start_time = self.total_duration + segment.pause_before;
        self.total_duration += segment.span();
        self.segments.push(segment);
        self.total_segments = self.segments.len();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{BroadcastManifest, ProcessedSegment, TimingSource};
    use crate::lipsync::{lipsync_from_text, TimeUnit};
    use serde_json::{json, Map};

    fn processed(id: &str, index: usize, duration: f64, pause_after: f64) -> ProcessedSegment {
        ProcessedSegment {
            id: id.to_string(),
            index,
            text: "Hi.".to_string(),
            audio_file: format!("{id}.wav"),
            lipsync_file: format!("{id}_lipsync.json"),
            duration,
            mood: "neutral".to_string(),
            view: "upper".to_string(),
            gestures: Vec::new(),
            rate: "+0%".to_string(),
            pitch: "+0Hz".to_string(),
            pause_before: 0.25,
            pause_after,
            start_time: 0.0,
            timing_source: TimingSource::Uniform,
            lipsync: lipsync_from_text("Hi.", duration, TimeUnit::Samples(22050)),
        }
    }

    #[test]
    fn totals_include_pauses() {
        let mut manifest = BroadcastManifest::new("en-us", Map::new());
        manifest.push(processed("a", 0, 1.5, 0.5));
        manifest.push(processed("b", 2, 2.0, 1.0));
        assert_eq!(manifest.total_segments, 2);
        assert!((manifest.total_duration - 5.5).abs() < 1e-9);
        assert!((manifest.segments[0].start_time - 0.25).abs() < 1e-9);
        assert!((manifest.segments[1].start_time - 2.5).abs() < 1e-9);
        assert_eq!(manifest.segments[1].index, 2);
    }

    #[test]
    fn wire_field_names() {
        let mut metadata = Map::new();
        metadata.insert("title".to_string(), json!("Evening News"));
        let mut manifest = BroadcastManifest::new("en-us", metadata);
        manifest.push(processed("intro", 0, 1.0, 0.5));

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["version"], "2.0");
        assert!(value["generated"].is_string());
        assert_eq!(value["totalSegments"], 1);
        assert_eq!(value["metadata"]["title"], "Evening News");

        let seg = &value["segments"][0];
        assert_eq!(seg["audioFile"], "intro.wav");
        assert_eq!(seg["lipsyncFile"], "intro_lipsync.json");
        assert_eq!(seg["pauseBefore"], 0.25);
        assert_eq!(seg["timingSource"], "uniform");
        assert_eq!(seg["startTime"], 0.25);
        assert_eq!(seg["lipsync"]["sampleRate"], 22050);
    }

    #[test]
    fn written_manifest_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(super::MANIFEST_FILE);
        let mut manifest = BroadcastManifest::new("en-gb", Map::new());
        manifest.push(processed("a", 0, 0.8, 0.5));
        manifest.write(&path).unwrap();

        let loaded = BroadcastManifest::load(&path).unwrap();
        assert_eq!(loaded.generated_at, manifest.generated_at);
        assert_eq!(loaded.voice, "en-gb");
        assert_eq!(loaded.total_segments, 1);
        assert!((loaded.total_duration - manifest.total_duration).abs() < 1e-9);
        assert_eq!(loaded.segments[0].lipsync, manifest.segments[0].lipsync);
    }
}
