use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::VoiceParams;

fn default_mood() -> String {
    "neutral".to_string()
}
fn default_view() -> String {
    "upper".to_string()
}
fn default_rate() -> String {
    crate::NEUTRAL_RATE.to_string()
}
fn default_pitch() -> String {
    crate::NEUTRAL_PITCH.to_string()
}
fn default_pause_after() -> f64 {
    0.5
}

/// One spoken unit of a broadcast, as authored in the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "script")]
    pub text: String,
    #[serde(default = "default_mood")]
    pub mood: String,
    #[serde(default = "default_view")]
    pub view: String,
    /// Opaque renderer gesture tags.
    #[serde(default)]
    pub gestures: Vec<Value>,
    #[serde(default = "default_rate")]
    pub rate: String,
    #[serde(default = "default_pitch")]
    pub pitch: String,
    /// Silence before the segment, in seconds.
    #[serde(default)]
    pub pause_before: f64,
    /// Silence after the segment, in seconds.
    #[serde(default = "default_pause_after")]
    pub pause_after: f64,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            id: None,
            text: String::new(),
            mood: default_mood(),
            view: default_view(),
            gestures: Vec::new(),
            rate: default_rate(),
            pitch: default_pitch(),
            pause_before: 0.0,
            pause_after: default_pause_after(),
        }
    }
}

impl Segment {
    /// The segment's id, or a positional placeholder.
    pub fn resolved_id(&self, index: usize) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("segment_{index:03}"),
        }
    }

    /// Script text with surrounding whitespace removed.
    pub fn spoken_text(&self) -> &str {
        self.text.trim()
    }

    pub fn has_text(&self) -> bool {
        !self.spoken_text().is_empty()
    }

    /// Voice parameters for this segment on top of the broadcast voice.
    pub fn voice_params(&self, voice: &str) -> VoiceParams {
        VoiceParams {
            voice: voice.to_string(),
            rate: self.rate.clone(),
            pitch: self.pitch.clone(),
        }
    }
}

/// Parsed segment input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastInput {
    pub segments: Vec<Segment>,
    /// Top-level fields other than the segment list, passed through to the manifest.
    pub metadata: Map<String, Value>,
}

impl BroadcastInput {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            metadata: Map::new(),
        }
    }

    /// Parse either a bare segment list or an object holding one under
    /// `segments` (preferred) or `items`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        match root {
            Value::Array(_) => Ok(Self::new(serde_json::from_value(root)?)),
            Value::Object(mut fields) => {
                let list = fields
                    .remove("segments")
                    .or_else(|| fields.remove("items"))
                    .unwrap_or_else(|| Value::Array(Vec::new()));
                // Both keys are reserved even when only one held the list.
                fields.remove("items");
                let segments = serde_json::from_value(list)?;
                Ok(Self {
                    segments,
                    metadata: fields,
                })
            }
            other => Err(serde::de::Error::custom(format!(
                "expected a list of segments or an object with a `segments` key, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Number of segments that have something to say.
    pub fn usable_count(&self) -> usize {
        self.segments.iter().filter(|s| s.has_text()).count()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// A small newscast used by `lipsync-broadcast sample`.
pub fn sample_segments() -> Vec<Segment> {
    let segment = |id: &str, text: &str, mood: &str, view: &str, gesture: Option<&str>, pause| {
        Segment {
            id: Some(id.to_string()),
            text: text.to_string(),
            mood: mood.to_string(),
            view: view.to_string(),
            gestures: gesture.map(Value::from).into_iter().collect(),
            pause_after: pause,
            ..Segment::default()
        }
    };
    vec![
        segment(
            "intro",
            "Good evening and welcome to the evening news. I'm Sarah, and here are tonight's top stories.",
            "neutral",
            "upper",
            Some("👋"),
            1.0,
        ),
        segment(
            "story_1",
            "In breaking news tonight, scientists have announced a major breakthrough in renewable energy technology.",
            "neutral",
            "upper",
            None,
            0.5,
        ),
        segment(
            "story_1_detail",
            "The new solar panel design promises to be thirty percent more efficient than current models.",
            "happy",
            "mid",
            Some("👍"),
            1.0,
        ),
        segment(
            "transition",
            "Moving on to international news.",
            "neutral",
            "upper",
            None,
            0.5,
        ),
        segment(
            "story_2",
            "World leaders gathered today for the annual climate summit, discussing new targets for emissions reduction.",
            "neutral",
            "upper",
            None,
            0.5,
        ),
        segment(
            "outro",
            "That's all for tonight's news. Thank you for watching, and we'll see you tomorrow. Good night.",
            "happy",
            "upper",
            Some("👋"),
            0.0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{sample_segments, BroadcastInput, Segment};

    #[test]
    fn bare_list_with_defaults() {
        let json = r#"[{"text": "Hello."}, {"id": "b", "text": "Bye."}]"#;
        let input = BroadcastInput::from_json(json).unwrap();
        assert_eq!(input.segments.len(), 2);
        assert!(input.metadata.is_empty());

        let first = &input.segments[0];
        assert_eq!(first.resolved_id(0), "segment_000");
        assert_eq!(first.mood, "neutral");
        assert_eq!(first.view, "upper");
        assert_eq!(first.pause_before, 0.0);
        assert_eq!(first.pause_after, 0.5);
        assert_eq!(first.rate, "+0%");
        assert_eq!(first.pitch, "+0Hz");
        assert_eq!(input.segments[1].resolved_id(1), "b");
    }

    #[test]
    fn object_root_keeps_metadata() {
        let json = r#"{
            "title": "Evening News",
            "date": "2026-10-19",
            "segments": [
                {"id": "intro", "text": "Hi", "pauseBefore": 0.25, "pauseAfter": 1.0,
                 "gestures": ["👋"], "rate": "+10%", "pitch": "-2Hz"}
            ]
        }"#;
        let input = BroadcastInput::from_json(json).unwrap();
        assert_eq!(input.metadata.len(), 2);
        assert_eq!(input.metadata["title"], "Evening News");

        let seg = &input.segments[0];
        assert_eq!(seg.pause_before, 0.25);
        assert_eq!(seg.pause_after, 1.0);
        assert_eq!(seg.gestures.len(), 1);
        let voice = seg.voice_params("en-gb");
        assert_eq!(voice.voice, "en-gb");
        assert_eq!(voice.rate_percent(), 10.0);
        assert_eq!(voice.pitch_hz(), -2.0);
    }

    #[test]
    fn items_key_and_script_alias() {
        let input =
            BroadcastInput::from_json(r#"{"items": [{"id": "x", "script": "Words."}], "show": 7}"#)
                .unwrap();
        assert_eq!(input.segments[0].text, "Words.");
        assert!(!input.metadata.contains_key("items"));
        assert_eq!(input.metadata["show"], 7);
    }

    #[test]
    fn object_without_list_has_no_segments() {
        let input = BroadcastInput::from_json(r#"{"title": "Empty"}"#).unwrap();
        assert!(input.segments.is_empty());
        assert_eq!(input.usable_count(), 0);
    }

    #[test]
    fn scalar_root_is_rejected() {
        let err = BroadcastInput::from_json("42").unwrap_err();
        assert!(err.to_string().contains("a number"));
        assert!(BroadcastInput::from_json("[{\"text\": 5}]").is_err());
    }

    #[test]
    fn blank_ids_and_texts() {
        let seg = Segment {
            id: Some("  ".to_string()),
            text: "   ".to_string(),
            ..Segment::default()
        };
        assert_eq!(seg.resolved_id(12), "segment_012");
        assert!(!seg.has_text());
    }

    #[test]
    fn sample_round_trips_as_input() {
        let json = serde_json::to_string_pretty(&sample_segments()).unwrap();
        let input = BroadcastInput::from_json(&json).unwrap();
        assert_eq!(input.segments, sample_segments());
        assert_eq!(input.usable_count(), 6);
    }
}
