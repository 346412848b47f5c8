use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Mouth-shape classes understood by the avatar renderer.
///
/// This is the 15-member Oculus viseme set, `sil` included. Wire names match
/// the renderer's (`"PP"`, `"kk"`, `"aa"`, ...), so they are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viseme {
    Sil,
    Pp,
    Ff,
    Th,
    Dd,
    Kk,
    Ch,
    Ss,
    Nn,
    Rr,
    Aa,
    E,
    I,
    O,
    U,
}

impl Viseme {
    /// Every viseme, in renderer order.
    pub const ALL: [Viseme; 15] = [
        Viseme::Sil,
        Viseme::Pp,
        Viseme::Ff,
        Viseme::Th,
        Viseme::Dd,
        Viseme::Kk,
        Viseme::Ch,
        Viseme::Ss,
        Viseme::Nn,
        Viseme::Rr,
        Viseme::Aa,
        Viseme::E,
        Viseme::I,
        Viseme::O,
        Viseme::U,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Viseme::Sil => "sil",
            Viseme::Pp => "PP",
            Viseme::Ff => "FF",
            Viseme::Th => "TH",
            Viseme::Dd => "DD",
            Viseme::Kk => "kk",
            Viseme::Ch => "CH",
            Viseme::Ss => "SS",
            Viseme::Nn => "nn",
            Viseme::Rr => "RR",
            Viseme::Aa => "aa",
            Viseme::E => "E",
            Viseme::I => "I",
            Viseme::O => "O",
            Viseme::U => "U",
        }
    }

    /// Typical natural duration of this mouth shape at a normal speaking rate, in seconds.
    ///
    /// Uniform timing does not weight by this; see [`crate::lipsync::timing`].
    pub fn typical_duration(&self) -> f64 {
        match self {
            Viseme::Sil | Viseme::Pp | Viseme::Kk | Viseme::Nn | Viseme::Rr => 0.08,
            Viseme::Ff | Viseme::Ch | Viseme::Ss | Viseme::E | Viseme::I => 0.10,
            Viseme::Th => 0.09,
            Viseme::Dd => 0.07,
            Viseme::Aa | Viseme::O => 0.12,
            Viseme::U => 0.11,
        }
    }

    pub fn is_silence(&self) -> bool {
        matches!(self, Viseme::Sil)
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viseme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Viseme::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown viseme {s:?}"))
    }
}

impl Serialize for Viseme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Viseme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Sum of typical durations for a viseme sequence, in seconds.
pub fn natural_duration(visemes: &[Viseme]) -> f64 {
    visemes.iter().map(Viseme::typical_duration).sum()
}

#[cfg(test)]
mod tests {
    use super::{natural_duration, Viseme};

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for viseme in Viseme::ALL {
            assert_eq!(viseme.as_str().parse::<Viseme>(), Ok(viseme));
        }
    }

    #[test]
    fn wire_names_are_case_sensitive() {
        assert!("KK".parse::<Viseme>().is_err());
        assert!("SIL".parse::<Viseme>().is_err());
        assert_eq!("kk".parse::<Viseme>(), Ok(Viseme::Kk));
    }

    #[test]
    fn serializes_as_renderer_name() {
        let json = serde_json::to_string(&[Viseme::Sil, Viseme::Aa, Viseme::Pp]).unwrap();
        assert_eq!(json, r#"["sil","aa","PP"]"#);
    }

    #[test]
    fn open_vowels_are_longest_shapes() {
        assert_eq!(Viseme::Aa.typical_duration(), 0.12);
        assert_eq!(Viseme::Dd.typical_duration(), 0.07);
        let total = natural_duration(&[Viseme::Sil, Viseme::Aa, Viseme::Sil]);
        assert!((total - 0.28).abs() < 1e-9);
    }
}
