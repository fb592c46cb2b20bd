use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the four moods the backend classifies notes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Emotion {
    Happy,
    Calm,
    Sad,
    Upset,
    #[default]
    Unknown,
}

impl Emotion {
    /// The emotions in display order (matches the dashboard columns)
    pub const ALL: [Emotion; 4] = [Emotion::Happy, Emotion::Calm, Emotion::Sad, Emotion::Upset];

    pub fn from_str(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("happy") => Emotion::Happy,
            Some("calm") => Emotion::Calm,
            Some("sad") => Emotion::Sad,
            Some("upset") => Emotion::Upset,
            _ => Emotion::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Calm => "calm",
            Emotion::Sad => "sad",
            Emotion::Upset => "upset",
            Emotion::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Emotion::Happy => "Happy",
            Emotion::Calm => "Calm",
            Emotion::Sad => "Sad",
            Emotion::Upset => "Upset",
            Emotion::Unknown => "No data",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Happy => "😊",
            Emotion::Calm => "😌",
            Emotion::Sad => "😢",
            Emotion::Upset => "😠",
            Emotion::Unknown => "❓",
        }
    }

    /// Heatmap colour as RGB
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Emotion::Happy => (0x34, 0xD3, 0x99),
            Emotion::Calm => (0x60, 0xA5, 0xFA),
            Emotion::Sad => (0xFB, 0xBF, 0x24),
            Emotion::Upset => (0xEF, 0x44, 0x44),
            Emotion::Unknown => (0xE5, 0xE7, 0xEB),
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// The backend sends free-form strings; anything unrecognized becomes Unknown
// instead of failing the whole payload.
impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(Emotion::from_str(raw.as_deref()))
    }
}

impl Serialize for Emotion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-emotion note counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCounts {
    #[serde(default)]
    pub happy: u32,
    #[serde(default)]
    pub calm: u32,
    #[serde(default)]
    pub sad: u32,
    #[serde(default)]
    pub upset: u32,
}

impl EmotionCounts {
    pub fn get(&self, emotion: Emotion) -> u32 {
        match emotion {
            Emotion::Happy => self.happy,
            Emotion::Calm => self.calm,
            Emotion::Sad => self.sad,
            Emotion::Upset => self.upset,
            Emotion::Unknown => 0,
        }
    }

    pub fn total(&self) -> u64 {
        Emotion::ALL.iter().map(|e| u64::from(self.get(*e))).sum()
    }

    /// Largest single count, used to scale chart bars
    pub fn max(&self) -> u32 {
        Emotion::ALL.iter().map(|e| self.get(*e)).max().unwrap_or(0)
    }
}

/// One row of `GET /notes/emotions-summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub prevalent_emotion: Emotion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_from_str() {
        assert_eq!(Emotion::from_str(Some("happy")), Emotion::Happy);
        assert_eq!(Emotion::from_str(Some("CALM")), Emotion::Calm);
        assert_eq!(Emotion::from_str(Some(" sad ")), Emotion::Sad);
        assert_eq!(Emotion::from_str(Some("upset")), Emotion::Upset);
        assert_eq!(Emotion::from_str(Some("angry")), Emotion::Unknown);
        assert_eq!(Emotion::from_str(None), Emotion::Unknown);
    }

    #[test]
    fn test_emotion_deserialize_tolerates_unknown_and_null() {
        let e: Emotion = serde_json::from_str("\"happy\"").unwrap();
        assert_eq!(e, Emotion::Happy);
        let e: Emotion = serde_json::from_str("\"bored\"").unwrap();
        assert_eq!(e, Emotion::Unknown);
        let e: Emotion = serde_json::from_str("null").unwrap();
        assert_eq!(e, Emotion::Unknown);
    }

    #[test]
    fn test_emotion_summary_parse() {
        let json = r#"[{"date": "2024-10-01", "prevalent_emotion": "calm"},
                       {"date": "2024-10-02", "prevalent_emotion": null}]"#;
        let rows: Vec<EmotionSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert_eq!(rows[0].prevalent_emotion, Emotion::Calm);
        assert_eq!(rows[1].prevalent_emotion, Emotion::Unknown);
    }

    #[test]
    fn test_emotion_counts() {
        let counts = EmotionCounts { happy: 3, calm: 1, sad: 0, upset: 5 };
        assert_eq!(counts.total(), 9);
        assert_eq!(counts.max(), 5);
        assert_eq!(counts.get(Emotion::Unknown), 0);

        let huge = EmotionCounts { happy: u32::MAX, calm: u32::MAX, sad: 2, upset: 0 };
        assert_eq!(huge.total(), 2 * u64::from(u32::MAX) + 2);
    }
}
