use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Emotion, EmotionCounts, Plan};

/// Response of `GET /dashboard/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub total_notes: u32,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub prevalent_emotion_today: Option<Emotion>,
    #[serde(default)]
    pub emotion_counts: EmotionCounts,
    #[serde(default)]
    pub weekly_emotion_data: Vec<DailyEmotions>,
}

impl Dashboard {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("there")
    }

    /// Chat is a Plus-plan feature; the shortcut is only offered on that plan.
    pub fn chat_enabled(&self) -> bool {
        self.plan == Some(Plan::Plus)
    }

    pub fn prevalent_today(&self) -> Emotion {
        self.prevalent_emotion_today.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyEmotions {
    pub date: String,
    #[serde(default)]
    pub emotions: EmotionCounts,
}

impl DailyEmotions {
    /// Short chart label such as "Oct 3".
    /// Accepts plain dates and RFC 3339 timestamps; anything else is shown as-is.
    pub fn label(&self) -> String {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(&self.date).ok().map(|dt| dt.date_naive()));
        match date {
            Some(d) => d.format("%b %-d").to_string(),
            None => self.date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dashboard() {
        let json = r#"{
            "name": "Ada",
            "total_notes": 12,
            "plan": "plus",
            "profile_photo_url": null,
            "prevalent_emotion_today": "happy",
            "emotion_counts": {"happy": 4, "calm": 3, "sad": 1, "upset": 0},
            "weekly_emotion_data": [
                {"date": "2024-10-03", "emotions": {"happy": 1, "calm": 0, "sad": 0, "upset": 0}}
            ]
        }"#;
        let dashboard: Dashboard = serde_json::from_str(json).unwrap();
        assert_eq!(dashboard.display_name(), "Ada");
        assert_eq!(dashboard.total_notes, 12);
        assert!(dashboard.chat_enabled());
        assert_eq!(dashboard.prevalent_today(), Emotion::Happy);
        assert_eq!(dashboard.emotion_counts.total(), 8);
        assert_eq!(dashboard.weekly_emotion_data[0].label(), "Oct 3");
    }

    #[test]
    fn test_dashboard_defaults() {
        let dashboard: Dashboard = serde_json::from_str("{}").unwrap();
        assert_eq!(dashboard.display_name(), "there");
        assert!(!dashboard.chat_enabled());
        assert_eq!(dashboard.prevalent_today(), Emotion::Unknown);
    }

    #[test]
    fn test_daily_label_formats() {
        let rfc = DailyEmotions {
            date: "2024-01-15T10:00:00+00:00".to_string(),
            emotions: EmotionCounts::default(),
        };
        assert_eq!(rfc.label(), "Jan 15");

        let odd = DailyEmotions {
            date: "yesterday".to_string(),
            emotions: EmotionCounts::default(),
        };
        assert_eq!(odd.label(), "yesterday");
    }
}
