//! Data models for Neurotype entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `User`, `TokenResponse`: Identity and credentials
//! - `Note`, `NoteInput`, `NoteRef`: Journal entries
//! - `Dashboard`, `DailyEmotions`: Aggregated statistics
//! - `Emotion`, `EmotionCounts`, `EmotionSummary`: Mood classification
//! - `Plan`: Subscription tier

pub mod dashboard;
pub mod emotion;
pub mod note;
pub mod plan;
pub mod user;

pub use dashboard::{DailyEmotions, Dashboard};
pub use emotion::{Emotion, EmotionCounts, EmotionSummary};
pub use note::{Note, NoteInput, NoteRef};
pub use plan::Plan;
pub use user::{TokenResponse, User};

use serde::Deserialize;

/// Response of `GET /recommendations/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub recommendations: Vec<String>,
}
