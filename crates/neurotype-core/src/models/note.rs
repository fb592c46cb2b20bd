use serde::{Deserialize, Serialize};

use super::Emotion;
use crate::utils::{format_date, truncate_string};

/// Maximum characters of note text shown in list previews
const PREVIEW_LENGTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub emotion: Option<Emotion>,
}

impl Note {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled Note")
    }

    /// Single-line preview of the body for list views
    pub fn preview(&self) -> String {
        let flat: String = self
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        truncate_string(&flat, PREVIEW_LENGTH)
    }

    pub fn created_display(&self) -> String {
        self.created_at.as_deref().map(format_date).unwrap_or_default()
    }
}

/// Body of `POST /notes/` and `PUT /notes/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct NoteInput {
    pub text: String,
}

/// Target of the note detail route: an existing note or a fresh draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteRef {
    New,
    Id(i64),
}

impl NoteRef {
    pub fn parse(s: &str) -> Option<Self> {
        if s == "new" {
            Some(NoteRef::New)
        } else {
            s.parse().ok().map(NoteRef::Id)
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, NoteRef::New)
    }
}

impl std::fmt::Display for NoteRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteRef::New => write!(f, "new"),
            NoteRef::Id(id) => write!(f, "{}", id),
        }
    }
}
