//! Resume and resume score records.
//!
//! # Invariants
//! - `version` increases by one on every applied update.
//! - A `ResumeScore` is keyed by the resume it scores; `stale` marks a score
//!   that must be recomputed before display.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ResumeId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: ResumeId,
    pub title: String,
    pub content: String,
    pub skills: Vec<String>,
    /// Bumped on every update so stale writes can be detected.
    pub version: u32,
    /// Unix epoch milliseconds of the last applied mutation.
    pub last_updated: i64,
}

impl Resume {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a resume with a caller-provided id (import paths).
    pub fn with_id(id: ResumeId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            skills: Vec::new(),
            version: 1,
            last_updated: 0,
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for a resume. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl ResumePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.skills.is_none()
    }

    pub(crate) fn apply_to(&self, resume: &mut Resume) {
        if let Some(title) = &self.title {
            resume.title = title.clone();
        }
        if let Some(content) = &self.content {
            resume.content = content.clone();
        }
        if let Some(skills) = &self.skills {
            resume.skills = skills.clone();
        }
    }
}

/// Cached quality score of one resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeScore {
    pub resume_id: ResumeId,
    /// 0..=100; `None` until a scorer has produced a value.
    pub value: Option<u8>,
    pub stale: bool,
    pub last_updated: i64,
}
