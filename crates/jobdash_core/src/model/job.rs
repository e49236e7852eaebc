//! Job posting record tracked by the dashboard.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type JobId = Uuid;

/// Pipeline stage of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Bookmarked, no application yet.
    Saved,
    Applied,
    Interviewing,
    Offer,
    Rejected,
    /// Hidden from active views.
    Archived,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::Applied => "applied",
            Self::Interviewing => "interviewing",
            Self::Offer => "offer",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company: String,
    pub title: String,
    pub skills: Vec<String>,
    pub status: JobStatus,
    /// Resume-to-job match percentage; `None` until calculated.
    pub match_score: Option<u8>,
    pub last_updated: i64,
}

impl Job {
    pub fn new(company: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            company: company.into(),
            title: title.into(),
            skills: Vec::new(),
            status: JobStatus::Saved,
            match_score: None,
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

    /// Short human label used in event titles.
    pub fn label(&self) -> String {
        format!("{} at {}", self.title, self.company)
    }
}

/// Partial update for a job. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub company: Option<String>,
    pub title: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl JobPatch {
    pub(crate) fn apply_to(&self, job: &mut Job) {
        if let Some(company) = &self.company {
            job.company = company.clone();
        }
        if let Some(title) = &self.title {
            job.title = title.clone();
        }
        if let Some(skills) = &self.skills {
            job.skills = skills.clone();
        }
    }
}
