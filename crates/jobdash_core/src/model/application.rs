//! Job application record.
//!
//! # Invariants
//! - `job_id` always refers to the job the application was created for; it is
//!   never re-pointed.

use crate::model::job::JobId;
use crate::model::resume::ResumeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ApplicationId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    Interviewing,
    Offered,
    Rejected,
    Withdrawn,
    /// Set when the target job was removed.
    Archived,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Interviewing => "interviewing",
            Self::Offered => "offered",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub resume_id: Option<ResumeId>,
    pub status: ApplicationStatus,
    pub notes: String,
    pub last_updated: i64,
}

impl Application {
    pub fn new(job_id: JobId, resume_id: Option<ResumeId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            resume_id,
            status: ApplicationStatus::Draft,
            notes: String::new(),
            last_updated: 0,
        }
    }
}
