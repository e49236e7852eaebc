//! Resume score cache slice.
//!
//! Scores are keyed by resume id. Invalidation upserts a stale row, so it is
//! valid for resumes that were never scored.

use super::SliceContext;
use crate::model::event::{EventInput, SYSTEM_EVENT};
use crate::model::resume::{ResumeId, ResumeScore};
use serde_json::json;
use std::collections::BTreeMap;

const MAX_SCORE: u8 = 100;

pub struct ScoreSlice {
    ctx: SliceContext,
    scores: BTreeMap<ResumeId, ResumeScore>,
}

impl ScoreSlice {
    pub(crate) fn new(ctx: SliceContext) -> Self {
        Self {
            ctx,
            scores: BTreeMap::new(),
        }
    }

    pub fn get(&self, resume_id: ResumeId) -> Option<&ResumeScore> {
        self.scores.get(&resume_id)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Stores a fresh score, clamped to 0..=100.
    pub fn record(&mut self, resume_id: ResumeId, value: u8) -> ResumeScore {
        let score = ResumeScore {
            resume_id,
            value: Some(value.min(MAX_SCORE)),
            stale: false,
            last_updated: self.ctx.now(),
        };
        self.scores.insert(resume_id, score.clone());
        self.ctx.emit(
            EventInput::new(SYSTEM_EVENT, format!("Resume scored {}", value.min(MAX_SCORE)))
                .with_data(json!({ "resume_id": resume_id })),
        );
        score
    }

    /// Marks the score of `resume_id` stale, keeping any previous value.
    pub fn invalidate(&mut self, resume_id: ResumeId) -> ResumeScore {
        let now = self.ctx.now();
        let score = self
            .scores
            .entry(resume_id)
            .or_insert_with(|| ResumeScore {
                resume_id,
                value: None,
                stale: true,
                last_updated: now,
            });
        score.stale = true;
        score.last_updated = now;
        let invalidated = score.clone();

        self.ctx.emit(
            EventInput::new(SYSTEM_EVENT, "Resume score needs refresh")
                .with_description("The resume changed since it was last scored.")
                .with_data(json!({ "resume_id": resume_id })),
        );
        invalidated
    }

    /// Drops the score row. Returns `None` (and emits nothing) when absent.
    pub fn remove(&mut self, resume_id: ResumeId) -> Option<ResumeScore> {
        let removed = self.scores.remove(&resume_id)?;
        self.ctx.emit(
            EventInput::new(SYSTEM_EVENT, "Resume score removed")
                .with_data(json!({ "resume_id": resume_id })),
        );
        Some(removed)
    }

    /// Puts back the captured pre-image; `None` means "there was no row".
    pub fn restore(&mut self, resume_id: ResumeId, pre_image: Option<ResumeScore>) {
        match pre_image {
            Some(score) => {
                self.scores.insert(resume_id, score);
            }
            None => {
                self.scores.remove(&resume_id);
            }
        }
        self.ctx.emit(
            EventInput::new(SYSTEM_EVENT, "Resume score restored")
                .with_data(json!({ "resume_id": resume_id })),
        );
    }

    pub(crate) fn snapshot(&self) -> Vec<ResumeScore> {
        self.scores.values().cloned().collect()
    }

    pub(crate) fn load_snapshot(&mut self, records: Vec<ResumeScore>) {
        self.scores = records
            .into_iter()
            .map(|score| (score.resume_id, score))
            .collect();
    }
}
