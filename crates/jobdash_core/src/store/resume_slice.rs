//! Resume slice.
//!
//! # Invariants
//! - `version` is bumped on every `update`; `restore` puts back the exact
//!   pre-image including its version.

use super::{SliceContext, StoreError, StoreResult};
use crate::deps::EntityKind;
use crate::model::event::{EventInput, RESUME_EVENT};
use crate::model::resume::{Resume, ResumeId, ResumePatch};
use serde_json::json;
use std::collections::BTreeMap;

pub struct ResumeSlice {
    ctx: SliceContext,
    resumes: BTreeMap<ResumeId, Resume>,
}

impl ResumeSlice {
    pub(crate) fn new(ctx: SliceContext) -> Self {
        Self {
            ctx,
            resumes: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: ResumeId) -> Option<&Resume> {
        self.resumes.get(&id)
    }

    pub fn contains(&self, id: ResumeId) -> bool {
        self.resumes.contains_key(&id)
    }

    /// Lists resumes, most recently updated first.
    pub fn list(&self) -> Vec<&Resume> {
        let mut resumes: Vec<&Resume> = self.resumes.values().collect();
        resumes.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        resumes
    }

    pub fn len(&self) -> usize {
        self.resumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resumes.is_empty()
    }

    pub fn add(&mut self, mut resume: Resume) -> StoreResult<Resume> {
        if self.resumes.contains_key(&resume.id) {
            return Err(StoreError::duplicate(EntityKind::Resume, resume.id));
        }
        resume.version = resume.version.max(1);
        resume.last_updated = self.ctx.now();
        self.resumes.insert(resume.id, resume.clone());

        self.ctx.emit(
            EventInput::new(RESUME_EVENT, format!("Resume added: {}", resume.title))
                .with_description("A new resume is available for applications.")
                .with_data(json!({ "resume_id": resume.id })),
        );
        Ok(resume)
    }

    /// Applies `patch` and bumps the version.
    pub fn update(&mut self, id: ResumeId, patch: &ResumePatch) -> StoreResult<Resume> {
        let now = self.ctx.now();
        let resume = self
            .resumes
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Resume, id))?;
        patch.apply_to(resume);
        resume.version += 1;
        resume.last_updated = now;
        let updated = resume.clone();

        self.ctx.emit(
            EventInput::new(RESUME_EVENT, format!("Resume updated: {}", updated.title))
                .with_description(format!("Resume is now at version {}.", updated.version))
                .with_data(json!({ "resume_id": id, "version": updated.version })),
        );
        Ok(updated)
    }

    pub fn delete(&mut self, id: ResumeId) -> StoreResult<()> {
        let removed = self
            .resumes
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Resume, id))?;

        self.ctx.emit(
            EventInput::new(RESUME_EVENT, format!("Resume deleted: {}", removed.title))
                .with_data(json!({ "resume_id": id })),
        );
        Ok(())
    }

    /// Puts back a captured pre-image, inserting or overwriting.
    pub fn restore(&mut self, pre_image: Resume) -> Resume {
        self.resumes.insert(pre_image.id, pre_image.clone());
        self.ctx.emit(
            EventInput::new(RESUME_EVENT, format!("Resume restored: {}", pre_image.title))
                .with_data(json!({ "resume_id": pre_image.id, "version": pre_image.version })),
        );
        pre_image
    }

    pub(crate) fn snapshot(&self) -> Vec<Resume> {
        self.resumes.values().cloned().collect()
    }

    pub(crate) fn load_snapshot(&mut self, records: Vec<Resume>) {
        self.resumes = records
            .into_iter()
            .map(|resume| (resume.id, resume))
            .collect();
    }
}
