//! Tracked job slice.

use super::{SliceContext, StoreError, StoreResult};
use crate::deps::EntityKind;
use crate::model::event::{EventInput, JOB_EVENT};
use crate::model::job::{Job, JobId, JobPatch, JobStatus};
use serde_json::json;
use std::collections::BTreeMap;

pub struct JobSlice {
    ctx: SliceContext,
    jobs: BTreeMap<JobId, Job>,
}

impl JobSlice {
    pub(crate) fn new(ctx: SliceContext) -> Self {
        Self {
            ctx,
            jobs: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Lists jobs, most recently updated first.
    pub fn list(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        jobs
    }

    pub fn list_by_status(&self, status: JobStatus) -> Vec<&Job> {
        self.list()
            .into_iter()
            .filter(|job| job.status == status)
            .collect()
    }

    pub fn ids(&self) -> Vec<JobId> {
        self.jobs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn add(&mut self, mut job: Job) -> StoreResult<Job> {
        if self.jobs.contains_key(&job.id) {
            return Err(StoreError::duplicate(EntityKind::Job, job.id));
        }
        job.last_updated = self.ctx.now();
        self.jobs.insert(job.id, job.clone());

        self.ctx.emit(
            EventInput::new(JOB_EVENT, format!("Job saved: {}", job.label()))
                .with_data(json!({ "job_id": job.id })),
        );
        Ok(job)
    }

    pub fn update(&mut self, id: JobId, patch: &JobPatch) -> StoreResult<Job> {
        let now = self.ctx.now();
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Job, id))?;
        patch.apply_to(job);
        job.last_updated = now;
        let updated = job.clone();

        self.ctx.emit(
            EventInput::new(JOB_EVENT, format!("Job updated: {}", updated.label()))
                .with_data(json!({ "job_id": id })),
        );
        Ok(updated)
    }

    pub fn update_status(&mut self, id: JobId, status: JobStatus) -> StoreResult<Job> {
        let now = self.ctx.now();
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Job, id))?;
        let previous = job.status;
        job.status = status;
        job.last_updated = now;
        let updated = job.clone();

        self.ctx.emit(
            EventInput::new(
                JOB_EVENT,
                format!("Job moved to {}: {}", status.as_str(), updated.label()),
            )
            .with_data(json!({
                "job_id": id,
                "from": previous.as_str(),
                "to": status.as_str(),
            })),
        );
        Ok(updated)
    }

    /// Sets match scores for several jobs as one mutation with one event.
    ///
    /// Every id is validated before anything is written.
    pub fn apply_match_scores(&mut self, scores: &[(JobId, Option<u8>)]) -> StoreResult<usize> {
        if let Some((missing, _)) = scores.iter().find(|(id, _)| !self.jobs.contains_key(id)) {
            return Err(StoreError::not_found(EntityKind::Job, missing));
        }
        if scores.is_empty() {
            return Ok(0);
        }

        let now = self.ctx.now();
        for (id, score) in scores {
            if let Some(job) = self.jobs.get_mut(id) {
                job.match_score = *score;
                job.last_updated = now;
            }
        }

        self.ctx.emit(
            EventInput::new(JOB_EVENT, "Job matches recalculated")
                .with_description(format!("{} job match scores changed.", scores.len()))
                .with_data(json!({ "count": scores.len() })),
        );
        Ok(scores.len())
    }

    pub fn delete(&mut self, id: JobId) -> StoreResult<()> {
        let removed = self
            .jobs
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Job, id))?;

        self.ctx.emit(
            EventInput::new(JOB_EVENT, format!("Job removed: {}", removed.label()))
                .with_data(json!({ "job_id": id })),
        );
        Ok(())
    }

    /// Puts back a captured pre-image, inserting or overwriting.
    pub fn restore(&mut self, pre_image: Job) -> Job {
        self.jobs.insert(pre_image.id, pre_image.clone());
        self.ctx.emit(
            EventInput::new(JOB_EVENT, format!("Job restored: {}", pre_image.label()))
                .with_data(json!({ "job_id": pre_image.id })),
        );
        pre_image
    }

    /// Puts back several captured pre-images as one mutation with one event.
    ///
    /// Timestamps come from the pre-images, so list order is restored too.
    pub fn restore_many(&mut self, pre_images: &[Job]) -> usize {
        if pre_images.is_empty() {
            return 0;
        }
        for job in pre_images {
            self.jobs.insert(job.id, job.clone());
        }
        self.ctx.emit(
            EventInput::new(JOB_EVENT, "Job matches restored")
                .with_data(json!({ "count": pre_images.len() })),
        );
        pre_images.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    pub(crate) fn load_snapshot(&mut self, records: Vec<Job>) {
        self.jobs = records.into_iter().map(|job| (job.id, job)).collect();
    }
}
