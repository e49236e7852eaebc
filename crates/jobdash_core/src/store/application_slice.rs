//! Job application slice.
//!
//! Bulk transitions (`archive_for_job`, `detach_resume`) return the
//! pre-images of every touched application so callers can compensate.

use super::{SliceContext, StoreError, StoreResult};
use crate::deps::EntityKind;
use crate::model::application::{Application, ApplicationId, ApplicationStatus};
use crate::model::event::{EventInput, APPLICATION_EVENT};
use crate::model::job::JobId;
use crate::model::resume::ResumeId;
use serde_json::json;
use std::collections::BTreeMap;

pub struct ApplicationSlice {
    ctx: SliceContext,
    applications: BTreeMap<ApplicationId, Application>,
}

impl ApplicationSlice {
    pub(crate) fn new(ctx: SliceContext) -> Self {
        Self {
            ctx,
            applications: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: ApplicationId) -> Option<&Application> {
        self.applications.get(&id)
    }

    /// Lists applications, most recently updated first.
    pub fn list(&self) -> Vec<&Application> {
        let mut applications: Vec<&Application> = self.applications.values().collect();
        applications.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        applications
    }

    pub fn list_for_job(&self, job_id: JobId) -> Vec<&Application> {
        self.list()
            .into_iter()
            .filter(|application| application.job_id == job_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn add(&mut self, mut application: Application) -> StoreResult<Application> {
        if self.applications.contains_key(&application.id) {
            return Err(StoreError::duplicate(
                EntityKind::Application,
                application.id,
            ));
        }
        application.last_updated = self.ctx.now();
        self.applications
            .insert(application.id, application.clone());

        self.ctx.emit(
            EventInput::new(APPLICATION_EVENT, "Application draft created").with_data(json!({
                "application_id": application.id,
                "job_id": application.job_id,
            })),
        );
        Ok(application)
    }

    pub fn update_status(
        &mut self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> StoreResult<Application> {
        let now = self.ctx.now();
        let application = self
            .applications
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Application, id))?;
        let previous = application.status;
        application.status = status;
        application.last_updated = now;
        let updated = application.clone();

        self.ctx.emit(
            EventInput::new(
                APPLICATION_EVENT,
                format!("Application {}", status.as_str()),
            )
            .with_data(json!({
                "application_id": id,
                "job_id": updated.job_id,
                "from": previous.as_str(),
                "to": status.as_str(),
            })),
        );
        Ok(updated)
    }

    pub fn update_notes(
        &mut self,
        id: ApplicationId,
        notes: impl Into<String>,
    ) -> StoreResult<Application> {
        let now = self.ctx.now();
        let application = self
            .applications
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Application, id))?;
        application.notes = notes.into();
        application.last_updated = now;
        let updated = application.clone();

        self.ctx.emit(
            EventInput::new(APPLICATION_EVENT, "Application notes updated")
                .with_data(json!({ "application_id": id })),
        );
        Ok(updated)
    }

    /// Archives every application targeting `job_id`.
    pub fn archive_for_job(&mut self, job_id: JobId) -> Vec<Application> {
        self.bulk_update(
            |application| {
                application.job_id == job_id
                    && application.status != ApplicationStatus::Archived
            },
            |application| application.status = ApplicationStatus::Archived,
            "Applications archived",
        )
    }

    /// Clears the resume reference of every application using `resume_id`.
    pub fn detach_resume(&mut self, resume_id: ResumeId) -> Vec<Application> {
        self.bulk_update(
            |application| application.resume_id == Some(resume_id),
            |application| application.resume_id = None,
            "Applications lost their resume",
        )
    }

    pub fn delete(&mut self, id: ApplicationId) -> StoreResult<()> {
        self.applications
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Application, id))?;

        self.ctx.emit(
            EventInput::new(APPLICATION_EVENT, "Application deleted")
                .with_data(json!({ "application_id": id })),
        );
        Ok(())
    }

    /// Puts back captured pre-images as one mutation.
    pub fn restore(&mut self, pre_images: Vec<Application>) {
        if pre_images.is_empty() {
            return;
        }
        let count = pre_images.len();
        for application in pre_images {
            self.applications.insert(application.id, application);
        }
        self.ctx.emit(
            EventInput::new(APPLICATION_EVENT, "Applications restored")
                .with_data(json!({ "count": count })),
        );
    }

    fn bulk_update(
        &mut self,
        matches: impl Fn(&Application) -> bool,
        apply: impl Fn(&mut Application),
        title: &str,
    ) -> Vec<Application> {
        let now = self.ctx.now();
        let mut pre_images = Vec::new();
        for application in self
            .applications
            .values_mut()
            .filter(|application| matches(&**application))
        {
            pre_images.push(application.clone());
            apply(application);
            application.last_updated = now;
        }

        if !pre_images.is_empty() {
            self.ctx.emit(
                EventInput::new(APPLICATION_EVENT, title)
                    .with_data(json!({ "count": pre_images.len() })),
            );
        }
        pre_images
    }

    pub(crate) fn snapshot(&self) -> Vec<Application> {
        self.applications.values().cloned().collect()
    }

    pub(crate) fn load_snapshot(&mut self, records: Vec<Application>) {
        self.applications = records
            .into_iter()
            .map(|application| (application.id, application))
            .collect();
    }
}
