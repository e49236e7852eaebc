//! Job-search workflows over the entity store.
//!
//! # Responsibility
//! - Provide the mutation entry points the dashboard calls.
//! - Run every multi-slice mutation as one compensating transaction.
//!
//! # Invariants
//! - `NOT_FOUND` and `NO_USER` are returned before anything mutates.
//! - The checkpoint step, when present, is always the last step.

use super::cascade::{plan_cascades, StoreOperation, Subject};
use super::matching::{MatchScorer, SkillOverlapScorer};
use super::{WorkflowError, WorkflowResult};
use crate::deps::{Action, Cascade, EntityKind};
use crate::model::application::{Application, ApplicationId, ApplicationStatus};
use crate::model::job::{Job, JobId, JobPatch};
use crate::model::resume::{Resume, ResumeId, ResumePatch};
use crate::model::user::{User, UserPatch};
use crate::repo::state_repo::StateStore;
use crate::store::{EntityStore, SliceName, StoreError};
use crate::tx::{run_transaction, OperationResult, Step, Transaction};
use log::info;
use std::rc::Rc;

/// Workflow service bound to a state store and a match scorer.
pub struct CareerService {
    state_store: Rc<dyn StateStore>,
    scorer: Rc<dyn MatchScorer>,
}

impl CareerService {
    pub fn new(state_store: Rc<dyn StateStore>, scorer: Rc<dyn MatchScorer>) -> Self {
        Self {
            state_store,
            scorer,
        }
    }

    /// Uses [`SkillOverlapScorer`] for match recalculation.
    pub fn with_default_scorer(state_store: Rc<dyn StateStore>) -> Self {
        Self::new(state_store, Rc::new(SkillOverlapScorer))
    }

    pub fn create_resume(&self, store: &mut EntityStore, resume: Resume) -> WorkflowResult<Resume> {
        let id = resume.id;
        if store.resumes().contains(id) {
            return Err(StoreError::duplicate(EntityKind::Resume, id).into());
        }
        let primary = Box::new(Step::new(
            "resume/add",
            resume,
            |store: &mut EntityStore, resume: &mut Resume| {
                store.resumes_mut().add(resume.clone())?;
                Ok(())
            },
            |store: &mut EntityStore, resume: &mut Resume| {
                store.resumes_mut().delete(resume.id)?;
                Ok(())
            },
        ));
        self.execute(store, "resume/add", primary, None, &[SliceName::Resumes])?;
        fetch_resume(store, id)
    }

    /// Applies `patch`, invalidates the score and recalculates job matches.
    pub fn update_resume(
        &self,
        store: &mut EntityStore,
        id: ResumeId,
        patch: ResumePatch,
    ) -> WorkflowResult<Resume> {
        let pre_image = fetch_resume(store, id)?;
        let primary = Box::new(Step::new(
            "resume/update",
            (pre_image, patch),
            |store: &mut EntityStore, (pre_image, patch): &mut (Resume, ResumePatch)| {
                store.resumes_mut().update(pre_image.id, patch)?;
                Ok(())
            },
            |store: &mut EntityStore, (pre_image, _): &mut (Resume, ResumePatch)| {
                store.resumes_mut().restore(pre_image.clone());
                Ok(())
            },
        ));
        self.execute(
            store,
            "resume/update",
            primary,
            Some((Cascade::new(EntityKind::Resume, Action::Update), Subject::Resume(id))),
            &[SliceName::Resumes, SliceName::Scores, SliceName::Jobs],
        )?;
        fetch_resume(store, id)
    }

    /// Deletes a resume, its score, and its references from applications.
    pub fn delete_resume(&self, store: &mut EntityStore, id: ResumeId) -> WorkflowResult<()> {
        let pre_image = fetch_resume(store, id)?;
        let primary = Box::new(Step::new(
            "resume/delete",
            pre_image,
            |store: &mut EntityStore, pre_image: &mut Resume| {
                store.resumes_mut().delete(pre_image.id)?;
                Ok(())
            },
            |store: &mut EntityStore, pre_image: &mut Resume| {
                store.resumes_mut().restore(pre_image.clone());
                Ok(())
            },
        ));
        self.execute(
            store,
            "resume/delete",
            primary,
            Some((Cascade::new(EntityKind::Resume, Action::Delete), Subject::Resume(id))),
            &[SliceName::Resumes, SliceName::Scores, SliceName::Applications],
        )
    }

    pub fn create_job(&self, store: &mut EntityStore, job: Job) -> WorkflowResult<Job> {
        let id = job.id;
        if store.jobs().contains(id) {
            return Err(StoreError::duplicate(EntityKind::Job, id).into());
        }
        let primary = Box::new(Step::new(
            "job/add",
            job,
            |store: &mut EntityStore, job: &mut Job| {
                store.jobs_mut().add(job.clone())?;
                Ok(())
            },
            |store: &mut EntityStore, job: &mut Job| {
                store.jobs_mut().delete(job.id)?;
                Ok(())
            },
        ));
        self.execute(store, "job/add", primary, None, &[SliceName::Jobs])?;
        fetch_job(store, id)
    }

    /// Applies `patch` and recalculates the job's match score.
    pub fn update_job(
        &self,
        store: &mut EntityStore,
        id: JobId,
        patch: JobPatch,
    ) -> WorkflowResult<Job> {
        let pre_image = fetch_job(store, id)?;
        let primary = Box::new(Step::new(
            "job/update",
            (pre_image, patch),
            |store: &mut EntityStore, (pre_image, patch): &mut (Job, JobPatch)| {
                store.jobs_mut().update(pre_image.id, patch)?;
                Ok(())
            },
            restore_job_pre_image,
        ));
        self.execute(
            store,
            "job/update",
            primary,
            Some((Cascade::new(EntityKind::Job, Action::Update), Subject::Job(id))),
            &[SliceName::Jobs],
        )?;
        fetch_job(store, id)
    }

    /// Deletes a job and archives its applications.
    pub fn delete_job(&self, store: &mut EntityStore, id: JobId) -> WorkflowResult<()> {
        let pre_image = fetch_job(store, id)?;
        let primary = Box::new(Step::new(
            "job/delete",
            pre_image,
            |store: &mut EntityStore, pre_image: &mut Job| {
                store.jobs_mut().delete(pre_image.id)?;
                Ok(())
            },
            |store: &mut EntityStore, pre_image: &mut Job| {
                store.jobs_mut().restore(pre_image.clone());
                Ok(())
            },
        ));
        self.execute(
            store,
            "job/delete",
            primary,
            Some((Cascade::new(EntityKind::Job, Action::Delete), Subject::Job(id))),
            &[SliceName::Jobs, SliceName::Applications],
        )
    }

    /// Creates a draft application for an existing job.
    pub fn create_application(
        &self,
        store: &mut EntityStore,
        application: Application,
    ) -> WorkflowResult<Application> {
        if !store.jobs().contains(application.job_id) {
            return Err(StoreError::not_found(EntityKind::Job, application.job_id).into());
        }
        if let Some(resume_id) = application.resume_id {
            if !store.resumes().contains(resume_id) {
                return Err(StoreError::not_found(EntityKind::Resume, resume_id).into());
            }
        }
        if store.applications().get(application.id).is_some() {
            return Err(StoreError::duplicate(EntityKind::Application, application.id).into());
        }
        let id = application.id;
        let primary = Box::new(Step::new(
            "application/add",
            application,
            |store: &mut EntityStore, application: &mut Application| {
                store.applications_mut().add(application.clone())?;
                Ok(())
            },
            |store: &mut EntityStore, application: &mut Application| {
                store.applications_mut().delete(application.id)?;
                Ok(())
            },
        ));
        self.execute(
            store,
            "application/add",
            primary,
            None,
            &[SliceName::Applications],
        )?;
        fetch_application(store, id)
    }

    /// Submits an application and marks its job as applied.
    pub fn submit_application(
        &self,
        store: &mut EntityStore,
        id: ApplicationId,
    ) -> WorkflowResult<Application> {
        let pre_image = fetch_application(store, id)?;
        let job_id = pre_image.job_id;
        let primary = Box::new(Step::new(
            "application/submit",
            pre_image,
            |store: &mut EntityStore, pre_image: &mut Application| {
                store
                    .applications_mut()
                    .update_status(pre_image.id, ApplicationStatus::Submitted)?;
                Ok(())
            },
            |store: &mut EntityStore, pre_image: &mut Application| {
                store.applications_mut().restore(vec![pre_image.clone()]);
                Ok(())
            },
        ));
        self.execute(
            store,
            "application/submit",
            primary,
            Some((
                Cascade::new(EntityKind::Application, Action::Submit),
                Subject::Application { job_id },
            )),
            &[SliceName::Applications, SliceName::Jobs],
        )?;
        fetch_application(store, id)
    }

    pub fn sign_in(&self, store: &mut EntityStore, user: User) -> WorkflowResult<User> {
        if let Some(active) = store.user().current() {
            return Err(StoreError::duplicate(EntityKind::User, active.id).into());
        }
        let primary = Box::new(Step::new(
            "user/add",
            user,
            |store: &mut EntityStore, user: &mut User| {
                store.user_mut().sign_in(user.clone())?;
                Ok(())
            },
            |store: &mut EntityStore, _: &mut User| {
                store.user_mut().restore(None);
                Ok(())
            },
        ));
        self.execute(store, "user/add", primary, None, &[SliceName::User])?;
        Ok(store.user().require()?.clone())
    }

    /// Applies `patch` to the active user.
    pub fn update_profile(&self, store: &mut EntityStore, patch: UserPatch) -> WorkflowResult<User> {
        let pre_image = store.user().require()?.clone();
        let primary = Box::new(Step::new(
            "user/update",
            (pre_image, patch),
            |store: &mut EntityStore, (_, patch): &mut (User, UserPatch)| {
                store.user_mut().update_profile(patch)?;
                Ok(())
            },
            |store: &mut EntityStore, (pre_image, _): &mut (User, UserPatch)| {
                store.user_mut().restore(Some(pre_image.clone()));
                Ok(())
            },
        ));
        self.execute(
            store,
            "user/update",
            primary,
            Some((Cascade::new(EntityKind::User, Action::Update), Subject::User)),
            &[SliceName::User],
        )?;
        Ok(store.user().require()?.clone())
    }

    pub fn sign_out(&self, store: &mut EntityStore) -> WorkflowResult<User> {
        let pre_image = store.user().require()?.clone();
        let primary = Box::new(Step::new(
            "user/delete",
            pre_image.clone(),
            |store: &mut EntityStore, _: &mut User| {
                store.user_mut().sign_out()?;
                Ok(())
            },
            |store: &mut EntityStore, pre_image: &mut User| {
                store.user_mut().restore(Some(pre_image.clone()));
                Ok(())
            },
        ));
        self.execute(store, "user/delete", primary, None, &[SliceName::User])?;
        Ok(pre_image)
    }

    fn execute(
        &self,
        store: &mut EntityStore,
        name: &str,
        primary: StoreOperation,
        source: Option<(Cascade, Subject)>,
        touched: &[SliceName],
    ) -> WorkflowResult<()> {
        let mut tx = Transaction::new(name);
        tx.add_boxed(primary)?;
        if let Some((source, subject)) = source {
            for operation in plan_cascades(store, source, subject, &self.scorer)? {
                tx.add_boxed(operation)?;
            }
        }
        if touched
            .iter()
            .any(|slice| store.persistence().is_durable(*slice))
        {
            tx.add_operation(Step::new(
                "store/checkpoint",
                self.state_store.clone(),
                checkpoint,
                skip_compensation,
            ))?;
        }

        let steps = tx.len();
        run_transaction(&mut tx, store)?;
        info!("event=workflow_commit module=service status=ok name={name} steps={steps}");
        Ok(())
    }
}

fn checkpoint(store: &mut EntityStore, state_store: &mut Rc<dyn StateStore>) -> OperationResult {
    store.checkpoint(state_store.as_ref())?;
    Ok(())
}

/// The checkpoint runs last, so no later step can fail after it.
fn skip_compensation(_: &mut EntityStore, _: &mut Rc<dyn StateStore>) -> OperationResult {
    Ok(())
}

fn restore_job_pre_image(store: &mut EntityStore, state: &mut (Job, JobPatch)) -> OperationResult {
    store.jobs_mut().restore(state.0.clone());
    Ok(())
}

fn fetch_resume(store: &EntityStore, id: ResumeId) -> WorkflowResult<Resume> {
    store
        .resumes()
        .get(id)
        .cloned()
        .ok_or_else(|| WorkflowError::from(StoreError::not_found(EntityKind::Resume, id)))
}

fn fetch_job(store: &EntityStore, id: JobId) -> WorkflowResult<Job> {
    store
        .jobs()
        .get(id)
        .cloned()
        .ok_or_else(|| WorkflowError::from(StoreError::not_found(EntityKind::Job, id)))
}

fn fetch_application(store: &EntityStore, id: ApplicationId) -> WorkflowResult<Application> {
    store
        .applications()
        .get(id)
        .cloned()
        .ok_or_else(|| WorkflowError::from(StoreError::not_found(EntityKind::Application, id)))
}
