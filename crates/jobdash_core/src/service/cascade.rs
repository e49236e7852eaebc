//! Builds transaction steps for the cascades the dependency table declares.
//!
//! Every step captures its pre-image while it is planned, before the
//! transaction runs, and its compensation writes that pre-image back.

use super::matching::MatchScorer;
use super::{WorkflowError, WorkflowResult};
use crate::deps::{resolve, Action, Cascade, EntityKind};
use crate::model::application::Application;
use crate::model::job::{Job, JobId, JobStatus};
use crate::model::resume::{ResumeId, ResumeScore};
use crate::store::{EntityStore, StoreError};
use crate::tx::{Operation, OperationResult, Step};
use std::rc::Rc;

pub(crate) type StoreOperation = Box<dyn Operation<EntityStore>>;

/// Entity the primary mutation acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Subject {
    Resume(ResumeId),
    Job(JobId),
    Application { job_id: JobId },
    User,
}

/// Plans one step per cascade of `source`, in table order.
pub(crate) fn plan_cascades(
    store: &EntityStore,
    source: Cascade,
    subject: Subject,
    scorer: &Rc<dyn MatchScorer>,
) -> WorkflowResult<Vec<StoreOperation>> {
    resolve(source.entity, source.action)
        .iter()
        .map(|cascade| plan_cascade(store, source, *cascade, subject, scorer))
        .collect()
}

fn plan_cascade(
    store: &EntityStore,
    source: Cascade,
    cascade: Cascade,
    subject: Subject,
    scorer: &Rc<dyn MatchScorer>,
) -> WorkflowResult<StoreOperation> {
    let name = cascade.to_string();
    let operation: StoreOperation = match (cascade.entity, cascade.action, subject) {
        (EntityKind::Score, Action::Invalidate, Subject::Resume(resume_id)) => Box::new(Step::new(
            name,
            score_pre_image(store, resume_id),
            invalidate_score,
            restore_score,
        )),
        (EntityKind::Score, Action::Remove, Subject::Resume(resume_id)) => Box::new(Step::new(
            name,
            score_pre_image(store, resume_id),
            remove_score,
            restore_score,
        )),
        (EntityKind::Job, Action::RecalculateMatch, Subject::Resume(resume_id)) => {
            let pre_images = store.jobs().list().into_iter().cloned().collect();
            Box::new(Step::new(
                name,
                MatchRecalculation {
                    resume_id: Some(resume_id),
                    pre_images,
                    scorer: scorer.clone(),
                },
                recalculate_matches,
                restore_matches,
            ))
        }
        (EntityKind::Job, Action::RecalculateMatch, Subject::Job(job_id)) => {
            let pre_images = store.jobs().get(job_id).cloned().into_iter().collect();
            Box::new(Step::new(
                name,
                MatchRecalculation {
                    resume_id: None,
                    pre_images,
                    scorer: scorer.clone(),
                },
                recalculate_matches,
                restore_matches,
            ))
        }
        (EntityKind::Application, Action::DetachResume, Subject::Resume(resume_id)) => {
            Box::new(Step::new(
                name,
                applications_pre_image(store, Subject::Resume(resume_id), |application| {
                    application.resume_id == Some(resume_id)
                }),
                detach_resume,
                restore_applications,
            ))
        }
        (EntityKind::Application, Action::Archive, Subject::Job(job_id)) => Box::new(Step::new(
            name,
            applications_pre_image(store, Subject::Job(job_id), |application| {
                application.job_id == job_id
            }),
            archive_applications,
            restore_applications,
        )),
        (EntityKind::Job, Action::MarkApplied, Subject::Application { job_id }) => {
            Box::new(Step::new(
                name,
                JobPreImage {
                    job_id,
                    pre_image: store.jobs().get(job_id).cloned(),
                },
                mark_job_applied,
                restore_job,
            ))
        }
        _ => return Err(WorkflowError::UnsupportedCascade { source, cascade }),
    };
    Ok(operation)
}

struct ScorePreImage {
    resume_id: ResumeId,
    pre_image: Option<ResumeScore>,
}

fn score_pre_image(store: &EntityStore, resume_id: ResumeId) -> ScorePreImage {
    ScorePreImage {
        resume_id,
        pre_image: store.scores().get(resume_id).cloned(),
    }
}

fn invalidate_score(store: &mut EntityStore, state: &mut ScorePreImage) -> OperationResult {
    store.scores_mut().invalidate(state.resume_id);
    Ok(())
}

fn remove_score(store: &mut EntityStore, state: &mut ScorePreImage) -> OperationResult {
    store.scores_mut().remove(state.resume_id);
    Ok(())
}

fn restore_score(store: &mut EntityStore, state: &mut ScorePreImage) -> OperationResult {
    store
        .scores_mut()
        .restore(state.resume_id, state.pre_image.clone());
    Ok(())
}

struct MatchRecalculation {
    /// `None` scores against the most recently updated resume.
    resume_id: Option<ResumeId>,
    /// Whole jobs, so compensation also puts back `last_updated`.
    pre_images: Vec<Job>,
    scorer: Rc<dyn MatchScorer>,
}

fn recalculate_matches(store: &mut EntityStore, state: &mut MatchRecalculation) -> OperationResult {
    let resume = match state.resume_id {
        Some(resume_id) => Some(
            store
                .resumes()
                .get(resume_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(EntityKind::Resume, resume_id))?,
        ),
        None => store.resumes().list().first().map(|resume| (*resume).clone()),
    };

    let scores: Vec<(JobId, Option<u8>)> = state
        .pre_images
        .iter()
        .filter_map(|pre_image| store.jobs().get(pre_image.id))
        .map(|job: &Job| {
            let score = resume
                .as_ref()
                .map(|resume| state.scorer.score(resume, job));
            (job.id, score)
        })
        .collect();
    store.jobs_mut().apply_match_scores(&scores)?;
    Ok(())
}

fn restore_matches(store: &mut EntityStore, state: &mut MatchRecalculation) -> OperationResult {
    store.jobs_mut().restore_many(&state.pre_images);
    Ok(())
}

struct ApplicationsPreImage {
    subject: Subject,
    pre_images: Vec<Application>,
}

fn applications_pre_image(
    store: &EntityStore,
    subject: Subject,
    matches: impl Fn(&Application) -> bool,
) -> ApplicationsPreImage {
    ApplicationsPreImage {
        subject,
        pre_images: store
            .applications()
            .list()
            .into_iter()
            .filter(|application| matches(*application))
            .cloned()
            .collect(),
    }
}

fn detach_resume(store: &mut EntityStore, state: &mut ApplicationsPreImage) -> OperationResult {
    if let Subject::Resume(resume_id) = state.subject {
        store.applications_mut().detach_resume(resume_id);
    }
    Ok(())
}

fn archive_applications(
    store: &mut EntityStore,
    state: &mut ApplicationsPreImage,
) -> OperationResult {
    if let Subject::Job(job_id) = state.subject {
        store.applications_mut().archive_for_job(job_id);
    }
    Ok(())
}

fn restore_applications(
    store: &mut EntityStore,
    state: &mut ApplicationsPreImage,
) -> OperationResult {
    store
        .applications_mut()
        .restore(state.pre_images.clone());
    Ok(())
}

struct JobPreImage {
    job_id: JobId,
    pre_image: Option<Job>,
}

fn mark_job_applied(store: &mut EntityStore, state: &mut JobPreImage) -> OperationResult {
    store
        .jobs_mut()
        .update_status(state.job_id, JobStatus::Applied)?;
    Ok(())
}

fn restore_job(store: &mut EntityStore, state: &mut JobPreImage) -> OperationResult {
    if let Some(pre_image) = state.pre_image.clone() {
        store.jobs_mut().restore(pre_image);
    }
    Ok(())
}
