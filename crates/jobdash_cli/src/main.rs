//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise one end-to-end dashboard session against an in-memory store.
//! - Keep output deterministic enough for quick local sanity checks.

use jobdash_core::model::application::Application;
use jobdash_core::model::job::Job;
use jobdash_core::model::resume::{Resume, ResumePatch};
use jobdash_core::model::user::User;
use jobdash_core::{CoreConfig, Dashboard, WorkflowError};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("jobdash_core ping={}", jobdash_core::ping());
    println!("jobdash_core version={}", jobdash_core::core_version());

    match run_session() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("session failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_session() -> Result<(), Box<dyn std::error::Error>> {
    let mut dashboard = Dashboard::open(&CoreConfig::default())?;

    let resume = Resume::new("Backend CV", "Rust services").with_skills(["rust", "sql"]);
    let job = Job::new("Acme", "Platform Engineer").with_skills(["rust", "kubernetes"]);
    let (resume_id, job_id) = (resume.id, job.id);

    dashboard.workflow(|workflows, store| -> Result<(), WorkflowError> {
        workflows.sign_in(store, User::new("Sam", "sam@example.com"))?;
        workflows.create_resume(store, resume)?;
        workflows.create_job(store, job)?;
        let application =
            workflows.create_application(store, Application::new(job_id, Some(resume_id)))?;
        workflows.submit_application(store, application.id)?;
        workflows.update_resume(
            store,
            resume_id,
            ResumePatch {
                skills: Some(vec!["rust".into(), "sql".into(), "kubernetes".into()]),
                ..ResumePatch::default()
            },
        )?;
        Ok(())
    })?;

    dashboard.notifications().refresh();
    let view = dashboard.notifications().view();
    println!("events={} unread={}", view.notifications.len(), view.unread_count);
    for (kind, events) in &view.grouped_by_type {
        println!("  {kind}: {}", events.len());
    }
    if let Some(job) = dashboard.store().jobs().get(job_id) {
        println!(
            "job={} status={} match={}",
            job.label(),
            job.status.as_str(),
            job.match_score.map_or_else(|| "-".to_string(), |score| score.to_string())
        );
    }
    Ok(())
}
