use jobdash_core::model::application::{Application, ApplicationStatus};
use jobdash_core::model::job::{Job, JobPatch, JobStatus};
use jobdash_core::model::resume::{Resume, ResumePatch};
use jobdash_core::model::user::{User, UserPatch};
use jobdash_core::service::matching::MatchScorer;
use jobdash_core::repo::state_repo::load_json;
use jobdash_core::{
    CareerService, EntityStore, ErrorKind, EventLog, ManualClock, MemoryStateStore,
    PersistenceConfig, SliceName, SqliteStateStore, WorkflowError,
};
use std::collections::BTreeSet;
use std::rc::Rc;

struct Fixture {
    clock: Rc<ManualClock>,
    state: Rc<MemoryStateStore>,
    store: EntityStore,
    service: CareerService,
}

fn fixture(durable: &[SliceName]) -> Fixture {
    let clock = Rc::new(ManualClock::new(1_700_000_000_000));
    let log = Rc::new(EventLog::new(clock.clone()));
    let persistence = PersistenceConfig {
        durable: durable.iter().copied().collect::<BTreeSet<_>>(),
    };
    let state = Rc::new(MemoryStateStore::new());
    Fixture {
        store: EntityStore::new(log, clock.clone(), persistence),
        service: CareerService::with_default_scorer(state.clone()),
        clock,
        state,
    }
}

fn skills(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|value| value.to_string()).collect())
}

#[test]
fn resume_update_invalidates_score_and_recalculates_matches() {
    let mut f = fixture(&[]);
    let resume = f
        .service
        .create_resume(&mut f.store, Resume::new("CV", "").with_skills(["rust"]))
        .unwrap();
    let backend = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend").with_skills(["rust", "sql"]))
        .unwrap();
    let mobile = f
        .service
        .create_job(&mut f.store, Job::new("Globex", "Mobile").with_skills(["swift"]))
        .unwrap();
    f.store.scores_mut().record(resume.id, 80);

    let updated = f
        .service
        .update_resume(
            &mut f.store,
            resume.id,
            ResumePatch {
                skills: skills(&["rust", "sql"]),
                ..ResumePatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.version, 2);
    let score = f.store.scores().get(resume.id).unwrap();
    assert!(score.stale);
    assert_eq!(score.value, Some(80));
    assert_eq!(f.store.jobs().get(backend.id).unwrap().match_score, Some(100));
    assert_eq!(f.store.jobs().get(mobile.id).unwrap().match_score, Some(0));
}

#[test]
fn failed_resume_update_restores_every_pre_image() {
    let mut f = fixture(&[SliceName::Resumes]);
    let resume = f
        .service
        .create_resume(&mut f.store, Resume::new("CV", "").with_skills(["rust"]))
        .unwrap();
    let job = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend").with_skills(["sql"]))
        .unwrap();
    f.store.scores_mut().record(resume.id, 80);
    let score_before = f.store.scores().get(resume.id).cloned();
    let resume_before = f.store.resumes().get(resume.id).cloned();
    let job_before = f.store.jobs().get(job.id).cloned();
    f.clock.advance(10_000);

    f.state.set_available(false);
    let err = f
        .service
        .update_resume(
            &mut f.store,
            resume.id,
            ResumePatch {
                skills: skills(&["sql"]),
                ..ResumePatch::default()
            },
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    assert!(matches!(err, WorkflowError::Transaction(_)));
    assert_eq!(f.store.resumes().get(resume.id).cloned(), resume_before);
    assert_eq!(f.store.resumes().get(resume.id).unwrap().version, 1);
    assert_eq!(f.store.scores().get(resume.id).cloned(), score_before);
    assert_eq!(f.store.jobs().get(job.id).cloned(), job_before);
}

#[test]
fn failed_checkpoint_leaves_no_slice_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");
    let clock = Rc::new(ManualClock::new(1_700_000_000_000));
    let log = Rc::new(EventLog::new(clock.clone()));
    let persistence = PersistenceConfig {
        durable: BTreeSet::from([SliceName::Resumes, SliceName::Jobs]),
    };
    let state = Rc::new(SqliteStateStore::open(&path).unwrap());
    let mut store = EntityStore::new(log, clock.clone(), persistence);
    let service = CareerService::with_default_scorer(state.clone());

    let resume = service
        .create_resume(&mut store, Resume::new("CV", "").with_skills(["rust"]))
        .unwrap();
    service
        .create_job(&mut store, Job::new("Acme", "Backend").with_skills(["rust"]))
        .unwrap();

    let jobs_key = SliceName::Jobs.state_key();
    let admin = rusqlite::Connection::open(&path).unwrap();
    admin
        .execute_batch(&format!(
            "CREATE TRIGGER reject_jobs_insert BEFORE INSERT ON kv_state
             WHEN NEW.key = '{jobs_key}'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;
             CREATE TRIGGER reject_jobs_update BEFORE UPDATE ON kv_state
             WHEN NEW.key = '{jobs_key}'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;"
        ))
        .unwrap();

    let err = service
        .update_resume(
            &mut store,
            resume.id,
            ResumePatch {
                title: Some("NEW".to_string()),
                ..ResumePatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionFailed);

    let in_memory = store.resumes().get(resume.id).cloned().unwrap();
    assert_eq!(in_memory.title, "CV");
    let on_disk: Vec<Resume> = load_json(state.as_ref(), &SliceName::Resumes.state_key())
        .unwrap()
        .unwrap();
    assert_eq!(on_disk, vec![in_memory]);
}

#[test]
fn resume_delete_removes_score_and_detaches_applications() {
    let mut f = fixture(&[]);
    let resume = f
        .service
        .create_resume(&mut f.store, Resume::new("CV", ""))
        .unwrap();
    let job = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend"))
        .unwrap();
    let application = f
        .service
        .create_application(&mut f.store, Application::new(job.id, Some(resume.id)))
        .unwrap();
    f.store.scores_mut().invalidate(resume.id);

    f.service.delete_resume(&mut f.store, resume.id).unwrap();

    assert!(f.store.resumes().get(resume.id).is_none());
    assert!(f.store.scores().get(resume.id).is_none());
    assert_eq!(
        f.store.applications().get(application.id).unwrap().resume_id,
        None
    );
}

#[test]
fn job_delete_archives_its_applications() {
    let mut f = fixture(&[]);
    let job = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend"))
        .unwrap();
    let other = f
        .service
        .create_job(&mut f.store, Job::new("Globex", "SRE"))
        .unwrap();
    let archived = f
        .service
        .create_application(&mut f.store, Application::new(job.id, None))
        .unwrap();
    let untouched = f
        .service
        .create_application(&mut f.store, Application::new(other.id, None))
        .unwrap();

    f.service.delete_job(&mut f.store, job.id).unwrap();

    assert!(!f.store.jobs().contains(job.id));
    assert_eq!(
        f.store.applications().get(archived.id).unwrap().status,
        ApplicationStatus::Archived
    );
    assert_eq!(
        f.store.applications().get(untouched.id).unwrap().status,
        ApplicationStatus::Draft
    );
}

#[test]
fn submit_marks_job_applied() {
    let mut f = fixture(&[]);
    let job = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend"))
        .unwrap();
    let application = f
        .service
        .create_application(&mut f.store, Application::new(job.id, None))
        .unwrap();

    let submitted = f
        .service
        .submit_application(&mut f.store, application.id)
        .unwrap();

    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert_eq!(f.store.jobs().get(job.id).unwrap().status, JobStatus::Applied);
}

#[test]
fn failed_submit_rolls_back_application_and_job() {
    let mut f = fixture(&[SliceName::Jobs]);
    let job = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend"))
        .unwrap();
    let application = f
        .service
        .create_application(&mut f.store, Application::new(job.id, None))
        .unwrap();

    f.state.set_available(false);
    let err = f
        .service
        .submit_application(&mut f.store, application.id)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    assert_eq!(
        f.store.applications().get(application.id).unwrap().status,
        ApplicationStatus::Draft
    );
    assert_eq!(f.store.jobs().get(job.id).unwrap().status, JobStatus::Saved);
}

#[test]
fn job_update_scores_against_most_recent_resume() {
    let mut f = fixture(&[]);
    f.service
        .create_resume(&mut f.store, Resume::new("Old", "").with_skills(["cobol"]))
        .unwrap();
    f.clock.advance(1_000);
    f.service
        .create_resume(&mut f.store, Resume::new("New", "").with_skills(["rust"]))
        .unwrap();
    let job = f
        .service
        .create_job(&mut f.store, Job::new("Acme", "Backend"))
        .unwrap();

    let updated = f
        .service
        .update_job(
            &mut f.store,
            job.id,
            JobPatch {
                skills: skills(&["rust", "go"]),
                ..JobPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.skills, vec!["rust", "go"]);
    assert_eq!(updated.match_score, Some(50));
}

struct FixedScorer(u8);

impl MatchScorer for FixedScorer {
    fn score(&self, _: &Resume, _: &Job) -> u8 {
        self.0
    }
}

#[test]
fn custom_scorer_drives_match_recalculation() {
    let mut f = fixture(&[]);
    let service = CareerService::new(f.state.clone(), Rc::new(FixedScorer(42)));
    let resume = service
        .create_resume(&mut f.store, Resume::new("CV", ""))
        .unwrap();
    let job = service
        .create_job(&mut f.store, Job::new("Acme", "Backend"))
        .unwrap();

    service
        .update_resume(&mut f.store, resume.id, ResumePatch::default())
        .unwrap();
    assert_eq!(f.store.jobs().get(job.id).unwrap().match_score, Some(42));
}

#[test]
fn missing_targets_fail_before_any_mutation() {
    let mut f = fixture(&[]);
    let missing = uuid::Uuid::new_v4();

    let err = f
        .service
        .update_resume(&mut f.store, missing, ResumePatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        f.service.delete_job(&mut f.store, missing).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        f.service
            .create_application(&mut f.store, Application::new(missing, None))
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert!(f.store.log().is_empty());
}

#[test]
fn profile_update_requires_user_and_checkpoints_durable_slice() {
    let mut f = fixture(&[SliceName::User]);
    let err = f
        .service
        .update_profile(&mut f.store, UserPatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoUser);
    assert!(f.store.log().is_empty());

    f.service
        .sign_in(&mut f.store, User::new("Sam", "sam@example.com"))
        .unwrap();
    let updated = f
        .service
        .update_profile(
            &mut f.store,
            UserPatch {
                target_role: Some(Some("Staff Engineer".into())),
                ..UserPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.target_role.as_deref(), Some("Staff Engineer"));
    assert_eq!(f.state.len(), 1);

    f.state.set_available(false);
    let err = f
        .service
        .update_profile(
            &mut f.store,
            UserPatch {
                name: Some("Samantha".into()),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    assert_eq!(f.store.user().require().unwrap().name, "Sam");
}

#[test]
fn sign_out_clears_active_user() {
    let mut f = fixture(&[]);
    let user = f
        .service
        .sign_in(&mut f.store, User::new("Sam", "sam@example.com"))
        .unwrap();
    assert_eq!(
        f.service
            .sign_in(&mut f.store, User::new("Alex", "alex@example.com"))
            .unwrap_err()
            .kind(),
        ErrorKind::Duplicate
    );

    let signed_out = f.service.sign_out(&mut f.store).unwrap();
    assert_eq!(signed_out.id, user.id);
    assert!(f.store.user().current().is_none());
    assert_eq!(
        f.service.sign_out(&mut f.store).unwrap_err().kind(),
        ErrorKind::NoUser
    );
}
