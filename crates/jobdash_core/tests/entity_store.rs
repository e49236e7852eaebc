use jobdash_core::model::application::{Application, ApplicationStatus};
use jobdash_core::model::job::{Job, JobPatch, JobStatus};
use jobdash_core::model::resume::{Resume, ResumePatch};
use jobdash_core::model::user::{User, UserPatch};
use jobdash_core::{
    EntityStore, ErrorKind, EventLog, ManualClock, PersistenceConfig, SliceName,
    SqliteStateStore, StoreError,
};
use std::collections::BTreeSet;
use std::rc::Rc;

fn store_with(persistence: PersistenceConfig) -> (Rc<ManualClock>, EntityStore) {
    let clock = Rc::new(ManualClock::new(1_700_000_000_000));
    let log = Rc::new(EventLog::new(clock.clone()));
    let store = EntityStore::new(log, clock.clone(), persistence);
    (clock, store)
}

#[test]
fn each_mutation_appends_one_event() {
    let (clock, mut store) = store_with(PersistenceConfig::volatile());
    let resume = store.resumes_mut().add(Resume::new("CV", "body")).unwrap();
    clock.advance(10);
    store
        .resumes_mut()
        .update(
            resume.id,
            &ResumePatch {
                title: Some("CV v2".into()),
                ..ResumePatch::default()
            },
        )
        .unwrap();

    let events = store.log().events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Resume updated: CV v2");
    assert_eq!(events[0].kind.as_str(), "resume");
    assert_eq!(events[1].title, "Resume added: CV");

    let updated = store.resumes().get(resume.id).unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.last_updated, 1_700_000_000_010);
}

#[test]
fn missing_targets_fail_without_touching_log() {
    let (_clock, mut store) = store_with(PersistenceConfig::volatile());
    let missing = uuid::Uuid::new_v4();

    let err = store
        .jobs_mut()
        .update(missing, &JobPatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(store.resumes_mut().delete(missing).is_err());
    assert!(store
        .applications_mut()
        .update_status(missing, ApplicationStatus::Submitted)
        .is_err());
    assert!(store.log().is_empty());
}

#[test]
fn adding_existing_id_is_duplicate() {
    let (_clock, mut store) = store_with(PersistenceConfig::volatile());
    let job = store.jobs_mut().add(Job::new("Acme", "Engineer")).unwrap();

    let err = store.jobs_mut().add(job.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert_eq!(err.kind().as_str(), "DUPLICATE");
    assert_eq!(store.jobs().len(), 1);
    assert_eq!(store.log().len(), 1);
}

#[test]
fn user_scoped_mutations_require_active_user() {
    let (_clock, mut store) = store_with(PersistenceConfig::volatile());

    let err = store
        .user_mut()
        .update_profile(&UserPatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoUser);
    assert_eq!(err.kind().as_str(), "NO_USER");
    assert!(store.user_mut().sign_out().is_err());

    store
        .user_mut()
        .sign_in(User::new("Sam", "sam@example.com"))
        .unwrap();
    let err = store
        .user_mut()
        .sign_in(User::new("Alex", "alex@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert_eq!(store.user().require().unwrap().name, "Sam");
}

#[test]
fn bulk_application_changes_emit_one_event() {
    let (_clock, mut store) = store_with(PersistenceConfig::volatile());
    let job = store.jobs_mut().add(Job::new("Acme", "Engineer")).unwrap();
    for _ in 0..3 {
        store
            .applications_mut()
            .add(Application::new(job.id, None))
            .unwrap();
    }
    let before = store.log().len();

    let pre_images = store.applications_mut().archive_for_job(job.id);
    assert_eq!(pre_images.len(), 3);
    assert!(pre_images
        .iter()
        .all(|application| application.status == ApplicationStatus::Draft));
    assert_eq!(store.log().len(), before + 1);
    assert!(store
        .applications()
        .list_for_job(job.id)
        .iter()
        .all(|application| application.status == ApplicationStatus::Archived));

    assert!(store.applications_mut().archive_for_job(job.id).is_empty());
    assert_eq!(store.log().len(), before + 1);
}

#[test]
fn score_invalidation_creates_stale_row_when_missing() {
    let (_clock, mut store) = store_with(PersistenceConfig::volatile());
    let resume = store.resumes_mut().add(Resume::new("CV", "")).unwrap();

    let score = store.scores_mut().invalidate(resume.id);
    assert!(score.stale);
    assert_eq!(score.value, None);

    store.scores_mut().record(resume.id, 140);
    let recorded = store.scores().get(resume.id).unwrap();
    assert_eq!(recorded.value, Some(100));
    assert!(!recorded.stale);
}

#[test]
fn job_status_listing_follows_updates() {
    let (clock, mut store) = store_with(PersistenceConfig::volatile());
    let saved = store.jobs_mut().add(Job::new("Acme", "Engineer")).unwrap();
    clock.advance(1);
    let applied = store.jobs_mut().add(Job::new("Globex", "SRE")).unwrap();
    store
        .jobs_mut()
        .update_status(applied.id, JobStatus::Applied)
        .unwrap();

    let applied_jobs = store.jobs().list_by_status(JobStatus::Applied);
    assert_eq!(applied_jobs.len(), 1);
    assert_eq!(applied_jobs[0].id, applied.id);
    assert_eq!(store.jobs().list_by_status(JobStatus::Saved)[0].id, saved.id);
}

#[test]
fn durable_user_survives_restart_while_volatile_slices_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");
    let user_id;

    {
        let state = SqliteStateStore::open(&path).unwrap();
        let (_clock, mut store) = store_with(PersistenceConfig::default());
        user_id = store
            .user_mut()
            .sign_in(User::new("Sam", "sam@example.com"))
            .unwrap()
            .id;
        store.jobs_mut().add(Job::new("Acme", "Engineer")).unwrap();
        store.checkpoint(&state).unwrap();
        assert_eq!(state.keys().unwrap(), vec![SliceName::User.state_key()]);
    }

    let state = SqliteStateStore::open(&path).unwrap();
    let (_clock, mut store) = store_with(PersistenceConfig::default());
    store.hydrate(&state).unwrap();

    assert_eq!(store.user().current().map(|user| user.id), Some(user_id));
    assert!(store.jobs().is_empty());
    assert!(store.log().is_empty());
}

#[test]
fn configured_slices_are_checkpointed_and_hydrated() {
    let state = SqliteStateStore::open_in_memory().unwrap();
    let persistence = PersistenceConfig {
        durable: BTreeSet::from([SliceName::Jobs, SliceName::Resumes]),
    };

    let (_clock, mut first) = store_with(persistence.clone());
    let job = first.jobs_mut().add(Job::new("Acme", "Engineer")).unwrap();
    first.resumes_mut().add(Resume::new("CV", "")).unwrap();
    first.checkpoint(&state).unwrap();

    let (_clock, mut second) = store_with(persistence);
    second.hydrate(&state).unwrap();
    assert_eq!(second.jobs().get(job.id), Some(&job));
    assert_eq!(second.resumes().len(), 1);
    assert!(second.user().current().is_none());
}
