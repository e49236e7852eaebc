//! Composed in-memory entity store.
//!
//! # Responsibility
//! - Own every entity through exactly one slice (resumes, scores, jobs,
//!   applications, user).
//! - Append one event per applied mutation.
//! - Save and restore the slices declared durable.
//!
//! # Invariants
//! - Slices never call each other; cross-slice effects go through workflows
//!   and transactions.
//! - A failed validation leaves the slice and the event log untouched.

mod application_slice;
mod job_slice;
mod resume_slice;
mod score_slice;
mod user_slice;

pub use application_slice::ApplicationSlice;
pub use job_slice::JobSlice;
pub use resume_slice::ResumeSlice;
pub use score_slice::ScoreSlice;
pub use user_slice::UserSlice;

use crate::clock::Clock;
use crate::deps::EntityKind;
use crate::error::ErrorKind;
use crate::events::EventLog;
use crate::model::application::Application;
use crate::model::event::EventInput;
use crate::model::job::Job;
use crate::model::resume::{Resume, ResumeScore};
use crate::model::user::User;
use crate::repo::state_repo::{json_entry, load_json, StateError, StateStore};
use log::{debug, info};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised synchronously by slice operations.
#[derive(Debug)]
pub enum StoreError {
    NotFound { entity: EntityKind, id: String },
    Duplicate { entity: EntityKind, id: String },
    NoUser,
    State(StateError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::NoUser => ErrorKind::NoUser,
            Self::State(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: EntityKind, id: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate { entity, id } => write!(f, "{entity} already exists: {id}"),
            Self::NoUser => write!(f, "no active user"),
            Self::State(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::State(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StateError> for StoreError {
    fn from(value: StateError) -> Self {
        Self::State(value)
    }
}

/// Addressable slice names, used for durability configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SliceName {
    Resumes,
    Scores,
    Jobs,
    Applications,
    User,
}

impl SliceName {
    pub const ALL: [SliceName; 5] = [
        SliceName::Resumes,
        SliceName::Scores,
        SliceName::Jobs,
        SliceName::Applications,
        SliceName::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resumes => "resumes",
            Self::Scores => "scores",
            Self::Jobs => "jobs",
            Self::Applications => "applications",
            Self::User => "user",
        }
    }

    /// State store key holding this slice's durable snapshot.
    pub fn state_key(self) -> String {
        format!("slice.{}", self.as_str())
    }
}

/// Which slices survive a process restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub durable: BTreeSet<SliceName>,
}

impl Default for PersistenceConfig {
    /// Only the active user is durable; everything else resets on restart.
    fn default() -> Self {
        Self {
            durable: BTreeSet::from([SliceName::User]),
        }
    }
}

impl PersistenceConfig {
    pub fn volatile() -> Self {
        Self {
            durable: BTreeSet::new(),
        }
    }

    pub fn is_durable(&self, slice: SliceName) -> bool {
        self.durable.contains(&slice)
    }
}

/// Shared handles every slice needs to stamp and announce mutations.
#[derive(Clone)]
pub(crate) struct SliceContext {
    log: Rc<EventLog>,
    clock: Rc<dyn Clock>,
}

impl SliceContext {
    pub(crate) fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Best-effort append; a dedup suppression never fails the mutation.
    pub(crate) fn emit(&self, input: EventInput) {
        let kind = input.kind.clone();
        if self.log.append(input).is_none() {
            debug!("event=store_emit module=store status=skipped reason=duplicate type={kind}");
        }
    }
}

/// Arena-style composition of all slices.
pub struct EntityStore {
    log: Rc<EventLog>,
    persistence: PersistenceConfig,
    resumes: ResumeSlice,
    scores: ScoreSlice,
    jobs: JobSlice,
    applications: ApplicationSlice,
    user: UserSlice,
}

impl EntityStore {
    pub fn new(log: Rc<EventLog>, clock: Rc<dyn Clock>, persistence: PersistenceConfig) -> Self {
        let ctx = SliceContext {
            log: log.clone(),
            clock,
        };
        Self {
            log,
            persistence,
            resumes: ResumeSlice::new(ctx.clone()),
            scores: ScoreSlice::new(ctx.clone()),
            jobs: JobSlice::new(ctx.clone()),
            applications: ApplicationSlice::new(ctx.clone()),
            user: UserSlice::new(ctx),
        }
    }

    pub fn log(&self) -> &Rc<EventLog> {
        &self.log
    }

    pub fn persistence(&self) -> &PersistenceConfig {
        &self.persistence
    }

    pub fn resumes(&self) -> &ResumeSlice {
        &self.resumes
    }

    pub fn resumes_mut(&mut self) -> &mut ResumeSlice {
        &mut self.resumes
    }

    pub fn scores(&self) -> &ScoreSlice {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut ScoreSlice {
        &mut self.scores
    }

    pub fn jobs(&self) -> &JobSlice {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobSlice {
        &mut self.jobs
    }

    pub fn applications(&self) -> &ApplicationSlice {
        &self.applications
    }

    pub fn applications_mut(&mut self) -> &mut ApplicationSlice {
        &mut self.applications
    }

    pub fn user(&self) -> &UserSlice {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut UserSlice {
        &mut self.user
    }

    /// Loads every durable slice from `state`. Missing records mean empty.
    ///
    /// Loading is not a mutation and appends no events.
    pub fn hydrate(&mut self, state: &dyn StateStore) -> StoreResult<()> {
        for slice in self.persistence.durable.clone() {
            let key = slice.state_key();
            let loaded = match slice {
                SliceName::Resumes => load_json::<Vec<Resume>>(state, &key)?
                    .map(|records| self.resumes.load_snapshot(records))
                    .is_some(),
                SliceName::Scores => load_json::<Vec<ResumeScore>>(state, &key)?
                    .map(|records| self.scores.load_snapshot(records))
                    .is_some(),
                SliceName::Jobs => load_json::<Vec<Job>>(state, &key)?
                    .map(|records| self.jobs.load_snapshot(records))
                    .is_some(),
                SliceName::Applications => load_json::<Vec<Application>>(state, &key)?
                    .map(|records| self.applications.load_snapshot(records))
                    .is_some(),
                SliceName::User => load_json::<Option<User>>(state, &key)?
                    .map(|record| self.user.load_snapshot(record))
                    .is_some(),
            };
            info!(
                "event=store_hydrate module=store status=ok slice={} found={}",
                slice.as_str(),
                loaded
            );
        }
        Ok(())
    }

    /// Writes every durable slice to `state` in one batch, replacing previous
    /// records. Either every durable slice is written or none is.
    pub fn checkpoint(&self, state: &dyn StateStore) -> StoreResult<()> {
        let mut entries = Vec::with_capacity(self.persistence.durable.len());
        for slice in &self.persistence.durable {
            let key = slice.state_key();
            let entry = match slice {
                SliceName::Resumes => json_entry(&key, &self.resumes.snapshot())?,
                SliceName::Scores => json_entry(&key, &self.scores.snapshot())?,
                SliceName::Jobs => json_entry(&key, &self.jobs.snapshot())?,
                SliceName::Applications => json_entry(&key, &self.applications.snapshot())?,
                SliceName::User => json_entry(&key, &self.user.current())?,
            };
            entries.push(entry);
        }
        state.save_all(&entries)?;
        debug!(
            "event=store_checkpoint module=store status=ok slices={}",
            entries.len()
        );
        Ok(())
    }
}
