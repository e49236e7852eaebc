//! Dashboard runtime wiring.
//!
//! # Responsibility
//! - Build the clock, event log, entity store, notification coordinator and
//!   workflow service from one [`CoreConfig`].
//! - Hydrate durable slices before anything else observes the store.
//!
//! # Invariants
//! - The coordinator subscribes after hydration, so loading emits nothing.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::events::EventLog;
use crate::logging::{init_logging, LoggingError};
use crate::notify::NotificationCoordinator;
use crate::repo::state_repo::{MemoryStateStore, SqliteStateStore, StateError, StateStore};
use crate::service::career_service::CareerService;
use crate::service::WorkflowResult;
use crate::store::{EntityStore, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug)]
pub enum RuntimeError {
    Logging(LoggingError),
    State(StateError),
    Store(StoreError),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging setup failed: {err}"),
            Self::State(err) => write!(f, "state store setup failed: {err}"),
            Self::Store(err) => write!(f, "hydration failed: {err}"),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::State(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<LoggingError> for RuntimeError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<StateError> for RuntimeError {
    fn from(value: StateError) -> Self {
        Self::State(value)
    }
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Fully wired coordination core for one dashboard session.
pub struct Dashboard {
    clock: Rc<dyn Clock>,
    store: EntityStore,
    notifications: NotificationCoordinator,
    workflows: CareerService,
}

impl Dashboard {
    /// Opens the configured state store and wires everything on the system clock.
    pub fn open(config: &CoreConfig) -> Result<Self, RuntimeError> {
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, log_dir)?;
        }
        let state_store: Rc<dyn StateStore> = match &config.state_db_path {
            Some(path) => Rc::new(SqliteStateStore::open(path)?),
            None => Rc::new(MemoryStateStore::new()),
        };
        Self::with_parts(config, state_store, Rc::new(SystemClock))
    }

    /// Wires the core over caller-provided collaborators.
    pub fn with_parts(
        config: &CoreConfig,
        state_store: Rc<dyn StateStore>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, RuntimeError> {
        let log = Rc::new(EventLog::new(clock.clone()));
        let mut store = EntityStore::new(log.clone(), clock.clone(), config.persistence.clone());
        store.hydrate(state_store.as_ref())?;

        let notifications = NotificationCoordinator::new(log, state_store.clone(), clock.clone());
        let workflows = CareerService::with_default_scorer(state_store);
        info!(
            "event=dashboard_open module=runtime status=ok durable={} user={}",
            config.persistence.durable.len(),
            store.user().current().is_some()
        );
        Ok(Self {
            clock,
            store,
            notifications,
            workflows,
        })
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    pub fn log(&self) -> &Rc<EventLog> {
        self.store.log()
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Direct slice access for single-slice mutations.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn notifications(&self) -> &NotificationCoordinator {
        &self.notifications
    }

    /// Runs one workflow against the store.
    pub fn workflow<T>(
        &mut self,
        run: impl FnOnce(&CareerService, &mut EntityStore) -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        run(&self.workflows, &mut self.store)
    }

    /// Host-loop tick: runs the notification recomputation once it is due.
    pub fn tick(&self) -> bool {
        self.notifications.poll()
    }
}
