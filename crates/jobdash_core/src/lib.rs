//! Coordination core for the job-search dashboard.
//! Owns entity state, the domain event log, cascades and notifications.

pub mod clock;
pub mod config;
pub mod db;
pub mod deps;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod runtime;
pub mod service;
pub mod store;
pub mod tx;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use deps::{resolve, Action, Cascade, EntityKind};
pub use error::ErrorKind;
pub use events::{EventLog, DEDUP_WINDOW_MS, EVENT_LOG_CAPACITY};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventInput, EventType};
pub use notify::{NotificationCoordinator, NotificationView, DEBOUNCE_WINDOW_MS};
pub use repo::state_repo::{MemoryStateStore, SqliteStateStore, StateError, StateStore};
pub use runtime::{Dashboard, RuntimeError};
pub use service::career_service::CareerService;
pub use service::{WorkflowError, WorkflowResult};
pub use store::{EntityStore, PersistenceConfig, SliceName, StoreError, StoreResult};
pub use tx::{run_transaction, Operation, Step, Transaction, TransactionError, TransactionState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
