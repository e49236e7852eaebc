//! Notification coordinator.

use super::debounce::DebounceTimer;
use super::preferences::{NotificationPreference, Preferences};
use crate::clock::Clock;
use crate::events::{EventLog, SubscriptionId};
use crate::model::event::{Event, EventId, EventType};
use crate::repo::state_repo::{load_json, save_json, StateResult, StateStore};
use log::{debug, info, warn};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

/// Bursts of log changes closer than this collapse into one recomputation.
pub const DEBOUNCE_WINDOW_MS: i64 = 300;
/// State key of the persisted `type -> enabled` preference record.
pub const PREFERENCES_KEY: &str = "notification_preferences";
/// State key of the persisted filtered notification snapshot.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// UI-facing derived state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationView {
    /// Enabled-type events, newest first.
    pub notifications: Vec<Event>,
    pub unread_count: usize,
    /// Per-type groups, each keeping event log order.
    pub grouped_by_type: BTreeMap<EventType, Vec<Event>>,
    pub preferences: Vec<NotificationPreference>,
}

impl NotificationView {
    fn derive(events: &[Event], preferences: &Preferences) -> Self {
        let notifications: Vec<Event> = events
            .iter()
            .filter(|event| preferences.is_enabled(&event.kind))
            .cloned()
            .collect();
        let unread_count = notifications.iter().filter(|event| !event.read).count();
        let mut grouped_by_type: BTreeMap<EventType, Vec<Event>> = BTreeMap::new();
        for event in &notifications {
            grouped_by_type
                .entry(event.kind.clone())
                .or_default()
                .push(event.clone());
        }
        Self {
            notifications,
            unread_count,
            grouped_by_type,
            preferences: preferences.rows().to_vec(),
        }
    }
}

type ViewListener = Box<dyn FnMut(&NotificationView)>;

/// State shared between the coordinator and its event log subscription.
struct Shared {
    clock: Rc<dyn Clock>,
    timer: RefCell<DebounceTimer>,
    in_flight: Cell<bool>,
}

impl Shared {
    fn on_log_changed(&self, revision: u64) {
        if self.in_flight.get() {
            debug!(
                "event=notify_schedule module=notify status=skipped reason=in_flight revision={revision}"
            );
            return;
        }
        self.timer.borrow_mut().schedule(self.clock.now_ms());
    }
}

/// Derives and publishes notification views from the event log.
///
/// Recomputation is driven by the host loop calling [`poll`](Self::poll);
/// dropping the coordinator unsubscribes it and cancels the pending timer.
pub struct NotificationCoordinator {
    log: Rc<EventLog>,
    state_store: Rc<dyn StateStore>,
    shared: Rc<Shared>,
    preferences: RefCell<Preferences>,
    view: RefCell<NotificationView>,
    listeners: RefCell<Vec<(SubscriptionId, ViewListener)>>,
    removed_listeners: RefCell<BTreeSet<SubscriptionId>>,
    next_listener: Cell<SubscriptionId>,
    recomputations: Cell<u64>,
    log_subscription: SubscriptionId,
}

impl NotificationCoordinator {
    /// Loads preferences, subscribes to `log` and derives the initial view.
    pub fn new(log: Rc<EventLog>, state_store: Rc<dyn StateStore>, clock: Rc<dyn Clock>) -> Self {
        let preferences = load_preferences(state_store.as_ref());
        let shared = Rc::new(Shared {
            clock,
            timer: RefCell::new(DebounceTimer::new(DEBOUNCE_WINDOW_MS)),
            in_flight: Cell::new(false),
        });

        let weak: Weak<Shared> = Rc::downgrade(&shared);
        let log_subscription = log.subscribe(move |revision, _| {
            if let Some(shared) = weak.upgrade() {
                shared.on_log_changed(revision);
            }
        });

        let coordinator = Self {
            log,
            state_store,
            shared,
            view: RefCell::new(NotificationView {
                preferences: preferences.rows().to_vec(),
                ..NotificationView::default()
            }),
            preferences: RefCell::new(preferences),
            listeners: RefCell::new(Vec::new()),
            removed_listeners: RefCell::new(BTreeSet::new()),
            next_listener: Cell::new(1),
            recomputations: Cell::new(0),
            log_subscription,
        };
        if !coordinator.log.is_empty() {
            coordinator.recompute();
        }
        coordinator
    }

    /// Runs the pending recomputation if its debounce window has closed.
    ///
    /// Returns whether a recomputation ran.
    pub fn poll(&self) -> bool {
        let now = self.shared.clock.now_ms();
        if !self.shared.timer.borrow_mut().take_due(now) {
            return false;
        }
        self.recompute()
    }

    /// Recomputes immediately, discarding any pending timer.
    pub fn refresh(&self) -> bool {
        self.shared.timer.borrow_mut().cancel();
        self.recompute()
    }

    /// Cancels the pending recomputation. Returns whether one was pending.
    pub fn cancel_pending(&self) -> bool {
        self.shared.timer.borrow_mut().cancel()
    }

    pub fn has_pending(&self) -> bool {
        self.shared.timer.borrow().is_pending()
    }

    /// Epoch ms at which the pending recomputation becomes due.
    pub fn pending_deadline(&self) -> Option<i64> {
        self.shared.timer.borrow().deadline()
    }

    /// Number of completed recomputations.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    /// Last derived view with the current preferences.
    pub fn view(&self) -> NotificationView {
        let mut view = self.view.borrow().clone();
        view.preferences = self.preferences.borrow().rows().to_vec();
        view
    }

    pub fn unread_count(&self) -> usize {
        self.view.borrow().unread_count
    }

    pub fn preferences(&self) -> Vec<NotificationPreference> {
        self.preferences.borrow().rows().to_vec()
    }

    /// Delegates to the event log; the next recomputation refreshes the view.
    pub fn mark_as_read(&self, id: EventId) {
        self.log.mark_read(id);
    }

    pub fn mark_all_as_read(&self) {
        self.log.mark_all_read();
    }

    pub fn clear_notifications(&self) {
        self.log.clear();
    }

    /// Updates and persists one preference row.
    ///
    /// The derived view follows on the next log change or `refresh`.
    pub fn update_preference(&self, kind: impl Into<EventType>, enabled: bool) {
        let kind = kind.into();
        let record = {
            let mut preferences = self.preferences.borrow_mut();
            if !preferences.set(kind.clone(), enabled) {
                return;
            }
            preferences.to_persisted()
        };
        info!("event=notify_preference module=notify status=ok type={kind} enabled={enabled}");
        if let Err(err) = save_json(self.state_store.as_ref(), PREFERENCES_KEY, &record) {
            warn!(
                "event=notify_persist module=notify status=error key={PREFERENCES_KEY} error={err}"
            );
        }
    }

    /// Registers a listener that receives every newly derived view.
    pub fn subscribe(
        &self,
        listener: impl FnMut(&NotificationView) + 'static,
    ) -> SubscriptionId {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners.iter().position(|(entry, _)| *entry == id) {
            listeners.remove(index);
            return true;
        }
        if self.shared.in_flight.get() && id < self.next_listener.get() {
            return self.removed_listeners.borrow_mut().insert(id);
        }
        false
    }

    /// Reads the filtered snapshot last written to the state store.
    pub fn persisted_notifications(&self) -> StateResult<Vec<Event>> {
        let persisted = load_json::<Vec<Event>>(self.state_store.as_ref(), NOTIFICATIONS_KEY)?;
        Ok(persisted.unwrap_or_default())
    }

    fn recompute(&self) -> bool {
        if self.shared.in_flight.replace(true) {
            debug!("event=notify_recompute module=notify status=skipped reason=in_flight");
            return false;
        }

        let events = self.log.events();
        let view = NotificationView::derive(&events, &self.preferences.borrow());
        if let Err(err) = save_json(
            self.state_store.as_ref(),
            NOTIFICATIONS_KEY,
            &view.notifications,
        ) {
            warn!(
                "event=notify_persist module=notify status=error key={NOTIFICATIONS_KEY} error={err}"
            );
        }
        debug!(
            "event=notify_recompute module=notify status=ok total={} visible={} unread={}",
            events.len(),
            view.notifications.len(),
            view.unread_count
        );
        *self.view.borrow_mut() = view.clone();
        self.publish(&view);

        self.recomputations.set(self.recomputations.get() + 1);
        self.shared.in_flight.set(false);
        true
    }

    fn publish(&self, view: &NotificationView) {
        let mut active = std::mem::take(&mut *self.listeners.borrow_mut());
        for (id, listener) in active.iter_mut() {
            if self.removed_listeners.borrow().contains(id) {
                continue;
            }
            listener(view);
        }
        let mut listeners = self.listeners.borrow_mut();
        active.extend(std::mem::take(&mut *listeners));
        let removed = std::mem::take(&mut *self.removed_listeners.borrow_mut());
        active.retain(|(id, _)| !removed.contains(id));
        *listeners = active;
    }
}

impl Drop for NotificationCoordinator {
    fn drop(&mut self) {
        self.shared.timer.borrow_mut().cancel();
        self.log.unsubscribe(self.log_subscription);
    }
}

fn load_preferences(state_store: &dyn StateStore) -> Preferences {
    match load_json::<BTreeMap<String, bool>>(state_store, PREFERENCES_KEY) {
        Ok(Some(record)) => Preferences::from_persisted(record),
        Ok(None) => Preferences::default(),
        Err(err) => {
            warn!(
                "event=notify_load module=notify status=error key={PREFERENCES_KEY} error={err} fallback=defaults"
            );
            Preferences::default()
        }
    }
}
