//! In-memory event log with dedup, capacity bound and change subscriptions.

use crate::clock::Clock;
use crate::model::event::{Event, EventId, EventInput};
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

/// Maximum number of retained events.
pub const EVENT_LOG_CAPACITY: usize = 100;
/// Events with equal `(type, title)` closer than this are suppressed.
pub const DEDUP_WINDOW_MS: i64 = 5_000;

/// Handle returned by `subscribe`, used to unsubscribe.
pub type SubscriptionId = u64;

type LogListener = Box<dyn FnMut(u64, &[Event])>;

#[derive(Debug, Default)]
struct LogState {
    /// Newest first.
    events: Vec<Event>,
    /// Bumped on every observable change.
    revision: u64,
}

/// Shared append-only event log.
///
/// Shared as `Rc<EventLog>`; all mutation goes through `&self` methods so the
/// store slices and the notification coordinator can hold the same log.
pub struct EventLog {
    clock: Rc<dyn Clock>,
    state: RefCell<LogState>,
    listeners: RefCell<Vec<(SubscriptionId, LogListener)>>,
    removed_while_notifying: RefCell<BTreeSet<SubscriptionId>>,
    next_subscription: Cell<SubscriptionId>,
    notifying: Cell<bool>,
    renotify: Cell<bool>,
}

impl EventLog {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RefCell::new(LogState::default()),
            listeners: RefCell::new(Vec::new()),
            removed_while_notifying: RefCell::new(BTreeSet::new()),
            next_subscription: Cell::new(1),
            notifying: Cell::new(false),
            renotify: Cell::new(false),
        }
    }

    /// Appends one event unless a same-subject event exists inside the dedup
    /// window. Events stamped after `now` (the clock moved back) do not count.
    ///
    /// Returns the stored event, or `None` when the append was suppressed.
    pub fn append(&self, input: EventInput) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = {
            let mut state = self.state.borrow_mut();
            let duplicate = state.events.iter().any(|existing| {
                existing.same_subject(&input.kind, &input.title)
                    && (0..DEDUP_WINDOW_MS).contains(&(now - existing.timestamp))
            });
            if duplicate {
                debug!(
                    "event=event_append module=events status=skipped reason=duplicate type={}",
                    input.kind
                );
                return None;
            }

            let event = Event::from_input(input, now);
            state.events.insert(0, event.clone());
            if state.events.len() > EVENT_LOG_CAPACITY {
                let evicted = state.events.len() - EVENT_LOG_CAPACITY;
                state.events.truncate(EVENT_LOG_CAPACITY);
                debug!("event=event_evict module=events status=ok evicted={evicted}");
            }
            state.revision += 1;
            debug!(
                "event=event_append module=events status=ok type={} len={}",
                event.kind,
                state.events.len()
            );
            event
        };

        self.notify();
        Some(event)
    }

    /// Marks one event as read. Unknown or already-read ids are no-ops.
    pub fn mark_read(&self, id: EventId) {
        let changed = {
            let mut state = self.state.borrow_mut();
            match state.events.iter_mut().find(|event| event.id == id) {
                Some(event) if !event.read => {
                    event.read = true;
                    state.revision += 1;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.notify();
        }
    }

    pub fn mark_all_read(&self) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let mut changed = false;
            for event in state.events.iter_mut().filter(|event| !event.read) {
                event.read = true;
                changed = true;
            }
            if changed {
                state.revision += 1;
            }
            changed
        };
        if changed {
            self.notify();
        }
    }

    /// Empties the log. Notification preferences live elsewhere and are kept.
    pub fn clear(&self) {
        let cleared = {
            let mut state = self.state.borrow_mut();
            if state.events.is_empty() {
                false
            } else {
                state.events.clear();
                state.revision += 1;
                true
            }
        };
        if cleared {
            debug!("event=event_clear module=events status=ok");
            self.notify();
        }
    }

    /// Snapshot of all events, newest first.
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn get(&self, id: EventId) -> Option<Event> {
        self.state
            .borrow()
            .events
            .iter()
            .find(|event| event.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().events.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|event| !event.read)
            .count()
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    /// Registers a "log changed" listener.
    ///
    /// The listener receives the revision and the full sequence, newest first.
    /// It may read or mutate the log; nested changes are delivered after the
    /// current round so every listener sees non-decreasing revisions.
    pub fn subscribe(&self, listener: impl FnMut(u64, &[Event]) + 'static) -> SubscriptionId {
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` for unknown ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners.iter().position(|(entry, _)| *entry == id) {
            listeners.remove(index);
            return true;
        }
        if self.notifying.get() && id < self.next_subscription.get() {
            return self.removed_while_notifying.borrow_mut().insert(id);
        }
        false
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self) {
        if self.notifying.replace(true) {
            self.renotify.set(true);
            return;
        }

        loop {
            let (revision, snapshot) = {
                let state = self.state.borrow();
                (state.revision, state.events.clone())
            };

            let mut active = std::mem::take(&mut *self.listeners.borrow_mut());
            for (id, listener) in active.iter_mut() {
                if self.removed_while_notifying.borrow().contains(id) {
                    continue;
                }
                listener(revision, &snapshot);
            }

            let mut listeners = self.listeners.borrow_mut();
            let added = std::mem::take(&mut *listeners);
            active.extend(added);
            let removed = std::mem::take(&mut *self.removed_while_notifying.borrow_mut());
            active.retain(|(id, _)| !removed.contains(id));
            *listeners = active;
            drop(listeners);

            if !self.renotify.replace(false) {
                break;
            }
        }

        self.notifying.set(false);
    }
}
