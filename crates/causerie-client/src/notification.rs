//! Single-slot transient notifications.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use causerie_shared::NoticeKind;
use serde::Serialize;

use crate::events::{ClientEvent, EventBus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub kind: NoticeKind,
}

/// Holds at most one [`Notice`].
///
/// Showing a notice replaces the current one and arms a dismissal timer.
/// A timer only clears the slot if it still holds the notice it was armed
/// for, so an old timer never hides a newer notice.
#[derive(Debug, Clone)]
pub struct Notifier {
    slot: Arc<Mutex<Option<Notice>>>,
    next_id: Arc<AtomicU64>,
    sound_enabled: Arc<AtomicBool>,
    default_duration: Duration,
    events: EventBus,
}

impl Notifier {
    pub fn new(events: EventBus, default_duration: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
            sound_enabled: Arc::new(AtomicBool::new(true)),
            default_duration,
            events,
        }
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn current(&self) -> Option<Notice> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn show(&self, message: impl Into<String>, kind: NoticeKind) -> u64 {
        self.show_for(message, kind, self.default_duration)
    }

    /// Show a notice for `duration`, returning its id.
    pub fn show_for(&self, message: impl Into<String>, kind: NoticeKind, duration: Duration) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notice = Notice {
            id,
            message: message.into(),
            kind,
        };

        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(notice.clone()),
            Err(_) => {
                tracing::error!("notification slot poisoned");
                return id;
            }
        }

        tracing::debug!(id, kind = ?kind, message = %notice.message, "notice shown");
        self.events.emit(ClientEvent::Notice {
            id,
            message: notice.message,
            kind,
        });
        if kind == NoticeKind::Success && self.sound_enabled.load(Ordering::Relaxed) {
            self.events.emit(ClientEvent::PlaySound);
        }

        self.arm_timer(id, duration);
        id
    }

    /// Close the current notice now.
    pub fn dismiss(&self) {
        let closed = self
            .slot
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .map(|n| n.id);
        if let Some(id) = closed {
            self.events.emit(ClientEvent::NoticeDismissed { id });
        }
    }

    fn arm_timer(&self, id: u64, duration: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(id, "no runtime, notice will not auto-dismiss");
            return;
        };
        let slot = self.slot.clone();
        let events = self.events.clone();
        runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let cleared = match slot.lock() {
                Ok(mut slot) if slot.as_ref().map(|n| n.id) == Some(id) => {
                    *slot = None;
                    true
                }
                _ => false,
            };
            if cleared {
                events.emit(ClientEvent::NoticeDismissed { id });
            }
        });
    }
}
