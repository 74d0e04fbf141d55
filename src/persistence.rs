//! Save scheduling.
//!
//! The deck calls [`Persistence::save`] after every uninhibited mutation.
//! Schedulers decide when a write is actually due; the deck hands out the
//! document from [`crate::model::Deck::poll_save`] and the caller writes it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::trace;

/// Default delay between the first save request and the write.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(5);

/// Persistence collaborator notified by the deck.
pub trait Persistence {
    /// A mutation happened that should eventually be written.
    fn save(&mut self);

    /// Whether a write is due at `now`. Returning true consumes the request.
    fn take_due(&mut self, _now: Instant) -> bool {
        false
    }
}

/// Coalesces save requests: the first request arms a timer, later ones
/// ride along until it fires.
#[derive(Debug, Clone)]
pub struct DebouncedSave {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebouncedSave {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending write becomes due.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn request_at(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
            trace!(delay = ?self.delay, "Save scheduled");
        }
    }
}

impl Default for DebouncedSave {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DELAY)
    }
}

impl Persistence for DebouncedSave {
    fn save(&mut self) {
        self.request_at(Instant::now());
    }

    fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Counts save requests and reports a write as due as soon as one was
/// requested. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct RecordingPersistence {
    saves: Arc<AtomicUsize>,
    taken: Arc<AtomicUsize>,
}

impl RecordingPersistence {
    /// Total save requests so far.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.saves.store(0, Ordering::SeqCst);
        self.taken.store(0, Ordering::SeqCst);
    }
}

impl Persistence for RecordingPersistence {
    fn save(&mut self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }

    fn take_due(&mut self, _now: Instant) -> bool {
        let saves = self.saves.load(Ordering::SeqCst);
        self.taken.swap(saves, Ordering::SeqCst) != saves
    }
}
