//! One-shot re-arming timer task driving a scan session.
//!
//! The tick task is the only thing that calls [`ScanSession::step`] once a
//! session is armed. It is deliberately one-shot: each firing performs one
//! step, and re-arming happens from the tail of `step` itself, so tick N+1
//! can never begin before tick N has returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::session::ScanSession;

/// Scheduler handle for one session's tick timer.
pub struct TickTask {
    session: Weak<ScanSession>,
    scheduled: Arc<AtomicBool>,
    cancelled: CancellationToken,
}

impl std::fmt::Debug for TickTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickTask")
            .field("scheduled", &self.is_scheduled())
            .field("cancelled", &self.cancelled.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl TickTask {
    /// Construct a tick task bound to a session. Does not arm the timer.
    #[must_use]
    pub fn new(session: Weak<ScanSession>) -> Self {
        Self {
            session,
            scheduled: Arc::new(AtomicBool::new(false)),
            cancelled: CancellationToken::new(),
        }
    }

    /// Arm the timer to fire once after `delay`. A no-op when the task is
    /// already scheduled or has been cancelled.
    pub fn schedule(&self, delay: Duration) {
        if self.cancelled.is_cancelled() {
            debug!("tick task already cancelled, not scheduling");
            return;
        }
        if self.scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            self.scheduled.store(false, Ordering::SeqCst);
            warn!("no runtime available to schedule tick task");
            return;
        };

        let session = self.session.clone();
        let scheduled = Arc::clone(&self.scheduled);
        let cancelled = self.cancelled.clone();

        runtime.spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {
                    scheduled.store(false, Ordering::SeqCst);
                }
                () = tokio::time::sleep(delay) => {
                    // Clear before stepping so the step can re-arm.
                    scheduled.store(false, Ordering::SeqCst);
                    if let Some(session) = session.upgrade() {
                        session.step();
                    }
                }
            }
        });
    }

    /// Arm the timer for the next tick. Identical to [`schedule`](Self::schedule);
    /// the pending firing, if any, keeps its earlier deadline.
    pub fn reschedule(&self, delay: Duration) {
        self.schedule(delay);
    }

    /// Cancel the timer. Any pending firing is dropped without stepping.
    /// Idempotent; a cancelled task can never be scheduled again.
    pub fn cancel(&self) {
        self.cancelled.cancel();
        self.scheduled.store(false, Ordering::SeqCst);
    }

    /// Whether a firing is currently pending.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst) && !self.cancelled.is_cancelled()
    }
}
