//! Debounced selection reactions.
//!
//! A burst of selection notifications should cost one search, run once the
//! burst has been quiet for the configured delay. Nothing here spawns a
//! task: a [`Debouncer`] only records a trailing deadline, and the owner's
//! event loop sleeps until it (see [`wait_until`]). Because the deadline
//! lives inside the owner, cancelling it or dropping the owner can never
//! leave a callback behind.
//!
//! ```text
//! notify ─┐  notify ─┐  notify ─┐
//!         ▼          ▼          ▼
//!   ──────●──────────●──────────●──────────── delay ──────▶ fire (once)
//! ```

use std::time::Duration;
use tokio::time::Instant;

use crate::config::ConfigStore;

/// Logging target for debounce bookkeeping.
const LOG_TARGET: &str = "beacon::debounce";

/// Coalesces calls into one trailing call after `delay` of quiet.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// The delay this debouncer was built with.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a call, pushing the trailing deadline to `now + delay`.
    pub fn call(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drops the pending trailing call, if any. Safe to repeat.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true if a trailing call is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes the pending call if its deadline has passed at `now`.
    pub fn take_elapsed(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
///
/// Meant for a `tokio::select!` branch: the future borrows nothing, so the
/// branch handler is free to mutate the debouncer's owner.
pub async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// The selection-change pipeline.
///
/// The inner debouncer is built lazily on the first notification, reading
/// the delay from the config store at that moment. It is not rebuilt when
/// the config changes later; a new delay applies only to a debouncer built
/// after the change.
#[derive(Debug, Default)]
pub struct SelectionPipeline {
    debouncer: Option<Debouncer>,
}

impl SelectionPipeline {
    /// Creates a pipeline with no debouncer yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a selection change.
    pub fn notify(&mut self, config: &ConfigStore) {
        let debouncer = self.debouncer.get_or_insert_with(|| {
            let delay = config.debounce_delay();
            tracing::debug!(target: LOG_TARGET, ?delay, "building selection debouncer");
            Debouncer::new(delay)
        });
        debouncer.call();
        tracing::trace!(target: LOG_TARGET, "selection change debounced");
    }

    /// Cancels any pending recomputation. Safe to repeat.
    pub fn cancel(&mut self) {
        if let Some(debouncer) = &mut self.debouncer {
            if debouncer.is_pending() {
                tracing::debug!(target: LOG_TARGET, "cancelled pending selection recomputation");
            }
            debouncer.cancel();
        }
    }

    /// Returns true if a recomputation is pending.
    pub fn is_pending(&self) -> bool {
        self.debouncer.as_ref().is_some_and(Debouncer::is_pending)
    }

    /// The pending deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.as_ref().and_then(Debouncer::deadline)
    }

    /// The delay of the current debouncer, once one has been built.
    pub fn delay(&self) -> Option<Duration> {
        self.debouncer.as_ref().map(Debouncer::delay)
    }

    /// Consumes the pending recomputation if it is due at `now`.
    pub fn take_elapsed(&mut self, now: Instant) -> bool {
        self.debouncer
            .as_mut()
            .is_some_and(|debouncer| debouncer.take_elapsed(now))
    }
}
