// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! A cell that is initialized at most once by an asynchronous operation.
//!
//! `SingleFlight<T>` is the async counterpart of `std::sync::OnceLock`: the
//! first caller of [`SingleFlight::get_or_try_init`] starts the operation and
//! every caller that arrives while it is pending attaches to it instead of
//! starting another one. All of them observe the same outcome.
//!
//! The operation is spawned onto the ambient tokio runtime, so dropping a
//! waiting caller never aborts it. What happens after a failure is decided by
//! the [`FailurePolicy`].

use std::{fmt, future::Future, sync::Arc};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, warn};
use wasmbridge_error::{Error, Result};

/// What a [`SingleFlight`] remembers after a failed initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Only success is cached. A failure returns the cell to
    /// [`InitState::Uninitialized`] so that a later call may try again.
    #[default]
    Retry,
    /// The first failure is cached and returned to every later caller.
    Cache,
}

/// Snapshot of a [`SingleFlight`] lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// No initialization has started, or the last one failed under
    /// [`FailurePolicy::Retry`]
    Uninitialized,
    /// An initialization is in flight
    Initializing,
    /// The value is available
    Initialized,
    /// The last initialization failed under [`FailurePolicy::Cache`]
    Failed,
}

type Outcome<T> = Result<Arc<T>>;

enum Slot<T> {
    Uninitialized,
    Initializing(watch::Receiver<Option<Outcome<T>>>),
    Initialized(Arc<T>),
    Failed(Error),
}

impl<T> Slot<T> {
    fn state(&self) -> InitState {
        match self {
            Self::Uninitialized => InitState::Uninitialized,
            Self::Initializing(_) => InitState::Initializing,
            Self::Initialized(_) => InitState::Initialized,
            Self::Failed(_) => InitState::Failed,
        }
    }

    // An attempt whose sender is gone without publishing was dropped with
    // its runtime; it will never settle on its own.
    fn reconcile(&mut self, policy: FailurePolicy) {
        if matches!(self, Self::Initializing(receiver) if receiver.has_changed().is_err()) {
            warn!("initialization was dropped before it settled");
            *self = Self::settle(&Err(Error::INITIALIZATION_ABANDONED), policy);
        }
    }

    fn settle(outcome: &Outcome<T>, policy: FailurePolicy) -> Self {
        match (outcome, policy) {
            (Ok(value), _) => Self::Initialized(Arc::clone(value)),
            (Err(error), FailurePolicy::Cache) => Self::Failed(error.clone()),
            (Err(_), FailurePolicy::Retry) => Self::Uninitialized,
        }
    }
}

enum Entry<T> {
    Ready(Arc<T>),
    Failed(Error),
    Waiting(watch::Receiver<Option<Outcome<T>>>),
}

/// Asynchronous, race-free, run-once initialization shared by all callers.
///
/// The state enum sits behind a mutex because tokio runs tasks on parallel
/// worker threads. The lock only covers the check-and-set; it is released
/// before any await.
pub struct SingleFlight<T> {
    slot:   Arc<Mutex<Slot<T>>>,
    policy: FailurePolicy,
}

impl<T> SingleFlight<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an empty cell with the given failure policy.
    #[must_use]
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Uninitialized)),
            policy,
        }
    }

    /// Returns the value, initializing it with `init` if necessary.
    ///
    /// `init` is called only by the caller that finds the cell uninitialized;
    /// it must not call back into the same cell. The future it returns is
    /// spawned on the current tokio runtime and runs to completion even if
    /// every caller stops waiting.
    ///
    /// # Errors
    ///
    /// Returns the initialization error (shared verbatim with every
    /// concurrent caller), a cached failure under [`FailurePolicy::Cache`],
    /// `NO_ASYNC_RUNTIME` outside a tokio runtime, or
    /// `INITIALIZATION_ABANDONED` if the initialization task panicked.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        match self.begin(init)? {
            Entry::Ready(value) => Ok(value),
            Entry::Failed(error) => Err(error),
            Entry::Waiting(mut receiver) => self.wait(&mut receiver).await,
        }
    }

    fn begin<F, Fut>(&self, init: F) -> Result<Entry<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        slot.reconcile(self.policy);
        match &*slot {
            Slot::Initialized(value) => return Ok(Entry::Ready(Arc::clone(value))),
            Slot::Failed(error) => return Ok(Entry::Failed(error.clone())),
            Slot::Initializing(receiver) => {
                debug!("attaching to in-flight initialization");
                return Ok(Entry::Waiting(receiver.clone()));
            },
            Slot::Uninitialized => {},
        }

        let runtime = Handle::try_current().map_err(|_| Error::NO_ASYNC_RUNTIME)?;
        let operation = init();
        let (sender, receiver) = watch::channel(None);
        *slot = Slot::Initializing(receiver.clone());
        drop(slot);
        debug!("starting initialization");

        let task = runtime.spawn(operation);
        let shared = Arc::clone(&self.slot);
        let policy = self.policy;
        runtime.spawn(async move {
            let outcome = match task.await {
                Ok(result) => result.map(Arc::new),
                Err(join_error) => {
                    warn!(error = %join_error, "initialization task did not complete");
                    Err(Error::INITIALIZATION_ABANDONED)
                },
            };
            if let Err(error) = &outcome {
                debug!(%error, ?policy, "initialization failed");
            }
            *shared.lock() = Slot::settle(&outcome, policy);
            sender.send_replace(Some(outcome));
        });

        Ok(Entry::Waiting(receiver))
    }

    async fn wait(&self, receiver: &mut watch::Receiver<Option<Outcome<T>>>) -> Result<Arc<T>> {
        let published = match receiver.wait_for(Option::is_some).await {
            Ok(published) => (*published).clone(),
            Err(_) => None,
        };
        published.unwrap_or_else(|| {
            let mut slot = self.slot.lock();
            if matches!(&*slot, Slot::Initializing(current) if current.same_channel(receiver)) {
                slot.reconcile(self.policy);
            }
            Err(Error::INITIALIZATION_ABANDONED)
        })
    }

    /// Gets the value if initialization has succeeded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.slot.lock() {
            Slot::Initialized(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> InitState {
        let mut slot = self.slot.lock();
        slot.reconcile(self.policy);
        slot.state()
    }

    /// The failure policy this cell was created with.
    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(FailurePolicy::default())
    }
}

impl<T> fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = {
            let mut slot = self.slot.lock();
            slot.reconcile(self.policy);
            slot.state()
        };
        f.debug_struct("SingleFlight")
            .field("state", &state)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_follows_policy() {
        let failure: Outcome<u8> = Err(Error::INITIALIZATION_ABANDONED);
        assert_eq!(
            Slot::settle(&failure, FailurePolicy::Retry).state(),
            InitState::Uninitialized
        );
        assert_eq!(Slot::settle(&failure, FailurePolicy::Cache).state(), InitState::Failed);

        let success: Outcome<u8> = Ok(Arc::new(7));
        assert_eq!(
            Slot::settle(&success, FailurePolicy::Retry).state(),
            InitState::Initialized
        );
        assert_eq!(
            Slot::settle(&success, FailurePolicy::Cache).state(),
            InitState::Initialized
        );
    }

    #[test]
    fn test_new_cell_is_uninitialized() {
        let cell: SingleFlight<u8> = SingleFlight::default();
        assert_eq!(cell.state(), InitState::Uninitialized);
        assert_eq!(cell.policy(), FailurePolicy::Retry);
        assert!(cell.get().is_none());
    }

    #[test]
    fn test_debug_shows_state_and_policy() {
        let cell: SingleFlight<u8> = SingleFlight::new(FailurePolicy::Cache);
        let rendered = format!("{cell:?}");
        assert!(rendered.contains("Uninitialized"));
        assert!(rendered.contains("Cache"));
    }

    #[test]
    fn test_init_outside_runtime_is_rejected() {
        let cell: SingleFlight<u8> = SingleFlight::default();
        let result = cell.begin(|| async { Ok(1) });
        assert_eq!(result.err(), Some(Error::NO_ASYNC_RUNTIME));
        assert_eq!(cell.state(), InitState::Uninitialized);
    }
}
