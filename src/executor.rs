//! Fire-and-forget execution of gated side effects.
//!
//! The gate decides inline; the effect runs somewhere else. Nothing is
//! awaited and nothing is reported back to the caller.

use crate::GateError;
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Handle, Runtime};

/// A boxed side effect.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Runs actions off the calling thread, at most once each.
pub trait ActionExecutor: Send + Sync {
    /// Submit an action. Must not block on the action's completion.
    fn execute(&self, action: Action);
}

static SHARED_RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn shared_runtime() -> Result<&'static Runtime, GateError> {
    SHARED_RUNTIME.get_or_try_init(|| {
        tracing::debug!("starting shared background runtime");
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("settings-gate-bg")
            .build()
            .map_err(|e| GateError::Executor(format!("Failed to build runtime: {}", e)))
    })
}

/// Executor that dispatches onto a tokio runtime's blocking pool.
#[derive(Debug, Clone)]
pub struct BackgroundExecutor {
    handle: Handle,
}

impl BackgroundExecutor {
    /// Dispatch onto the process-wide shared background runtime.
    ///
    /// The shared runtime lives for the rest of the process, so the
    /// executor stays usable no matter which runtime (if any) built it.
    pub fn shared() -> Result<Self, GateError> {
        Ok(Self::new(shared_runtime()?.handle().clone()))
    }

    /// Dispatch onto the given runtime.
    ///
    /// Actions submitted after that runtime shuts down are dropped without
    /// running. Use [`BackgroundExecutor::shared`] unless the owner outlives
    /// the runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl ActionExecutor for BackgroundExecutor {
    fn execute(&self, action: Action) {
        // The join handle is dropped: a panicking action only takes down its own task.
        drop(self.handle.spawn_blocking(action));
    }
}

/// Executor that runs the action on the calling thread.
///
/// Only for tests; production callers must not run effects inline.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

#[cfg(any(test, feature = "test-seams"))]
impl ActionExecutor for InlineExecutor {
    fn execute(&self, action: Action) {
        action();
    }
}
