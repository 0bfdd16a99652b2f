//! Search service lifecycle state.
//!
//! The search facade resolves its backend lazily; [`ServiceHandle`] lets
//! other parts of the process observe where that resolution stands.
//!
//! ```rust
//! use docket_core::service::{ServiceHandle, ServiceState};
//!
//! let handle = ServiceHandle::new("search");
//! assert_eq!(handle.state(), ServiceState::Unresolved);
//!
//! handle.set_state(ServiceState::Resolving);
//! handle.set_state(ServiceState::Ready("tantivy".to_string()));
//! assert!(handle.state().is_ready());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

// ============================================================================
// ServiceState
// ============================================================================

/// Lifecycle state of the search service.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceState {
    /// No backend has been resolved yet.
    Unresolved,
    /// The configured backend is being constructed.
    Resolving,
    /// Backend resolved; carries the backend name.
    Ready(String),
    /// Resolution failed; carries the reason.
    Failed(String),
}

impl ServiceState {
    /// Returns `true` once a backend is serving.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns `true` if resolution failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Resolving => write!(f, "resolving"),
            Self::Ready(backend) => write!(f, "ready ({backend})"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// ServiceHandle
// ============================================================================

/// Thread-safe handle for observing and updating service state.
///
/// Cheap to clone (Arc internals). State changes are broadcast
/// to all subscribers via a watch channel.
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<ServiceHandleInner>,
}

struct ServiceHandleInner {
    name: String,
    tx: watch::Sender<ServiceState>,
}

impl ServiceHandle {
    /// Create a handle in the [`ServiceState::Unresolved`] state.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(ServiceState::Unresolved);
        Self {
            inner: Arc::new(ServiceHandleInner {
                name: name.into(),
                tx,
            }),
        }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current state.
    pub fn state(&self) -> ServiceState {
        self.inner.tx.borrow().clone()
    }

    /// Update the state and notify subscribers.
    pub fn set_state(&self, state: ServiceState) {
        log::info!("Service '{}' -> {state}", self.inner.name);
        self.inner.tx.send_replace(state);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the service is ready, has failed, or the timeout elapses.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.subscribe();
        let outcome = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| state.is_ready() || state.is_failed()),
        )
        .await;

        match outcome {
            Err(_) => Err(Error::operation(format!(
                "service '{}' not ready after {timeout:?} (state: {})",
                self.inner.name,
                self.state()
            ))),
            Ok(Err(_)) => Err(Error::operation(format!(
                "service '{}' state channel closed",
                self.inner.name
            ))),
            Ok(Ok(state)) => match &*state {
                ServiceState::Failed(reason) => Err(Error::operation(format!(
                    "service '{}' failed: {reason}",
                    self.inner.name
                ))),
                _ => Ok(()),
            },
        }
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
