//! Navigation handle.
//!
//! Holds the requested route in a watch channel. The shell observes it and
//! re-resolves guards after every change.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Route;

#[derive(Clone)]
pub struct Navigator {
    inner: Arc<Inner>,
}

struct Inner {
    current: Arc<watch::Sender<Route>>,
    /// Delayed navigation, if one is scheduled.
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pending = match self.pending.get_mut() {
            Ok(pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = pending {
            task.abort();
        }
    }
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        let (current, _) = watch::channel(start);
        Self {
            inner: Arc::new(Inner {
                current: Arc::new(current),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Requested route.
    pub fn current(&self) -> Route {
        *self.inner.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.inner.current.subscribe()
    }

    /// Go to `route` now. Cancels any scheduled navigation.
    pub fn navigate(&self, route: Route) {
        self.cancel_pending();
        tracing::debug!(%route, "navigate");
        self.inner.current.send_replace(route);
    }

    /// Record where a redirect landed without cancelling scheduled navigation.
    pub fn replace(&self, route: Route) {
        self.inner.current.send_if_modified(|current| {
            let changed = *current != route;
            *current = route;
            changed
        });
    }

    /// Go to `route` once `delay` has elapsed, unless another navigation
    /// happens first. Must be called inside a tokio runtime.
    pub fn navigate_after(&self, delay: Duration, route: Route) {
        let current = self.inner.current.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(%route, "delayed navigate");
            current.send_replace(route);
        });
        if let Some(previous) = self.lock_pending().replace(task) {
            previous.abort();
        }
    }

    /// Whether a delayed navigation is still waiting to fire.
    pub fn has_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn cancel_pending(&self) {
        if let Some(task) = self.lock_pending().take() {
            task.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
