use dashmap::DashSet;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Tracks outstanding requests and publishes how many are in flight.
///
/// The count is what a "network activity" indicator should follow: it is
/// non-zero while at least one request has been dispatched and not yet
/// normalized. Subscribers receive every change through a watch channel.
#[derive(Clone)]
pub struct ActivityTracker {
    inner: Arc<Inner>,
}

struct Inner {
    tasks: DashSet<Uuid>,
    count: watch::Sender<usize>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                tasks: DashSet::new(),
                count,
            }),
        }
    }

    /// Registers a new in-flight task. The task stays registered until the
    /// returned guard is dropped.
    pub fn begin(&self) -> InFlightGuard {
        let id = Uuid::new_v4();
        self.inner.tasks.insert(id);
        self.publish();
        InFlightGuard {
            id,
            inner: self.inner.clone(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.tasks.len()
    }

    pub fn is_requesting(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.inner.count.subscribe()
    }

    fn publish(&self) {
        self.inner.publish();
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    // The length is read under the channel's write lock so the last
    // publisher always reports the settled count.
    fn publish(&self) {
        self.count.send_modify(|count| *count = self.tasks.len());
    }
}

/// Keeps one task registered in its tracker for as long as it lives.
pub struct InFlightGuard {
    id: Uuid,
    inner: Arc<Inner>,
}

impl InFlightGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.tasks.remove(&self.id);
        self.inner.publish();
    }
}
