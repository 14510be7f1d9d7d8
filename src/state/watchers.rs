use std::time::SystemTime;

use tokio::{sync::watch, task::JoinHandle};

use crate::api::models::RoomDto;

/// Latest state of a room as seen by its watcher.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room: RoomDto,
    pub fetched_at: SystemTime,
    /// Number of successful polls so far.
    pub generation: u64,
}

/// Handle of a background task polling one room. Dropping it stops the task.
pub struct RoomWatcher {
    snapshots: watch::Receiver<Option<RoomSnapshot>>,
    task: JoinHandle<()>,
}

impl RoomWatcher {
    pub fn new(snapshots: watch::Receiver<Option<RoomSnapshot>>, task: JoinHandle<()>) -> Self {
        Self { snapshots, task }
    }

    /// Most recent snapshot, `None` until the first poll succeeded.
    pub fn latest(&self) -> Option<RoomSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Independent receiver for callers that want to await changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<RoomSnapshot>> {
        self.snapshots.clone()
    }
}

impl Drop for RoomWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
