use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes task-chain mutations per project.
///
/// Chain edits and the progress recompute that follows them touch every file of the
/// project, so the lock is keyed by project id rather than file id.
#[derive(Clone, Default)]
pub struct ProjectLocks {
    inner: Arc<Mutex<HashMap<i32, Arc<AsyncMutex<()>>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a project's chains.
    pub async fn acquire(&self, project_id: i32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = match self.inner.lock() {
                Ok(map) => map,
                Err(poisoned) => poisoned.into_inner(),
            };
            map.entry(project_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the entry of a deleted project.
    pub fn forget(&self, project_id: i32) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(&project_id);
        }
    }
}
