use std::sync::{Arc, Mutex};

use crate::error::AttendanceError;
use crate::manager::AttendanceManager;

/// Shared request state. The single connection sits behind a mutex, so database work from
/// concurrent requests is serialized.
#[derive(Clone)]
pub struct AppState {
    manager: Arc<Mutex<AttendanceManager>>,
}

impl AppState {
    pub fn new(manager: AttendanceManager) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
        }
    }

    /// Runs `op` against the manager on the blocking thread pool.
    pub async fn with_manager<T, F>(&self, op: F) -> Result<T, AttendanceError>
    where
        F: FnOnce(&mut AttendanceManager) -> Result<T, AttendanceError> + Send + 'static,
        T: Send + 'static,
    {
        let manager = Arc::clone(&self.manager);

        tokio::task::spawn_blocking(move || {
            let mut guard = manager
                .lock()
                .map_err(|_| AttendanceError::Internal("database lock poisoned".to_string()))?;
            op(&mut *guard)
        })
        .await
        .map_err(|e| AttendanceError::Internal(format!("database task failed: {e}")))?
    }
}
