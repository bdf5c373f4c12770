//! Lazily initialized heavy resources.
//!
//! Embedding models and generation clients are expensive to bring up, so they
//! are loaded on first use rather than at startup. `LazyResource` guarantees
//! single-flight initialization: the first caller runs the loader, concurrent
//! callers wait for its outcome. A failed load is not cached; the next caller
//! runs the loader again.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use tokio::sync::OnceCell;

use crate::error::{AppError, AppResult};

/// Observable lifecycle of a lazily loaded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No load has been attempted yet
    NotLoaded,
    /// A loader is currently running
    Loading,
    /// The resource is loaded and cached
    Ready,
    /// The last load attempt failed; the next access retries
    Failed(String),
}

/// A thread-safe, lazily loaded resource with single-flight initialization.
pub struct LazyResource<T> {
    name: String,
    cell: OnceCell<T>,
    state: Mutex<LoadState>,
    attempts: AtomicU32,
}

impl<T> LazyResource<T> {
    /// Create an unloaded resource. `name` is used in logs and error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: OnceCell::new(),
            state: Mutex::new(LoadState::NotLoaded),
            attempts: AtomicU32::new(0),
        }
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of times the loader has been invoked.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The loaded value, if any, without triggering a load.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Return the loaded value, running `load` if nothing is cached yet.
    ///
    /// Loader failures are reported as `AppError::ModelUnavailable` and leave
    /// the resource unloaded.
    pub async fn get_or_try_load<F, Fut>(&self, load: F) -> AppResult<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        self.cell
            .get_or_try_init(|| async move {
                self.set_state(LoadState::Loading);
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::info!(resource = %self.name, attempt, "Loading resource");

                match load().await {
                    Ok(value) => {
                        self.set_state(LoadState::Ready);
                        tracing::info!(resource = %self.name, "Resource ready");
                        Ok(value)
                    }
                    Err(e) => {
                        tracing::warn!(resource = %self.name, "Resource failed to load: {}", e);
                        self.set_state(LoadState::Failed(e.to_string()));
                        Err(match e {
                            AppError::ModelUnavailable(_) => e,
                            other => AppError::ModelUnavailable(format!(
                                "{} could not be loaded: {}",
                                self.name, other
                            )),
                        })
                    }
                }
            })
            .await
    }

    fn set_state(&self, state: LoadState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

impl<T> std::fmt::Debug for LazyResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyResource")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_loads_on_first_use() {
        let resource: LazyResource<u32> = LazyResource::new("answer");
        assert_eq!(resource.state(), LoadState::NotLoaded);
        assert!(resource.get().is_none());

        let value = resource.get_or_try_load(|| async { Ok(42) }).await.unwrap();
        assert_eq!(*value, 42);
        assert_eq!(resource.state(), LoadState::Ready);
        assert_eq!(resource.attempts(), 1);

        // Cached: the second loader is never run
        let value = resource.get_or_try_load(|| async { Ok(7) }).await.unwrap();
        assert_eq!(*value, 42);
        assert_eq!(resource.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_retried() {
        let resource: LazyResource<String> = LazyResource::new("model");

        let err = resource
            .get_or_try_load(|| async { Err(AppError::Llm("connection refused".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(err.to_string().contains("connection refused"));
        assert!(matches!(resource.state(), LoadState::Failed(_)));

        let value = resource
            .get_or_try_load(|| async { Ok("loaded".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "loaded");
        assert_eq!(resource.state(), LoadState::Ready);
        assert_eq!(resource.attempts(), 2);
    }

    #[tokio::test]
    async fn test_single_flight_under_concurrency() {
        let resource = Arc::new(LazyResource::<usize>::new("shared"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let resource = Arc::clone(&resource);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                *resource
                    .get_or_try_load(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(99)
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resource.attempts(), 1);
    }
}
