//! Concurrent asset loading with a single join point
//!
//! The scene cannot start until every texture is available. An
//! [`AssetBarrier`] runs each named fetch on its own worker thread and
//! [`AssetBarrier::join`] waits for all of them, in whatever order they
//! finish. The first failure wins and is reported with the asset's name.

use crate::error::{RippleError, RippleResult};
use rustc_hash::FxHashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

type FetchTask<T> = Box<dyn FnOnce() -> Result<T, String> + Send>;

/// Set of named fetches joined before the scene starts
pub struct AssetBarrier<T> {
    tasks: Vec<(String, FetchTask<T>)>,
    timeout: Option<Duration>,
}

impl<T: Send + 'static> AssetBarrier<T> {
    /// Empty barrier without a timeout
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            timeout: None,
        }
    }

    /// Give up if the whole set takes longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a fetch
    ///
    /// # Arguments
    ///
    /// * `name` - Key of the result, also used in error reports
    /// * `fetch` - Loads the asset, returning a human-readable reason on failure
    pub fn add<F>(&mut self, name: impl Into<String>, fetch: F)
    where
        F: FnOnce() -> Result<T, String> + Send + 'static,
    {
        self.tasks.push((name.into(), Box::new(fetch)));
    }

    /// Number of registered fetches
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every fetch and wait for all of them
    ///
    /// # Returns
    ///
    /// Loaded assets keyed by name.
    ///
    /// # Errors
    ///
    /// - `RippleError::AssetLoad` for the first fetch that fails, or whose
    ///   worker could not be started or panicked
    /// - `RippleError::AssetTimeout` naming a fetch still pending at the deadline
    pub fn join(self) -> RippleResult<FxHashMap<String, T>> {
        let total = self.tasks.len();
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let (sender, receiver) = mpsc::channel();
        let mut pending: Vec<String> = Vec::with_capacity(total);

        for (name, fetch) in self.tasks {
            let sender = sender.clone();
            let task_name = name.clone();
            thread::Builder::new()
                .name(format!("asset-{name}"))
                .spawn(move || {
                    // The receiver is gone once join has already failed
                    let _ = sender.send((task_name, fetch()));
                })
                .map_err(|e| RippleError::AssetLoad {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            pending.push(name);
        }
        drop(sender);

        let mut loaded = FxHashMap::default();
        while !pending.is_empty() {
            let received = match deadline {
                Some(deadline) => {
                    receiver.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok((name, Ok(asset))) => {
                    debug!("Loaded asset '{}'", name);
                    pending.retain(|p| *p != name);
                    loaded.insert(name, asset);
                }
                Ok((name, Err(reason))) => return Err(RippleError::AssetLoad { name, reason }),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(RippleError::AssetTimeout {
                        name: pending.swap_remove(0),
                        timeout: self.timeout.unwrap_or_default(),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RippleError::AssetLoad {
                        name: pending.swap_remove(0),
                        reason: "fetch task panicked".to_string(),
                    });
                }
            }
        }

        info!("All {} assets loaded", total);
        Ok(loaded)
    }
}

impl<T: Send + 'static> Default for AssetBarrier<T> {
    fn default() -> Self {
        Self::new()
    }
}
