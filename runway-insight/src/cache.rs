//! Time-boxed response cache in front of a completion service.
//!
//! Keyed by the full prompt text. Only successful completions are stored.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::prompts::InsightRequest;
use crate::service::{CompletionError, CompletionService};

/// Six hours
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 6);

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    expires_at: Instant,
}

pub struct CachedCompletion<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl<S: CompletionService> CachedCompletion<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop every cached response
    pub fn invalidate(&self) {
        self.entries().clear();
    }

    /// Drop the cached response for one request
    pub fn invalidate_request(&self, request: &InsightRequest) {
        self.entries().remove(&request.prompt());
    }

    /// Live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries().values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: CompletionService> CompletionService for CachedCompletion<S> {
    fn complete(&self, request: &InsightRequest) -> Result<String, CompletionError> {
        let key = request.prompt();
        let now = Instant::now();

        if let Some(hit) = self.entries().get(&key) {
            if hit.expires_at > now {
                debug!("completion cache hit");
                return Ok(hit.text.clone());
            }
        }

        // Lock is not held across the call; a concurrent miss just calls twice.
        let text = self.inner.complete(request)?;
        self.entries().insert(
            key,
            Entry {
                text: text.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(text)
    }
}
